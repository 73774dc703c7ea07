//! Command registry and the login gate.

use std::collections::HashMap;

use futures::future::BoxFuture;

use crate::config::Config;
use crate::db::{Database, User};
use crate::error::{Error, Result};
use crate::fetcher::Fetcher;

/// Everything a handler may touch during one invocation.
pub struct State {
    pub config: Config,
    pub db: Database,
    pub fetcher: Fetcher,
}

impl State {
    pub fn new(config: Config, db: Database, fetcher: Fetcher) -> Self {
        Self {
            config,
            db,
            fetcher,
        }
    }
}

/// A command name with its raw arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    pub name: String,
    pub args: Vec<String>,
}

impl Command {
    pub fn new(name: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            name: name.into(),
            args,
        }
    }

    /// Fail with a usage message unless exactly `count` arguments were given.
    pub fn expect_args(&self, count: usize, usage: &str) -> Result<()> {
        if self.args.len() != count {
            return Err(self.usage_error(usage));
        }
        Ok(())
    }

    pub fn usage_error(&self, usage: &str) -> Error {
        let usage = format!("usage: {} {}", self.name, usage);
        Error::Usage(usage.trim_end().to_string())
    }
}

/// A handler that does not need a logged in user.
pub type HandlerFn = for<'a> fn(&'a mut State, Command) -> BoxFuture<'a, Result<()>>;

/// A handler that runs on behalf of the current user.
pub type AuthedHandlerFn = for<'a> fn(&'a mut State, Command, User) -> BoxFuture<'a, Result<()>>;

pub type Handler =
    Box<dyn for<'a> Fn(&'a mut State, Command) -> BoxFuture<'a, Result<()>> + Send + Sync>;

fn boxed<F>(f: F) -> Handler
where
    F: for<'a> Fn(&'a mut State, Command) -> BoxFuture<'a, Result<()>> + Send + Sync + 'static,
{
    Box::new(f)
}

#[derive(Default)]
pub struct Commands {
    handlers: HashMap<String, Handler>,
}

impl Commands {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` under `name`, replacing any previous one.
    pub fn register(&mut self, name: &str, handler: Handler) {
        self.handlers.insert(name.to_string(), handler);
    }

    pub fn register_fn(&mut self, name: &str, handler: HandlerFn) {
        self.register(name, boxed(handler));
    }

    /// Register `handler` behind [`logged_in`].
    pub fn register_authed(&mut self, name: &str, handler: AuthedHandlerFn) {
        self.register(name, logged_in(handler));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    /// Registered command names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub async fn run(&self, state: &mut State, cmd: Command) -> Result<()> {
        let handler = self
            .handlers
            .get(&cmd.name)
            .ok_or_else(|| Error::CommandNotFound(cmd.name.clone()))?;
        handler(state, cmd).await
    }
}

/// Resolve the configured current user.
pub async fn current_user(state: &State) -> Result<User> {
    let name = state.config.current_user().ok_or(Error::NotLoggedIn)?;
    state
        .db
        .get_user(name)
        .await?
        .ok_or_else(|| Error::NotFound(format!("user {}", name)))
}

/// Wrap `handler` so it only runs with a resolved current user.
pub fn logged_in(handler: AuthedHandlerFn) -> Handler {
    boxed(move |state, cmd| {
        Box::pin(async move {
            let user = current_user(state).await?;
            handler(state, cmd, user).await
        })
    })
}
