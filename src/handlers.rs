//! One handler per CLI verb.

use futures::future::BoxFuture;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::commands::{Command, Commands, State};
use crate::db::{Post, User};
use crate::error::{Error, Result};
use crate::scraper::{parse_interval, Scraper};

/// Posts shown by `browse` when no limit is given.
pub const DEFAULT_BROWSE_LIMIT: i64 = 2;

/// The registry the binary runs with.
pub fn default_commands() -> Commands {
    let mut commands = Commands::new();
    commands.register_fn("login", login);
    commands.register_fn("register", register);
    commands.register_fn("reset", reset);
    commands.register_fn("users", users);
    commands.register_fn("agg", agg);
    commands.register_authed("addfeed", add_feed);
    commands.register_fn("feeds", feeds);
    commands.register_authed("follow", follow);
    commands.register_authed("following", following);
    commands.register_authed("unfollow", unfollow);
    commands.register_authed("browse", browse);
    commands
}

pub fn login(state: &mut State, cmd: Command) -> BoxFuture<'_, Result<()>> {
    Box::pin(async move {
        cmd.expect_args(1, "<name>")?;
        let name = &cmd.args[0];

        let user = state
            .db
            .get_user(name)
            .await?
            .ok_or_else(|| Error::NotFound(format!("user {}", name)))?;

        state.config.set_user(&user.name)?;
        println!("Logged in as {}", user.name);
        Ok(())
    })
}

pub fn register(state: &mut State, cmd: Command) -> BoxFuture<'_, Result<()>> {
    Box::pin(async move {
        cmd.expect_args(1, "<name>")?;

        let user = state.db.create_user(&cmd.args[0]).await?;
        state.config.set_user(&user.name)?;

        info!("Created user {} ({})", user.name, user.id);
        println!("User {} registered", user.name);
        Ok(())
    })
}

pub fn reset(state: &mut State, cmd: Command) -> BoxFuture<'_, Result<()>> {
    Box::pin(async move {
        cmd.expect_args(0, "")?;

        let removed = state.db.reset().await?;
        println!("Reset: removed {} users", removed);
        Ok(())
    })
}

pub fn users(state: &mut State, cmd: Command) -> BoxFuture<'_, Result<()>> {
    Box::pin(async move {
        cmd.expect_args(0, "")?;

        for line in user_lines(state).await? {
            println!("{}", line);
        }
        Ok(())
    })
}

/// One `* name` line per user, with the logged in one marked `(current)`.
pub async fn user_lines(state: &State) -> Result<Vec<String>> {
    let current = state.config.current_user();
    let users = state.db.get_users().await?;

    Ok(users
        .into_iter()
        .map(|user| {
            if Some(user.name.as_str()) == current {
                format!("* {} (current)", user.name)
            } else {
                format!("* {}", user.name)
            }
        })
        .collect())
}

/// Collect feeds until interrupted with Ctrl-C.
pub fn agg(state: &mut State, cmd: Command) -> BoxFuture<'_, Result<()>> {
    Box::pin(async move {
        cmd.expect_args(1, "<interval>")?;
        let interval = parse_interval(&cmd.args[0])?;

        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for ctrl-c: {}", e);
                return;
            }
            trigger.cancel();
        });

        println!(
            "Collecting feeds every {}",
            humantime::format_duration(interval)
        );
        Scraper::new(&state.db, &state.fetcher)
            .run(interval, cancel)
            .await;
        Ok(())
    })
}

pub fn add_feed(state: &mut State, cmd: Command, user: User) -> BoxFuture<'_, Result<()>> {
    Box::pin(async move {
        cmd.expect_args(2, "<name> <url>")?;
        let (name, url) = (&cmd.args[0], &cmd.args[1]);

        let feed = state.db.create_feed(name, url, &user.id).await?;
        state.db.create_feed_follow(&user.id, &feed.id).await?;

        println!("Feed added and followed:");
        println!("  Name: {}", feed.name);
        println!("  URL:  {}", feed.url);
        Ok(())
    })
}

pub fn feeds(state: &mut State, cmd: Command) -> BoxFuture<'_, Result<()>> {
    Box::pin(async move {
        cmd.expect_args(0, "")?;

        let feeds = state.db.get_feeds().await?;
        if feeds.is_empty() {
            println!("No feeds yet");
        }
        for feed in feeds {
            println!("* {} <{}> added by {}", feed.name, feed.url, feed.user_name);
        }
        Ok(())
    })
}

pub fn follow(state: &mut State, cmd: Command, user: User) -> BoxFuture<'_, Result<()>> {
    Box::pin(async move {
        cmd.expect_args(1, "<url>")?;
        let url = &cmd.args[0];

        let feed = state
            .db
            .get_feed_by_url(url)
            .await?
            .ok_or_else(|| Error::NotFound(format!("feed {}", url)))?;

        let follow = state
            .db
            .create_feed_follow(&user.id, &feed.id)
            .await
            .map_err(|e| match e {
                Error::AlreadyExists(_) => {
                    Error::AlreadyExists(format!("follow of {} by {}", url, user.name))
                }
                other => other,
            })?;

        println!("{} followed {}", follow.user_name, follow.feed_name);
        Ok(())
    })
}

pub fn following(state: &mut State, cmd: Command, user: User) -> BoxFuture<'_, Result<()>> {
    Box::pin(async move {
        cmd.expect_args(0, "")?;

        let follows = state.db.get_feed_follows_for_user(&user.id).await?;
        println!("{} is following:", user.name);
        for follow in follows {
            println!("* {}", follow.feed_name);
        }
        Ok(())
    })
}

pub fn unfollow(state: &mut State, cmd: Command, user: User) -> BoxFuture<'_, Result<()>> {
    Box::pin(async move {
        cmd.expect_args(1, "<url>")?;
        let url = &cmd.args[0];

        let feed = state
            .db
            .get_feed_by_url(url)
            .await?
            .ok_or_else(|| Error::NotFound(format!("feed {}", url)))?;

        if !state.db.delete_feed_follow(&user.id, &feed.id).await? {
            return Err(Error::NotFound(format!(
                "follow of {} by {}",
                url, user.name
            )));
        }

        println!("{} unfollowed {}", user.name, feed.name);
        Ok(())
    })
}

pub fn browse(state: &mut State, cmd: Command, user: User) -> BoxFuture<'_, Result<()>> {
    Box::pin(async move {
        let posts = browse_posts(state, &cmd, &user).await?;

        println!("Found {} posts for {}:", posts.len(), user.name);
        for post in posts {
            println!();
            println!("{}", post.title);
            if let Some(published) = &post.published_at {
                println!("  published {}", published);
            }
            println!("  {}", post.url);
            if let Some(description) = &post.description {
                println!("  {}", description);
            }
        }
        Ok(())
    })
}

/// The posts `browse` prints: newest first from the user's followed feeds.
pub async fn browse_posts(state: &State, cmd: &Command, user: &User) -> Result<Vec<Post>> {
    let limit = browse_limit(cmd)?;
    state.db.get_posts_for_user(&user.id, limit).await
}

/// `browse [limit]`
pub fn browse_limit(cmd: &Command) -> Result<i64> {
    match cmd.args.as_slice() {
        [] => Ok(DEFAULT_BROWSE_LIMIT),
        [limit] => match limit.parse::<i64>() {
            Ok(n) if n > 0 => Ok(n),
            _ => Err(Error::Usage(format!(
                "limit must be a positive integer, got {:?}",
                limit
            ))),
        },
        _ => Err(cmd.usage_error("[limit]")),
    }
}
