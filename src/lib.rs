//! Gator - A command-line RSS aggregator
//!
//! Users register, follow feeds, and browse the posts that a periodic
//! scraper collects into a SQLite database.

pub mod commands;
pub mod config;
pub mod db;
pub mod error;
pub mod fetcher;
pub mod handlers;
pub mod scraper;
