//! Answers one question about KBO baseball: for a given team, how long do its
//! games against today's opponent(s) typically run?
//!
//! The pipeline resolves today's fixtures for a team, walks a historical date
//! window for matching fixtures, retrieves each game's recorded duration from
//! koreabaseball.com (fast HTTP path first, headless-browser fallback when the
//! page needs script rendering), and averages the result. Two file-backed
//! caches make repeated runs cheap. All fetching is strictly sequential.

pub use classify::{classify, Pace};
pub use client::KboClient;
pub use config::Config;
pub use error::{KboError, Result};
pub use fetch::FetchOutcome;
pub use model::{CacheStatus, Fixture, HistoryResult, TodayMatch};
pub use teams::{resolve, resolve_team, Team};

pub mod browser;
pub mod cache;
pub mod classify;
pub mod client;
pub mod config;
pub mod error;
pub mod fetch;
pub mod history;
pub mod model;
pub(crate) mod scraper;
pub mod teams;
