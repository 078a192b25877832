//! Blog Service Library
//!
//! Aggregation and consistency layer for the blogging platform: posts and
//! comments joined with identities from an external directory, toggle-based
//! save and follow membership, clap counters, and a sliding-window limiter
//! on post creation.
//!
//! # Modules
//!
//! - `identity`: directory capability and identity projection
//! - `repository`: durable store traits with Postgres and in-process implementations
//! - `rate_limit`: sliding-window limiter and its counter stores
//! - `services`: content store, engagement and social graph ledgers, aggregation facade
//! - `state`: component wiring

pub mod config;
pub mod domain;
pub mod error;
pub mod identity;
pub mod rate_limit;
pub mod repository;
pub mod services;
pub mod state;

pub use config::Config;
pub use error::{ErrorKind, ServiceError, ServiceResult};
pub use state::{AppState, Stores};
