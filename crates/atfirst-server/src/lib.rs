//! at first server
//!
//! Resolves an actor to its repository, pulls the oldest records of a
//! collection and serves them as a single server-rendered page. Rendering
//! itself lives in `atfirst-renderer`; this crate owns the network, the cache
//! and the HTTP surface.

pub mod cache;
pub mod client;
pub mod collections;
pub mod config;
pub mod error;
pub mod handlers;
pub mod page;
pub mod server;
pub mod telemetry;

pub use client::{AtClient, Identity};
pub use config::Config;
pub use error::{FeedError, ServerError};
pub use server::{AppState, router, run};
