//! SMS validation bridge — ingestion, a batched validation pipeline, and
//! per-mobile onboarding hash issuance. See `main.rs` for the process
//! entrypoint; this crate root exists so integration tests can drive the
//! pipeline and stores directly against a real Postgres + Redis.

pub mod cache;
pub mod checks;
pub mod config;
pub mod counters;
pub mod db;
pub mod error;
pub mod http;
pub mod models;
pub mod normalize;
pub mod onboarding;
pub mod outbound;
pub mod pipeline;
pub mod settings;

pub use error::AppError;
