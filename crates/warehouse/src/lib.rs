pub mod auth;
pub mod client;
pub mod query;
pub mod source;

pub use client::BigQueryClient;
pub use source::{LogSource, fetch_recent_logs};
