pub mod config;
pub mod error;
pub mod model;
pub mod severity;
pub mod time;

pub use error::{DashError, Result};
