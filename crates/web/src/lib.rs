pub mod client;
pub mod gateway;
pub mod page;
pub mod render;
pub mod server;
pub mod view;

pub use client::GatewayClient;
pub use server::{AppState, router, run_server};
