pub mod api;
pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod notify;
pub mod permissions;
pub mod session;
pub mod store;
pub mod types;
pub mod validation;
pub mod workflow;

pub use client::{ApiResponse, ResourceClient, RetryPolicy};
pub use error::ClientError;
pub use store::StateStore;
