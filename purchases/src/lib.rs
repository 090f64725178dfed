pub mod classify;
pub mod config;
pub mod consumer;
pub mod error;
pub mod store;
pub mod types;
