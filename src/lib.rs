pub mod config;
pub mod domain;
pub mod error;
pub mod health;
pub mod messaging;
pub mod metrics;
pub mod services;
pub mod store;
pub mod utils;
