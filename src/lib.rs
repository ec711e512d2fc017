pub mod api;
pub mod app;
pub mod broadcast;
pub mod cache;
pub mod config;
pub mod error;
pub mod observability;
pub mod service;
pub mod types;
pub mod upstream;
pub mod utils;

/// Environment used to pick `config/<env>.toml` when `APP_ENV` is unset.
pub const DEFAULT_APP_ENV: &str = "development";
