// src/config/mod.rs
pub mod app;

pub use app::{AppConfig, ProviderKind, RunConfig, SentimentConfig, WireConfig};
