//! # Sentinel Configuration
//!
//! Centralized configuration management and defaults for all Sentinel services.
//!
//! ## Features
//!
//! - **Defaults**: one constants module per service ([`service`])
//! - **Loading**: TOML base file, `environments/<env>.toml` overlay, `SENTINEL__` env overrides
//! - **Validation**: [`AppConfig::validate`] rejects configurations the pipeline cannot run
//!
//! ## Usage
//!
//! ```rust,no_run
//! use sentinel_config::AppConfig;
//!
//! let config = AppConfig::load(None, Some("production")).unwrap();
//! let interval = config.monitoring.interval();
//! ```

pub mod error;
pub mod service;
pub mod service_config;

pub use error::ConfigError;
pub use service_config::{
    load_config, validate_symbol, AlertConfig, AppConfig, CooldownConfig, CostConfig,
    EmailApiConfig, ExchangeConfig, LoggingConfig, MonitoringConfig, NotificationConfig,
    RiskConfig, RuntimeEnvironment, SignalConfig, SnapshotConfig,
};
