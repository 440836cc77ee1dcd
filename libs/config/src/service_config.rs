//! Application Configuration Module
//!
//! Loads the Sentinel configuration from a TOML file with an optional
//! environment overlay and `SENTINEL__`-prefixed environment variable overrides.
//! Every section has defaults, so an absent file still yields a runnable config.

use crate::error::ConfigError;
use crate::service as defaults;
use anyhow::{Context, Result};
use config_crate::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Default location of the base configuration file
pub const DEFAULT_CONFIG_PATH: &str = "config/sentinel.toml";

/// Deployment environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeEnvironment {
    #[default]
    Development,
    Staging,
    Production,
}

impl FromStr for RuntimeEnvironment {
    type Err = ConfigError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Self::Development),
            "staging" => Ok(Self::Staging),
            "production" | "prod" => Ok(Self::Production),
            other => Err(ConfigError::Invalid {
                field: "environment",
                reason: format!("unknown environment {other:?}"),
            }),
        }
    }
}

impl fmt::Display for RuntimeEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Development => "development",
            Self::Staging => "staging",
            Self::Production => "production",
        };
        f.write_str(name)
    }
}

/// Main application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub environment: RuntimeEnvironment,
    pub monitoring: MonitoringConfig,
    pub exchange: ExchangeConfig,
    pub signals: SignalConfig,
    pub risk: RiskConfig,
    pub alerts: AlertConfig,
    pub cooldown: CooldownConfig,
    pub snapshots: SnapshotConfig,
    pub notifications: NotificationConfig,
    pub logging: LoggingConfig,
}

/// Cycle cadence and instrument list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitoringConfig {
    pub instruments: Vec<String>,
    pub interval_secs: u64,
    pub batch_size: usize,
    pub batch_delay_ms: u64,
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            instruments: defaults::monitoring::DEFAULT_INSTRUMENTS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            interval_secs: defaults::monitoring::INTERVAL_SECS,
            batch_size: defaults::monitoring::BATCH_SIZE,
            batch_delay_ms: defaults::monitoring::BATCH_DELAY_MS,
        }
    }
}

impl MonitoringConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn batch_delay(&self) -> Duration {
        Duration::from_millis(self.batch_delay_ms)
    }
}

/// Exchange REST client settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExchangeConfig {
    pub base_url: String,
    pub request_timeout_ms: u64,
    pub min_request_spacing_ms: u64,
    pub default_retry_after_ms: u64,
    pub max_retry_after_ms: u64,
    pub candle_interval: String,
    pub candle_limit: u32,
    pub depth_limit: u32,
    /// Serve synthetic snapshots when the exchange is unreachable.
    /// Unset means "on outside production".
    pub mock_fallback: Option<bool>,
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::exchange::BASE_URL.to_string(),
            request_timeout_ms: defaults::exchange::REQUEST_TIMEOUT_MS,
            min_request_spacing_ms: defaults::exchange::MIN_REQUEST_SPACING_MS,
            default_retry_after_ms: defaults::exchange::DEFAULT_RETRY_AFTER_MS,
            max_retry_after_ms: defaults::exchange::MAX_RETRY_AFTER_MS,
            candle_interval: defaults::exchange::CANDLE_INTERVAL.to_string(),
            candle_limit: defaults::exchange::CANDLE_LIMIT,
            depth_limit: defaults::exchange::DEPTH_LIMIT,
            mock_fallback: None,
        }
    }
}

impl ExchangeConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn min_request_spacing(&self) -> Duration {
        Duration::from_millis(self.min_request_spacing_ms)
    }

    pub fn default_retry_after(&self) -> Duration {
        Duration::from_millis(self.default_retry_after_ms)
    }

    pub fn max_retry_after(&self) -> Duration {
        Duration::from_millis(self.max_retry_after_ms)
    }
}

/// Fee and slippage estimates, as fractions of notional
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CostConfig {
    pub maker_fee: f64,
    pub taker_fee: f64,
    pub slippage: f64,
}

impl Default for CostConfig {
    fn default() -> Self {
        Self {
            maker_fee: defaults::signals::MAKER_FEE,
            taker_fee: defaults::signals::TAKER_FEE,
            slippage: defaults::signals::SLIPPAGE,
        }
    }
}

/// Signal generator parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalConfig {
    pub min_candles: usize,
    pub atr_period: usize,
    pub ema_fast_period: usize,
    pub ema_slow_period: usize,
    pub volume_window: usize,
    pub volume_zscore_threshold: f64,
    pub range_window: usize,
    pub pullback_low: f64,
    pub pullback_high: f64,
    pub trend_min_spread: f64,
    pub atr_stop_multiplier: f64,
    pub min_stop_pct: f64,
    pub floor_stop_pct: f64,
    pub min_net_risk_reward: f64,
    pub costs: CostConfig,
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            min_candles: defaults::signals::MIN_CANDLES,
            atr_period: defaults::signals::ATR_PERIOD,
            ema_fast_period: defaults::signals::EMA_FAST_PERIOD,
            ema_slow_period: defaults::signals::EMA_SLOW_PERIOD,
            volume_window: defaults::signals::VOLUME_WINDOW,
            volume_zscore_threshold: defaults::signals::VOLUME_ZSCORE_THRESHOLD,
            range_window: defaults::signals::RANGE_WINDOW,
            pullback_low: defaults::signals::PULLBACK_LOW,
            pullback_high: defaults::signals::PULLBACK_HIGH,
            trend_min_spread: defaults::signals::TREND_MIN_SPREAD,
            atr_stop_multiplier: defaults::signals::ATR_STOP_MULTIPLIER,
            min_stop_pct: defaults::signals::MIN_STOP_PCT,
            floor_stop_pct: defaults::signals::FLOOR_STOP_PCT,
            min_net_risk_reward: defaults::signals::MIN_NET_RISK_REWARD,
            costs: CostConfig::default(),
        }
    }
}

/// Risk filter thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskConfig {
    pub min_risk_reward: f64,
    pub max_volatility_pct: f64,
    pub min_liquidity_usd: f64,
    pub min_market_condition: f64,
    /// Hold all notifications for a cycle when any instrument looks abnormal
    pub abnormal_market_gate: bool,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            min_risk_reward: defaults::risk::MIN_RISK_REWARD,
            max_volatility_pct: defaults::risk::MAX_VOLATILITY_PCT,
            min_liquidity_usd: defaults::risk::MIN_LIQUIDITY_USD,
            min_market_condition: defaults::risk::MIN_MARKET_CONDITION,
            abnormal_market_gate: true,
        }
    }
}

/// Alert classifier bands
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertConfig {
    pub fired_distance: f64,
    pub ready_atr_multiple: f64,
    pub watch_distance: f64,
    pub bar_interval_secs: u64,
    pub merge_distance: f64,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            fired_distance: defaults::alerts::FIRED_DISTANCE,
            ready_atr_multiple: defaults::alerts::READY_ATR_MULTIPLE,
            watch_distance: defaults::alerts::WATCH_DISTANCE,
            bar_interval_secs: defaults::alerts::BAR_INTERVAL_SECS,
            merge_distance: defaults::alerts::MERGE_DISTANCE,
        }
    }
}

impl AlertConfig {
    pub fn bar_interval(&self) -> Duration {
        Duration::from_secs(self.bar_interval_secs)
    }
}

/// Deduplication cooler settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CooldownConfig {
    pub window_secs: u64,
    pub sweep_interval_secs: u64,
    pub fired_threshold: f64,
    pub ready_threshold: f64,
    pub watch_threshold: f64,
    /// Thresholds ratchet every `adjust_every` notifications...
    pub adjust_every: u64,
    /// ...once more than `adjust_after` have been sent
    pub adjust_after: u64,
    pub adjust_factor: f64,
    pub max_threshold: f64,
}

impl Default for CooldownConfig {
    fn default() -> Self {
        Self {
            window_secs: defaults::cooldown::WINDOW_SECS,
            sweep_interval_secs: defaults::cooldown::SWEEP_INTERVAL_SECS,
            fired_threshold: defaults::cooldown::FIRED_THRESHOLD,
            ready_threshold: defaults::cooldown::READY_THRESHOLD,
            watch_threshold: defaults::cooldown::WATCH_THRESHOLD,
            adjust_every: defaults::cooldown::ADJUST_EVERY,
            adjust_after: defaults::cooldown::ADJUST_AFTER,
            adjust_factor: defaults::cooldown::ADJUST_FACTOR,
            max_threshold: defaults::cooldown::MAX_THRESHOLD,
        }
    }
}

impl CooldownConfig {
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

/// Snapshot store location and retention
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapshotConfig {
    pub dir: PathBuf,
    pub max_count: usize,
    pub max_age_secs: u64,
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(defaults::snapshots::DIR),
            max_count: defaults::snapshots::MAX_COUNT,
            max_age_secs: defaults::snapshots::MAX_AGE_SECS,
        }
    }
}

impl SnapshotConfig {
    pub fn max_age(&self) -> Duration {
        Duration::from_secs(self.max_age_secs)
    }
}

/// Transactional email API credentials
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailApiConfig {
    pub endpoint: String,
    pub api_key: String,
}

/// Notification delivery settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    pub enabled: bool,
    pub recipients: Vec<String>,
    pub from_address: String,
    pub inter_message_delay_ms: u64,
    /// Prefix for snapshot links in email bodies, e.g. `https://host/snapshots`
    pub snapshot_base_url: Option<String>,
    /// Without this, emails are only logged
    pub email_api: Option<EmailApiConfig>,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            recipients: Vec::new(),
            from_address: defaults::notifications::FROM_ADDRESS.to_string(),
            inter_message_delay_ms: defaults::notifications::INTER_MESSAGE_DELAY_MS,
            snapshot_base_url: None,
            email_api: None,
        }
    }
}

impl NotificationConfig {
    pub fn inter_message_delay(&self) -> Duration {
        Duration::from_millis(self.inter_message_delay_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive; `RUST_LOG` wins when set
    pub level: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from files with environment overrides
    ///
    /// The base file is required only when a path is given explicitly. The overlay
    /// `environments/<env>.toml` is resolved next to the base file.
    pub fn load(base_path: Option<&Path>, environment: Option<&str>) -> Result<Self> {
        let base = base_path.unwrap_or(Path::new(DEFAULT_CONFIG_PATH));

        let mut builder =
            Config::builder().add_source(File::from(base).required(base_path.is_some()));

        if let Some(env) = environment {
            let env_file = base
                .parent()
                .unwrap_or(Path::new("."))
                .join("environments")
                .join(format!("{env}.toml"));

            if env_file.exists() {
                info!("Loading environment config: {:?}", env_file);
                builder = builder.add_source(File::from(env_file));
            } else {
                warn!("Environment config not found: {:?}", env_file);
            }
        }

        // SENTINEL__MONITORING__INTERVAL_SECS=60 style overrides
        builder = builder.add_source(
            Environment::with_prefix("SENTINEL")
                .prefix_separator("__")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("monitoring.instruments")
                .with_list_parse_key("notifications.recipients")
                .try_parsing(true),
        );

        let config = builder.build().context("Failed to build configuration")?;

        let mut app: AppConfig = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        if let Some(env) = environment {
            app.environment = env.parse()?;
        }

        app.expand_env_vars()?;
        app.normalize();
        app.validate()?;

        debug!(
            environment = %app.environment,
            instruments = app.monitoring.instruments.len(),
            "Configuration loaded"
        );
        Ok(app)
    }

    /// Expand `$VAR` and `~` in filesystem paths
    pub fn expand_env_vars(&mut self) -> Result<()> {
        let raw = self.snapshots.dir.to_string_lossy().into_owned();
        let expanded =
            shellexpand::full(&raw).context("Failed to expand snapshot directory")?;
        self.snapshots.dir = PathBuf::from(expanded.as_ref());
        Ok(())
    }

    /// Upper-case symbols and drop duplicates, keeping first occurrence
    pub fn normalize(&mut self) {
        let mut seen = std::collections::HashSet::new();
        self.monitoring.instruments = self
            .monitoring
            .instruments
            .iter()
            .map(|s| s.trim().to_ascii_uppercase())
            .filter(|s| seen.insert(s.clone()))
            .collect();
    }

    /// Whether the fetcher may serve synthetic data when the exchange is down
    pub fn mock_fallback_allowed(&self) -> bool {
        self.exchange
            .mock_fallback
            .unwrap_or(self.environment != RuntimeEnvironment::Production)
    }

    /// Reject configurations the pipeline cannot run with
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.monitoring.instruments.is_empty() {
            return Err(ConfigError::EmptyInstruments);
        }
        for symbol in &self.monitoring.instruments {
            validate_symbol(symbol)?;
        }
        if self.monitoring.interval_secs == 0 {
            return Err(ConfigError::NotPositive {
                field: "monitoring.interval_secs",
            });
        }
        if self.monitoring.batch_size == 0 {
            return Err(ConfigError::NotPositive {
                field: "monitoring.batch_size",
            });
        }

        self.check_finite()?;

        if self.risk.min_risk_reward < 1.0 {
            return Err(ConfigError::RiskRewardTooLow {
                value: self.risk.min_risk_reward,
            });
        }
        if self.signals.min_net_risk_reward < 1.0 {
            return Err(ConfigError::RiskRewardTooLow {
                value: self.signals.min_net_risk_reward,
            });
        }
        if self.risk.max_volatility_pct <= 0.0 {
            return Err(ConfigError::NotPositive {
                field: "risk.max_volatility_pct",
            });
        }
        if self.risk.min_liquidity_usd < 0.0 {
            return Err(ConfigError::Negative {
                field: "risk.min_liquidity_usd",
                value: self.risk.min_liquidity_usd,
            });
        }
        check_range("risk.min_market_condition", self.risk.min_market_condition, 0.0, 1.0)?;

        let costs = &self.signals.costs;
        for (field, value) in [
            ("signals.costs.maker_fee", costs.maker_fee),
            ("signals.costs.taker_fee", costs.taker_fee),
            ("signals.costs.slippage", costs.slippage),
        ] {
            if value < 0.0 || !value.is_finite() {
                return Err(ConfigError::Negative { field, value });
            }
        }

        let signals = &self.signals;
        for (field, value) in [
            ("signals.min_candles", signals.min_candles),
            ("signals.atr_period", signals.atr_period),
            ("signals.ema_fast_period", signals.ema_fast_period),
            ("signals.ema_slow_period", signals.ema_slow_period),
            ("signals.volume_window", signals.volume_window),
            ("signals.range_window", signals.range_window),
        ] {
            if value == 0 {
                return Err(ConfigError::NotPositive { field });
            }
        }
        if signals.ema_fast_period >= signals.ema_slow_period {
            return Err(ConfigError::Invalid {
                field: "signals.ema_fast_period",
                reason: "fast EMA period must be shorter than slow".to_string(),
            });
        }
        check_range("signals.pullback_low", signals.pullback_low, 0.0, 1.0)?;
        check_range("signals.pullback_high", signals.pullback_high, 0.0, 1.0)?;
        if signals.pullback_low >= signals.pullback_high {
            return Err(ConfigError::Invalid {
                field: "signals.pullback_low",
                reason: "pullback band is empty".to_string(),
            });
        }

        if self.alerts.fired_distance <= 0.0 {
            return Err(ConfigError::NotPositive {
                field: "alerts.fired_distance",
            });
        }
        if self.alerts.bar_interval_secs == 0 {
            return Err(ConfigError::NotPositive {
                field: "alerts.bar_interval_secs",
            });
        }

        if self.cooldown.window_secs == 0 {
            return Err(ConfigError::NotPositive {
                field: "cooldown.window_secs",
            });
        }
        if self.cooldown.sweep_interval_secs == 0 {
            return Err(ConfigError::NotPositive {
                field: "cooldown.sweep_interval_secs",
            });
        }
        if self.cooldown.adjust_every == 0 {
            return Err(ConfigError::NotPositive {
                field: "cooldown.adjust_every",
            });
        }
        if self.cooldown.adjust_factor < 1.0 {
            return Err(ConfigError::Invalid {
                field: "cooldown.adjust_factor",
                reason: "thresholds may only be raised".to_string(),
            });
        }

        if self.snapshots.max_count == 0 {
            return Err(ConfigError::NotPositive {
                field: "snapshots.max_count",
            });
        }
        if self.snapshots.max_age_secs == 0 {
            return Err(ConfigError::NotPositive {
                field: "snapshots.max_age_secs",
            });
        }

        if let Some(api) = &self.notifications.email_api {
            if url::Url::parse(&api.endpoint).is_err() {
                return Err(ConfigError::Invalid {
                    field: "notifications.email_api.endpoint",
                    reason: format!("not a URL: {}", api.endpoint),
                });
            }
        }
        if url::Url::parse(&self.exchange.base_url).is_err() {
            return Err(ConfigError::Invalid {
                field: "exchange.base_url",
                reason: format!("not a URL: {}", self.exchange.base_url),
            });
        }

        Ok(())
    }
}

impl AppConfig {
    /// NaN and infinities slip through ordered comparisons, so every float threshold
    /// is checked up front
    fn check_finite(&self) -> std::result::Result<(), ConfigError> {
        let (signals, risk, alerts, cooldown) =
            (&self.signals, &self.risk, &self.alerts, &self.cooldown);
        let thresholds = [
            ("signals.volume_zscore_threshold", signals.volume_zscore_threshold),
            ("signals.pullback_low", signals.pullback_low),
            ("signals.pullback_high", signals.pullback_high),
            ("signals.trend_min_spread", signals.trend_min_spread),
            ("signals.atr_stop_multiplier", signals.atr_stop_multiplier),
            ("signals.min_stop_pct", signals.min_stop_pct),
            ("signals.floor_stop_pct", signals.floor_stop_pct),
            ("signals.min_net_risk_reward", signals.min_net_risk_reward),
            ("signals.costs.maker_fee", signals.costs.maker_fee),
            ("signals.costs.taker_fee", signals.costs.taker_fee),
            ("signals.costs.slippage", signals.costs.slippage),
            ("risk.min_risk_reward", risk.min_risk_reward),
            ("risk.max_volatility_pct", risk.max_volatility_pct),
            ("risk.min_liquidity_usd", risk.min_liquidity_usd),
            ("risk.min_market_condition", risk.min_market_condition),
            ("alerts.fired_distance", alerts.fired_distance),
            ("alerts.ready_atr_multiple", alerts.ready_atr_multiple),
            ("alerts.watch_distance", alerts.watch_distance),
            ("alerts.merge_distance", alerts.merge_distance),
            ("cooldown.fired_threshold", cooldown.fired_threshold),
            ("cooldown.ready_threshold", cooldown.ready_threshold),
            ("cooldown.watch_threshold", cooldown.watch_threshold),
            ("cooldown.adjust_factor", cooldown.adjust_factor),
            ("cooldown.max_threshold", cooldown.max_threshold),
        ];

        match thresholds.into_iter().find(|(_, value)| !value.is_finite()) {
            Some((field, _)) => Err(ConfigError::NotFinite { field }),
            None => Ok(()),
        }
    }
}

/// Exchange symbol format: 1-20 chars of `A-Z0-9`
pub fn validate_symbol(symbol: &str) -> std::result::Result<(), ConfigError> {
    let valid = !symbol.is_empty()
        && symbol.len() <= 20
        && symbol.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit());
    if valid {
        Ok(())
    } else {
        Err(ConfigError::InvalidInstrument(symbol.to_string()))
    }
}

fn check_range(
    field: &'static str,
    value: f64,
    min: f64,
    max: f64,
) -> std::result::Result<(), ConfigError> {
    if value.is_finite() && value >= min && value <= max {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            field,
            value,
            min,
            max,
        })
    }
}

/// Convenience function to load configuration from the default location
pub fn load_config(environment: Option<&str>) -> Result<AppConfig> {
    AppConfig::load(None, environment)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_defaults_are_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.monitoring.interval(), Duration::from_secs(30));
        assert_eq!(config.monitoring.batch_size, 5);
        assert_eq!(config.cooldown.window(), Duration::from_secs(1800));
        assert!(config.risk.abnormal_market_gate);
        assert!(config.mock_fallback_allowed());
    }

    #[test]
    fn test_load_base_config() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("sentinel.toml");

        let config_content = r#"
[monitoring]
instruments = ["btcusdt", "ETHUSDT", "BTCUSDT"]
interval_secs = 60

[risk]
min_liquidity_usd = 5000000.0

[snapshots]
dir = "/tmp/sentinel-test"
max_count = 10

[logging]
level = "debug"
"#;

        fs::write(&config_path, config_content).unwrap();

        let config = AppConfig::load(Some(&config_path), None).unwrap();
        assert_eq!(config.monitoring.instruments, vec!["BTCUSDT", "ETHUSDT"]);
        assert_eq!(config.monitoring.interval_secs, 60);
        assert_eq!(config.monitoring.batch_size, 5);
        assert_eq!(config.risk.min_liquidity_usd, 5_000_000.0);
        assert_eq!(config.risk.min_risk_reward, 1.5);
        assert_eq!(config.snapshots.max_count, 10);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_environment_overlay() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("sentinel.toml");
        fs::write(&config_path, "[monitoring]\ninterval_secs = 60\n").unwrap();

        let env_dir = dir.path().join("environments");
        fs::create_dir(&env_dir).unwrap();
        fs::write(
            env_dir.join("production.toml"),
            "[monitoring]\ninterval_secs = 15\n",
        )
        .unwrap();

        let config = AppConfig::load(Some(&config_path), Some("production")).unwrap();
        assert_eq!(config.monitoring.interval_secs, 15);
        assert_eq!(config.environment, RuntimeEnvironment::Production);
        assert!(!config.mock_fallback_allowed());
    }

    #[test]
    fn test_explicit_mock_fallback_wins_in_production() {
        let mut config = AppConfig {
            environment: RuntimeEnvironment::Production,
            ..Default::default()
        };
        config.exchange.mock_fallback = Some(true);
        assert!(config.mock_fallback_allowed());
    }

    #[test]
    fn test_missing_explicit_file_fails() {
        let dir = tempdir().unwrap();
        let result = AppConfig::load(Some(&dir.path().join("absent.toml")), None);
        assert!(result.is_err());
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut config = AppConfig::default();
        config.monitoring.instruments.clear();
        assert_eq!(config.validate(), Err(ConfigError::EmptyInstruments));

        let mut config = AppConfig::default();
        config.monitoring.interval_secs = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NotPositive { field: "monitoring.interval_secs" })
        ));

        let mut config = AppConfig::default();
        config.risk.min_risk_reward = 0.8;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::RiskRewardTooLow { .. })
        ));

        let mut config = AppConfig::default();
        config.signals.costs.taker_fee = -0.001;
        assert!(matches!(config.validate(), Err(ConfigError::Negative { .. })));

        let mut config = AppConfig::default();
        config.snapshots.max_count = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.monitoring.instruments = vec!["BTC-USDT".to_string()];
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidInstrument(_))
        ));
    }

    #[test]
    fn test_non_finite_thresholds_rejected() {
        let mut config = AppConfig::default();
        config.signals.min_net_risk_reward = f64::NAN;
        assert_eq!(
            config.validate(),
            Err(ConfigError::NotFinite {
                field: "signals.min_net_risk_reward"
            })
        );

        let mut config = AppConfig::default();
        config.risk.max_volatility_pct = f64::NAN;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NotFinite { field: "risk.max_volatility_pct" })
        ));

        let mut config = AppConfig::default();
        config.cooldown.adjust_factor = f64::INFINITY;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NotFinite { field: "cooldown.adjust_factor" })
        ));
    }

    #[test]
    fn test_load_rejects_nan_minimum() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("sentinel.toml");
        fs::write(&config_path, "[signals]\nmin_net_risk_reward = nan\n").unwrap();

        assert!(AppConfig::load(Some(&config_path), None).is_err());
    }

    #[test]
    fn test_parse_environment() {
        assert_eq!(
            "PROD".parse::<RuntimeEnvironment>().unwrap(),
            RuntimeEnvironment::Production
        );
        assert!("qa".parse::<RuntimeEnvironment>().is_err());
    }
}
