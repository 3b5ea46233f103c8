use std::env;
use std::time::Duration;

use chrono::FixedOffset;
use chrono_tz::Tz;
use validator::Validate;

use crate::services::aggregator::MetricsSettings;
use crate::services::dashboard::LocalZone;

/// Invalid configuration value.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value:?}")]
    Invalid { key: String, value: String },

    #[error("Invalid metric settings: {0}")]
    Settings(#[from] validator::ValidationErrors),
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub shop_api_base_url: String,
    pub shop_api_timeout_secs: u64,
    /// IANA zone defining the local day. Takes precedence over the offset.
    pub timezone: Option<Tz>,
    /// Constant offset defining the local day, for hosts without zone data.
    pub utc_offset_minutes: Option<i32>,
    pub demo_mode: bool,
    pub metrics: MetricsSettings,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = MetricsSettings::default();

        let metrics = MetricsSettings {
            default_min_stock_level: parse_or(
                &lookup,
                "DASHBOARD_DEFAULT_MIN_STOCK_LEVEL",
                defaults.default_min_stock_level,
            )?,
            top_products_limit: parse_or(
                &lookup,
                "DASHBOARD_TOP_PRODUCTS_LIMIT",
                defaults.top_products_limit,
            )?,
            monthly_target: parse_or(&lookup, "DASHBOARD_MONTHLY_TARGET", defaults.monthly_target)?,
            profit_margin_ratio: parse_or(
                &lookup,
                "DASHBOARD_PROFIT_MARGIN_RATIO",
                defaults.profit_margin_ratio,
            )?,
            net_margin_ratio: parse_or(
                &lookup,
                "DASHBOARD_NET_MARGIN_RATIO",
                defaults.net_margin_ratio,
            )?,
            gross_profit_margin: parse_or(
                &lookup,
                "DASHBOARD_GROSS_PROFIT_MARGIN",
                defaults.gross_profit_margin,
            )?,
            inventory_turnover: parse_or(
                &lookup,
                "DASHBOARD_INVENTORY_TURNOVER",
                defaults.inventory_turnover,
            )?,
            customer_satisfaction: parse_or(
                &lookup,
                "DASHBOARD_CUSTOMER_SATISFACTION",
                defaults.customer_satisfaction,
            )?,
            order_accuracy: parse_or(&lookup, "DASHBOARD_ORDER_ACCURACY", defaults.order_accuracy)?,
        };
        metrics.validate()?;

        let utc_offset_minutes = match lookup("DASHBOARD_UTC_OFFSET_MINUTES") {
            Some(raw) => {
                let minutes: i32 = parse("DASHBOARD_UTC_OFFSET_MINUTES", &raw)?;
                if offset_from_minutes(minutes).is_none() {
                    return Err(invalid("DASHBOARD_UTC_OFFSET_MINUTES", &raw));
                }
                Some(minutes)
            }
            None => None,
        };

        let timezone = match lookup("DASHBOARD_TIMEZONE") {
            Some(raw) if !raw.trim().is_empty() => Some(
                raw.trim()
                    .parse::<Tz>()
                    .map_err(|_| invalid("DASHBOARD_TIMEZONE", &raw))?,
            ),
            _ => None,
        };

        let shop_api_timeout_secs = parse_or(&lookup, "SHOP_API_TIMEOUT_SECS", 10u64)?;
        if shop_api_timeout_secs == 0 {
            return Err(invalid("SHOP_API_TIMEOUT_SECS", "0"));
        }

        Ok(Self {
            host: lookup("BACKEND_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_or(&lookup, "BACKEND_PORT", 3000)?,
            shop_api_base_url: lookup("SHOP_API_BASE_URL")
                .unwrap_or_else(|| "http://localhost:8000/api/v1/shop".to_string()),
            shop_api_timeout_secs,
            timezone,
            utc_offset_minutes,
            demo_mode: parse_flag(&lookup, "DASHBOARD_DEMO_MODE")?,
            metrics,
        })
    }

    /// Zone for the local day: named zone, then fixed offset, then the host's.
    pub fn local_zone(&self) -> LocalZone {
        if let Some(tz) = self.timezone {
            return LocalZone::Named(tz);
        }
        match self.utc_offset_minutes.and_then(offset_from_minutes) {
            Some(offset) => LocalZone::Fixed(offset),
            None => LocalZone::Host,
        }
    }

    pub fn shop_api_timeout(&self) -> Duration {
        Duration::from_secs(self.shop_api_timeout_secs)
    }
}

fn offset_from_minutes(minutes: i32) -> Option<FixedOffset> {
    minutes.checked_mul(60).and_then(FixedOffset::east_opt)
}

fn invalid(key: &str, value: &str) -> ConfigError {
    ConfigError::Invalid {
        key: key.to_string(),
        value: value.to_string(),
    }
}

fn parse<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| invalid(key, raw))
}

fn parse_or<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => parse(key, &raw),
        _ => Ok(default),
    }
}

fn parse_flag(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<bool, ConfigError> {
    let Some(raw) = lookup(key) else {
        return Ok(false);
    };
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "" | "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(invalid(key, &raw)),
    }
}
