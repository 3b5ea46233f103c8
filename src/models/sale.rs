//! Sale records as served by the shop backend's sales endpoint.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use super::numeric::{lenient_f64, lenient_i64, lenient_string};

/// Naive timestamp layouts accepted in addition to RFC 3339.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Offset-carrying layouts that RFC 3339 parsing rejects (space separator).
const OFFSET_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f%:z", "%Y-%m-%d %H:%M:%S%.f%#z"];

/// Raw sale record. Only the fields the dashboard reads are kept.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SaleRecord {
    #[serde(default, deserialize_with = "lenient_i64")]
    pub id: Option<i64>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub created_at: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub total_amount: Option<f64>,
    #[serde(default, deserialize_with = "lenient_items")]
    pub items: Vec<SaleItemRecord>,
}

/// Line item of a sale.
///
/// The backend sends both `product` (primary key) and `product_id`; either
/// identifies the product.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SaleItemRecord {
    #[serde(default, deserialize_with = "lenient_i64")]
    pub product_id: Option<i64>,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub product: Option<i64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub quantity: Option<f64>,
}

impl SaleItemRecord {
    pub fn product_key(&self) -> Option<i64> {
        self.product_id.or(self.product)
    }

    pub fn units(&self) -> f64 {
        self.quantity.unwrap_or(0.0)
    }
}

impl SaleRecord {
    pub fn amount(&self) -> f64 {
        self.total_amount.unwrap_or(0.0)
    }

    /// Sale time converted to `tz`, or `None` when missing or malformed.
    pub fn local_time<Tz: TimeZone>(&self, tz: &Tz) -> Option<DateTime<Tz>> {
        parse_timestamp(self.created_at.as_deref()?, tz)
    }
}

/// Parse a backend timestamp into the caller's time zone.
///
/// - RFC 3339 (with `Z` or an explicit offset) is converted to `tz`, using
///   the offset `tz` has at that instant.
/// - Naive date-times are taken as already local to `tz`. On a DST fold the
///   earlier instant wins; times inside a DST gap are rejected.
/// - Date-only values are midnight UTC.
pub fn parse_timestamp<Tz: TimeZone>(raw: &str, tz: &Tz) -> Option<DateTime<Tz>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(tz));
    }

    for format in OFFSET_FORMATS {
        if let Ok(parsed) = DateTime::parse_from_str(raw, format) {
            return Some(parsed.with_timezone(tz));
        }
    }

    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return tz.from_local_datetime(&naive).earliest();
        }
    }

    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()?;
    let midnight = date.and_hms_opt(0, 0, 0)?;
    Some(Utc.from_utc_datetime(&midnight).with_timezone(tz))
}

/// Serde adapter: keep well-formed line items, drop the rest.
fn lenient_items<'de, D>(deserializer: D) -> Result<Vec<SaleItemRecord>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    let items = match value {
        Some(Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect(),
        _ => Vec::new(),
    };
    Ok(items)
}
