//! Shop backend client: the data-access boundary feeding the dashboard.
//!
//! Endpoints (relative to `SHOP_API_BASE_URL`):
//! - `GET /products/`       product list (JSON array)
//! - `GET /sales/`          sale list, possibly nested under `results` or `data`
//! - `GET /wastes/summary/` `{ "success": true, "summary": { ... } }`
//! - `GET /status/`         liveness of the shop backend

use std::future::Future;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

use crate::models::product::ProductRecord;
use crate::models::sale::SaleRecord;
use crate::models::waste::WasteSummary;

const PRODUCTS_PATH: &str = "/products/";
const SALES_PATH: &str = "/sales/";
const WASTE_SUMMARY_PATH: &str = "/wastes/summary/";
const STATUS_PATH: &str = "/status/";

/// Upstream error bodies are truncated to this many characters in messages.
const MAX_ERROR_BODY: usize = 200;

/// Classified failure of a single fetch.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Transport failure: connection refused, timeout, TLS.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Backend answered with a non-success status.
    #[error("Shop API returned HTTP {status}: {message}")]
    Status { status: u16, message: String },

    /// Backend answered with an empty body or `null`.
    #[error("Empty payload from {0}")]
    Empty(String),

    /// Body was not the expected shape.
    #[error("Malformed payload from {endpoint}: {message}")]
    Malformed { endpoint: String, message: String },

    /// Backend reported `success: false`.
    #[error("Shop API rejected request: {0}")]
    Rejected(String),
}

impl FetchError {
    fn malformed(endpoint: &str, message: impl Into<String>) -> Self {
        Self::Malformed {
            endpoint: endpoint.to_string(),
            message: message.into(),
        }
    }
}

/// Source of the three raw dashboard inputs. Each fetch fails independently.
pub trait ShopDataSource: Send + Sync {
    fn fetch_products(&self) -> impl Future<Output = Result<Vec<ProductRecord>, FetchError>> + Send;

    fn fetch_sales(&self) -> impl Future<Output = Result<Vec<SaleRecord>, FetchError>> + Send;

    fn fetch_waste_summary(&self) -> impl Future<Output = Result<WasteSummary, FetchError>> + Send;

    /// Check that the backend is reachable.
    fn check_status(&self) -> impl Future<Output = Result<(), FetchError>> + Send;
}

/// HTTP client for the shop backend API.
#[derive(Debug, Clone)]
pub struct ShopClient {
    client: reqwest::Client,
    base_url: String,
}

impl ShopClient {
    /// Create a client for `base_url` with a per-request timeout.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// GET `path` and decode the body as JSON, rejecting empty payloads.
    async fn get_json(&self, path: &str) -> Result<Value, FetchError> {
        let url = format!("{}{path}", self.base_url);
        let response = self.client.get(&url).send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Status {
                status: status.as_u16(),
                message: body.chars().take(MAX_ERROR_BODY).collect(),
            });
        }

        let body = response.bytes().await?;
        if body.iter().all(u8::is_ascii_whitespace) {
            return Err(FetchError::Empty(path.to_string()));
        }

        let value: Value = serde_json::from_slice(&body)
            .map_err(|e| FetchError::malformed(path, e.to_string()))?;
        if value.is_null() {
            return Err(FetchError::Empty(path.to_string()));
        }
        Ok(value)
    }
}

impl ShopDataSource for ShopClient {
    async fn fetch_products(&self) -> Result<Vec<ProductRecord>, FetchError> {
        let value = self.get_json(PRODUCTS_PATH).await?;
        parse_products(value)
    }

    async fn fetch_sales(&self) -> Result<Vec<SaleRecord>, FetchError> {
        let value = self.get_json(SALES_PATH).await?;
        parse_sales(value)
    }

    async fn fetch_waste_summary(&self) -> Result<WasteSummary, FetchError> {
        let value = self.get_json(WASTE_SUMMARY_PATH).await?;
        parse_waste_summary(value)
    }

    async fn check_status(&self) -> Result<(), FetchError> {
        self.get_json(STATUS_PATH).await.map(|_| ())
    }
}

/// Decode the product list. Entries that are not objects are skipped.
pub fn parse_products(value: Value) -> Result<Vec<ProductRecord>, FetchError> {
    match value {
        Value::Array(items) => Ok(decode_records(items, PRODUCTS_PATH)),
        other => Err(FetchError::malformed(
            PRODUCTS_PATH,
            format!("expected a list, got {}", kind(&other)),
        )),
    }
}

/// Decode the sale list, unwrapping one level of `results` and then one
/// level of `data` when present.
pub fn parse_sales(value: Value) -> Result<Vec<SaleRecord>, FetchError> {
    let value = unwrap_nested(value, "results");
    let value = unwrap_nested(value, "data");
    match value {
        Value::Array(items) => Ok(decode_records(items, SALES_PATH)),
        other => Err(FetchError::malformed(
            SALES_PATH,
            format!("expected a list, got {}", kind(&other)),
        )),
    }
}

/// Decode the waste summary from `{ "summary": {...} }` or a bare summary.
pub fn parse_waste_summary(value: Value) -> Result<WasteSummary, FetchError> {
    if value.get("success").and_then(Value::as_bool) == Some(false) {
        let reason = value
            .get("error")
            .and_then(Value::as_str)
            .unwrap_or("no reason given");
        return Err(FetchError::Rejected(reason.to_string()));
    }

    let summary = match value {
        Value::Object(mut body) => match body.remove("summary") {
            Some(inner @ Value::Object(_)) => inner,
            Some(other) => {
                return Err(FetchError::malformed(
                    WASTE_SUMMARY_PATH,
                    format!("summary is {}", kind(&other)),
                ))
            }
            None => Value::Object(body),
        },
        other => {
            return Err(FetchError::malformed(
                WASTE_SUMMARY_PATH,
                format!("expected an object, got {}", kind(&other)),
            ))
        }
    };

    serde_json::from_value(summary).map_err(|e| FetchError::malformed(WASTE_SUMMARY_PATH, e.to_string()))
}

/// Replace `value` with `value[key]` when that is an array.
fn unwrap_nested(mut value: Value, key: &str) -> Value {
    if value.get(key).is_some_and(Value::is_array) {
        if let Some(inner) = value.get_mut(key) {
            return inner.take();
        }
    }
    value
}

fn decode_records<T: DeserializeOwned>(items: Vec<Value>, endpoint: &str) -> Vec<T> {
    let total = items.len();
    let records: Vec<T> = items
        .into_iter()
        .filter_map(|item| serde_json::from_value(item).ok())
        .collect();

    let skipped = total - records.len();
    if skipped > 0 {
        tracing::warn!(endpoint, skipped, total, "Skipped undecodable records");
    }
    records
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}
