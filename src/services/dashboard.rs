//! Dashboard refresh: fetch the three inputs, aggregate, keep the latest snapshot.

use std::sync::Arc;

use chrono::{DateTime, FixedOffset, Local, TimeZone, Utc};
use chrono_tz::Tz;
use serde::Serialize;
use tokio::sync::{Mutex, RwLock};

use crate::models::metrics::DashboardMetrics;
use crate::models::product::ProductRecord;
use crate::models::sale::SaleRecord;
use crate::models::waste::WasteSummary;
use crate::services::aggregator::{self, MetricsSettings};
use crate::services::demo;
use crate::services::shop_client::{FetchError, ShopDataSource};

/// Where one input of a snapshot came from.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SourceState {
    /// Fetched from the shop backend.
    Live { records: usize },
    /// Substituted with sample data (demo mode only).
    Demo { reason: String },
    /// Fetch failed; the aggregator ran without this input.
    Unavailable { reason: String },
}

/// Provenance of each input of a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceStatus {
    pub products: SourceState,
    pub sales: SourceState,
    pub waste: SourceState,
}

/// Aggregated metrics plus the provenance of their inputs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSnapshot {
    pub metrics: DashboardMetrics,
    pub sources: SourceStatus,
    pub refreshed_at: DateTime<FixedOffset>,
}

/// Time zone that defines the local day.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum LocalZone {
    /// The host's zone, DST rules included.
    #[default]
    Host,
    /// A constant offset with no DST.
    Fixed(FixedOffset),
    /// An IANA zone such as `Europe/Berlin`.
    Named(Tz),
}

/// Tuning for [`DashboardService`].
#[derive(Debug, Clone, Default)]
pub struct DashboardOptions {
    pub settings: MetricsSettings,
    pub zone: LocalZone,
    /// Substitute sample sales and waste when those inputs are unavailable.
    pub demo_mode: bool,
}

type Fetched = (
    Result<Vec<ProductRecord>, FetchError>,
    Result<Vec<SaleRecord>, FetchError>,
    Result<WasteSummary, FetchError>,
);

/// Runs refresh cycles against a [`ShopDataSource`].
///
/// Refreshes are serialized: a refresh requested while another is running
/// waits for it and then performs its own fetch.
#[derive(Debug)]
pub struct DashboardService<S> {
    source: S,
    options: DashboardOptions,
    refresh_lock: Mutex<()>,
    latest: RwLock<Option<Arc<DashboardSnapshot>>>,
}

impl<S: ShopDataSource> DashboardService<S> {
    pub fn new(source: S, options: DashboardOptions) -> Self {
        Self {
            source,
            options,
            refresh_lock: Mutex::new(()),
            latest: RwLock::new(None),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn options(&self) -> &DashboardOptions {
        &self.options
    }

    /// Most recent snapshot, if any refresh has completed.
    pub async fn latest(&self) -> Option<Arc<DashboardSnapshot>> {
        self.latest.read().await.clone()
    }

    /// Latest snapshot, running a first refresh when there is none yet.
    pub async fn latest_or_refresh(&self) -> Arc<DashboardSnapshot> {
        match self.latest().await {
            Some(snapshot) => snapshot,
            None => self.refresh().await,
        }
    }

    /// Refresh as of the wall clock, in the configured zone.
    pub async fn refresh(&self) -> Arc<DashboardSnapshot> {
        let _guard = self.refresh_lock.lock().await;
        let fetched = self.fetch_all().await;

        let at = Utc::now();
        let snapshot = match self.options.zone {
            LocalZone::Host => self.assemble(fetched, at.with_timezone(&Local)),
            LocalZone::Fixed(offset) => self.assemble(fetched, at.with_timezone(&offset)),
            LocalZone::Named(tz) => self.assemble(fetched, at.with_timezone(&tz)),
        };
        self.store(snapshot).await
    }

    /// Refresh as of `now`, with local days taken from `now`'s zone.
    pub async fn refresh_at<Z>(&self, now: DateTime<Z>) -> Arc<DashboardSnapshot>
    where
        Z: TimeZone + Send + Sync,
        Z::Offset: Send + Sync,
    {
        let _guard = self.refresh_lock.lock().await;
        let fetched = self.fetch_all().await;
        let snapshot = self.assemble(fetched, now);
        self.store(snapshot).await
    }

    async fn fetch_all(&self) -> Fetched {
        // Each fetch settles independently; one failure never blocks the others.
        tokio::join!(
            self.source.fetch_products(),
            self.source.fetch_sales(),
            self.source.fetch_waste_summary(),
        )
    }

    fn assemble<Z: TimeZone>(&self, fetched: Fetched, now: DateTime<Z>) -> DashboardSnapshot {
        let (products, sales, waste) = fetched;

        let (products, products_state) = match products {
            Ok(products) => {
                let state = SourceState::Live {
                    records: products.len(),
                };
                (products, state)
            }
            Err(e) => (Vec::new(), unavailable("products", &e)),
        };

        let (sales, sales_state) = match sales {
            Ok(sales) if sales.is_empty() && self.options.demo_mode => {
                tracing::info!("No sales recorded, using demo sales");
                (demo::sample_sales(&now), demo_state("no sales recorded"))
            }
            Ok(sales) => {
                let state = SourceState::Live {
                    records: sales.len(),
                };
                (sales, state)
            }
            Err(e) if self.options.demo_mode => {
                tracing::warn!(error = %e, "Sales unavailable, using demo sales");
                (demo::sample_sales(&now), demo_state(&e.to_string()))
            }
            Err(e) => (Vec::new(), unavailable("sales", &e)),
        };

        let (waste, waste_state) = match waste {
            Ok(summary) => (Some(summary), SourceState::Live { records: 1 }),
            Err(e) if self.options.demo_mode => {
                tracing::warn!(error = %e, "Waste summary unavailable, using demo waste");
                (Some(demo::sample_waste_summary()), demo_state(&e.to_string()))
            }
            Err(e) => (None, unavailable("waste", &e)),
        };

        let refreshed_at = now.fixed_offset();
        let metrics = aggregator::aggregate(
            &products,
            &sales,
            waste.as_ref(),
            now,
            &self.options.settings,
        );

        tracing::info!(
            products = products.len(),
            sales = sales.len(),
            has_waste = metrics.waste.has_data,
            today_revenue = metrics.today.total_revenue,
            "Dashboard refreshed"
        );

        DashboardSnapshot {
            metrics,
            sources: SourceStatus {
                products: products_state,
                sales: sales_state,
                waste: waste_state,
            },
            refreshed_at,
        }
    }

    async fn store(&self, snapshot: DashboardSnapshot) -> Arc<DashboardSnapshot> {
        let snapshot = Arc::new(snapshot);
        *self.latest.write().await = Some(Arc::clone(&snapshot));
        snapshot
    }
}

fn unavailable(input: &str, error: &FetchError) -> SourceState {
    tracing::warn!(input, error = %error, "Dashboard input unavailable");
    SourceState::Unavailable {
        reason: error.to_string(),
    }
}

fn demo_state(reason: &str) -> SourceState {
    SourceState::Demo {
        reason: reason.to_string(),
    }
}
