//! Dashboard metrics aggregation.
//!
//! `aggregate` is a pure function of its inputs: identical products, sales,
//! waste summary, `now` and settings always produce an identical snapshot.
//! Malformed or missing input degrades to zero; nothing here can fail.
//!
//! Passes, in order:
//! - Sales: today/yesterday, 7-day daily series, 6-month monthly series,
//!   hourly series for today, units sold per product
//! - Inventory: stock classification, valuation, category shares, top products
//! - Waste: totals and share of inventory value
//! - Financial KPIs: net profit from today's revenue minus waste, plus
//!   configured estimates

use chrono::{DateTime, TimeZone};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::models::metrics::{DashboardMetrics, FinancialKpis, Growth, PeriodStats, WasteStats};
use crate::models::product::ProductRecord;
use crate::models::sale::SaleRecord;
use crate::models::waste::WasteSummary;
use crate::services::inventory;
use crate::services::sales::{self, Totals};

/// Business constants and estimates that are not derived from input data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct MetricsSettings {
    /// Minimum stock level assumed for products that carry none.
    #[validate(range(min = 0.0), custom(function = "require_finite"))]
    pub default_min_stock_level: f64,
    #[validate(range(min = 1, max = 5))]
    pub top_products_limit: usize,
    /// Revenue target attached to every month of the monthly series.
    #[validate(range(min = 0.0), custom(function = "require_finite"))]
    pub monthly_target: f64,
    /// Fraction of revenue reported as profit in the daily and monthly series.
    #[validate(range(min = 0.0, max = 1.0), custom(function = "require_finite"))]
    pub profit_margin_ratio: f64,
    /// Fraction of today's revenue kept before waste in the net profit KPI.
    #[validate(range(min = 0.0, max = 1.0), custom(function = "require_finite"))]
    pub net_margin_ratio: f64,
    #[validate(range(min = 0.0, max = 100.0), custom(function = "require_finite"))]
    pub gross_profit_margin: f64,
    #[validate(range(min = 0.0), custom(function = "require_finite"))]
    pub inventory_turnover: f64,
    #[validate(range(min = 0.0, max = 100.0), custom(function = "require_finite"))]
    pub customer_satisfaction: f64,
    #[validate(range(min = 0.0, max = 100.0), custom(function = "require_finite"))]
    pub order_accuracy: f64,
}

impl Default for MetricsSettings {
    fn default() -> Self {
        Self {
            default_min_stock_level: 5.0,
            top_products_limit: 5,
            monthly_target: 50_000.0,
            profit_margin_ratio: 0.40,
            net_margin_ratio: 0.425,
            gross_profit_margin: 42.5,
            inventory_turnover: 4.2,
            customer_satisfaction: 87.0,
            order_accuracy: 94.0,
        }
    }
}

/// Range rules alone let `NaN` through, and open-ended ones accept infinity.
fn require_finite(value: f64) -> Result<(), ValidationError> {
    if value.is_finite() {
        return Ok(());
    }
    let mut err = ValidationError::new("finite");
    err.message = Some("must be a finite number".into());
    Err(err)
}

/// Build a dashboard snapshot from raw inputs.
///
/// `now` fixes both the reference instant and the time zone that defines
/// local days; any `chrono` zone works, including DST-observing ones.
/// Missing collections are passed as empty slices; a missing waste summary
/// as `None`, which yields `WasteStats { has_data: false, .. }`.
pub fn aggregate<Tz: TimeZone>(
    products: &[ProductRecord],
    sales: &[SaleRecord],
    waste: Option<&WasteSummary>,
    now: DateTime<Tz>,
    settings: &MetricsSettings,
) -> DashboardMetrics {
    let generated_at = now.fixed_offset();
    let sales = sales::summarize(sales, now, settings);
    let inventory = inventory::summarize(products, &sales.units_sold, settings);

    let top_category = inventory
        .categories
        .first()
        .map(|c| c.category.clone())
        .unwrap_or_default();

    let today = period_stats(sales.today, sales.yesterday, &top_category);
    let week = period_stats(sales.week, sales.previous_week, &top_category);
    let month = period_stats(sales.month, sales.previous_month, &top_category);

    let waste = waste_stats(waste, inventory.stats.total_inventory_value);
    let financial = financial_kpis(today.total_revenue, &waste, settings);

    DashboardMetrics {
        generated_at,
        today,
        week,
        month,
        inventory: inventory.stats,
        waste,
        financial,
        top_products: inventory.top_products,
        daily_sales: sales.daily,
        monthly_revenue: sales.monthly,
        hourly_sales: sales.hourly,
        product_categories: inventory.categories,
    }
}

fn period_stats(current: Totals, previous: Totals, top_category: &str) -> PeriodStats {
    PeriodStats {
        total_sales: current.count,
        total_revenue: finite(current.revenue),
        average_transaction: current.average(),
        top_category: top_category.to_string(),
        growth: Growth {
            sales: growth(current.count as f64, previous.count as f64),
            revenue: growth(current.revenue, previous.revenue),
        },
    }
}

fn waste_stats(summary: Option<&WasteSummary>, inventory_value: f64) -> WasteStats {
    let Some(summary) = summary else {
        return WasteStats::default();
    };

    let total = finite(summary.total_value());
    let trend = summary
        .previous_total_waste_value
        .map(|previous| growth(total, previous))
        .unwrap_or(0.0);

    WasteStats {
        has_data: true,
        total_waste: total,
        waste_count: summary.count(),
        total_waste_quantity: finite(summary.total_quantity()),
        waste_percentage: ratio(total, inventory_value) * 100.0,
        waste_trend: trend,
    }
}

fn financial_kpis(today_revenue: f64, waste: &WasteStats, settings: &MetricsSettings) -> FinancialKpis {
    FinancialKpis {
        gross_profit_margin: finite(settings.gross_profit_margin),
        net_profit: finite(today_revenue * settings.net_margin_ratio - waste.total_waste),
        shrinkage_rate: waste.waste_percentage,
        customer_satisfaction: finite(settings.customer_satisfaction),
        inventory_turnover: finite(settings.inventory_turnover),
        order_accuracy: finite(settings.order_accuracy),
    }
}

/// `numerator / denominator`, or zero when the result would not be finite.
pub(crate) fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        return 0.0;
    }
    finite(numerator / denominator)
}

/// Percentage change from `previous` to `current`; zero without a baseline.
pub(crate) fn growth(current: f64, previous: f64) -> f64 {
    finite(ratio(current - previous, previous) * 100.0)
}

pub(crate) fn finite(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}
