//! Dashboard metrics snapshot returned by the aggregator.
//!
//! Every type here is plain data: the snapshot is recomputed wholesale on
//! each refresh and never mutated afterwards.

use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::Serialize;

/// Complete presentation-ready dashboard snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardMetrics {
    pub generated_at: DateTime<FixedOffset>,
    /// Today against yesterday.
    pub today: PeriodStats,
    /// The 7 local days ending today against the 7 days before.
    pub week: PeriodStats,
    /// Current calendar month against the previous one. This is not the sum
    /// of `monthly_revenue`.
    pub month: PeriodStats,
    pub inventory: InventoryStats,
    pub waste: WasteStats,
    pub financial: FinancialKpis,
    pub top_products: Vec<TopProduct>,
    pub daily_sales: Vec<DailySales>,
    pub monthly_revenue: Vec<MonthlyRevenue>,
    pub hourly_sales: Vec<HourlySales>,
    pub product_categories: Vec<CategoryShare>,
}

/// Transaction totals for one reporting period.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PeriodStats {
    pub total_sales: u64,
    pub total_revenue: f64,
    pub average_transaction: f64,
    pub top_category: String,
    pub growth: Growth,
}

/// Period-over-period change, in percent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Growth {
    pub sales: f64,
    pub revenue: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct InventoryStats {
    pub total_products: u64,
    pub low_stock_items: u64,
    pub out_of_stock_items: u64,
    pub total_inventory_value: f64,
    pub inventory_turnover: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WasteStats {
    /// False when no waste summary was available; all figures are then zero.
    pub has_data: bool,
    pub total_waste: f64,
    pub waste_count: u64,
    pub total_waste_quantity: f64,
    pub waste_percentage: f64,
    pub waste_trend: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FinancialKpis {
    pub gross_profit_margin: f64,
    pub net_profit: f64,
    pub shrinkage_rate: f64,
    pub customer_satisfaction: f64,
    pub inventory_turnover: f64,
    pub order_accuracy: f64,
}

/// Product ranked by notional revenue of stock on hand.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopProduct {
    pub id: Option<i64>,
    pub name: String,
    pub category: String,
    pub revenue: f64,
    pub profit: f64,
    pub units_sold: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailySales {
    /// Short weekday label, e.g. `Mon`.
    pub day: String,
    pub date: NaiveDate,
    pub revenue: f64,
    pub orders: u64,
    pub profit: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyRevenue {
    /// Short month label, e.g. `Jan`.
    pub month: String,
    pub year: i32,
    pub revenue: f64,
    pub orders: u64,
    pub target: f64,
    pub profit: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HourlySales {
    pub hour: u32,
    /// 12-hour clock label, e.g. `6AM`, `12PM`, `10PM`.
    pub label: String,
    pub sales: u64,
    pub revenue: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryShare {
    pub category: String,
    pub sales: f64,
    pub count: u64,
    /// Share of the summed category values, rounded to a whole percent.
    pub percentage: i64,
}
