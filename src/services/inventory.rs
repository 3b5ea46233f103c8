//! Inventory pass: stock classification, valuation, category shares and
//! top products.

use std::cmp::Ordering;
use std::collections::HashMap;

use crate::models::metrics::{CategoryShare, InventoryStats, TopProduct};
use crate::models::product::{ProductRecord, StockStatus};
use crate::services::aggregator::{finite, ratio, MetricsSettings};

/// Result of a single traversal over the product list.
#[derive(Debug, Clone, PartialEq)]
pub struct InventorySummary {
    pub stats: InventoryStats,
    pub categories: Vec<CategoryShare>,
    pub top_products: Vec<TopProduct>,
}

/// Running totals for one category, in first-seen order.
struct CategoryTotals<'a> {
    label: &'a str,
    sales: f64,
    count: u64,
}

/// Summarize inventory. `units_sold` maps product id to units sold.
pub fn summarize(
    products: &[ProductRecord],
    units_sold: &HashMap<i64, f64>,
    settings: &MetricsSettings,
) -> InventorySummary {
    let mut low_stock = 0u64;
    let mut out_of_stock = 0u64;
    let mut total_value = 0.0;

    let mut categories: Vec<CategoryTotals<'_>> = Vec::new();
    let mut category_index: HashMap<&str, usize> = HashMap::new();

    for product in products {
        total_value += product.cost_value();

        match product.stock_status(settings.default_min_stock_level) {
            StockStatus::OutOfStock => out_of_stock += 1,
            StockStatus::Low => low_stock += 1,
            StockStatus::Normal => {}
        }

        let label = product.category_label();
        let slot = *category_index.entry(label).or_insert_with(|| {
            categories.push(CategoryTotals {
                label,
                sales: 0.0,
                count: 0,
            });
            categories.len() - 1
        });
        if let Some(totals) = categories.get_mut(slot) {
            totals.sales = saturating_add(totals.sales, share_value(product.retail_value()));
            totals.count += 1;
        }
    }

    let stats = InventoryStats {
        total_products: products.len() as u64,
        low_stock_items: low_stock,
        out_of_stock_items: out_of_stock,
        total_inventory_value: finite(total_value),
        inventory_turnover: finite(settings.inventory_turnover),
    };

    InventorySummary {
        stats,
        categories: category_shares(categories),
        top_products: top_products(products, units_sold, settings.top_products_limit),
    }
}

/// Percentage shares sorted by raw value, descending. Ties keep first-seen order.
///
/// Values are scaled by the largest category before summing, so a category
/// near `f64::MAX` does not push the total to infinity.
fn category_shares(categories: Vec<CategoryTotals<'_>>) -> Vec<CategoryShare> {
    let largest = categories.iter().map(|c| c.sales).fold(0.0, f64::max);
    let scaled_total: f64 = categories.iter().map(|c| ratio(c.sales, largest)).sum();

    let mut shares: Vec<CategoryShare> = categories
        .into_iter()
        .map(|c| {
            let share = ratio(ratio(c.sales, largest), scaled_total) * 100.0;
            CategoryShare {
                category: c.label.to_string(),
                sales: finite(c.sales),
                count: c.count,
                percentage: share.round() as i64,
            }
        })
        .collect();

    shares.sort_by(|a, b| descending(a.sales, b.sales));
    shares
}

/// A product's contribution to its category: never negative, never infinite.
fn share_value(value: f64) -> f64 {
    if value.is_nan() || value <= 0.0 {
        0.0
    } else {
        value.min(f64::MAX)
    }
}

fn saturating_add(a: f64, b: f64) -> f64 {
    (a + b).min(f64::MAX)
}

/// Rank products by notional revenue. The sort is stable so equal revenues
/// keep input order.
fn top_products(
    products: &[ProductRecord],
    units_sold: &HashMap<i64, f64>,
    limit: usize,
) -> Vec<TopProduct> {
    let mut ranked: Vec<TopProduct> = products
        .iter()
        .map(|p| TopProduct {
            id: p.id,
            name: p.display_name().to_string(),
            category: p.category_label().to_string(),
            revenue: finite(p.retail_value()),
            profit: finite(p.margin_value()),
            units_sold: p
                .id
                .and_then(|id| units_sold.get(&id).copied())
                .unwrap_or(0.0),
        })
        .collect();

    ranked.sort_by(|a, b| descending(a.revenue, b.revenue));
    ranked.truncate(limit);
    ranked
}

/// Descending order on values that are already finite; `0.0` and `-0.0` tie.
fn descending(a: f64, b: f64) -> Ordering {
    b.partial_cmp(&a).unwrap_or(Ordering::Equal)
}
