//! Product records as served by the shop backend's product list endpoint.

use serde::Deserialize;

use super::numeric::{lenient_f64, lenient_i64, lenient_string};

/// Category label used when a product carries none.
pub const UNCATEGORIZED: &str = "Uncategorized";

/// Raw product record. Numeric fields are `None` when absent or unparseable.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductRecord {
    #[serde(default, deserialize_with = "lenient_i64")]
    pub id: Option<i64>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub category: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub stock_quantity: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub min_stock_level: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub cost_price: Option<f64>,
    /// Selling price.
    #[serde(default, deserialize_with = "lenient_f64")]
    pub price: Option<f64>,
}

/// Stock classification of a single product.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockStatus {
    /// Stock is exactly zero.
    OutOfStock,
    /// Stock is above zero but at or below the minimum level.
    Low,
    Normal,
}

impl ProductRecord {
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or_default()
    }

    /// Category label, falling back to [`UNCATEGORIZED`] for missing or empty values.
    pub fn category_label(&self) -> &str {
        match self.category.as_deref() {
            Some(label) if !label.is_empty() => label,
            _ => UNCATEGORIZED,
        }
    }

    pub fn stock(&self) -> f64 {
        self.stock_quantity.unwrap_or(0.0)
    }

    /// Stock clamped at zero; negative counts never contribute value.
    pub fn stocked_units(&self) -> f64 {
        self.stock().max(0.0)
    }

    pub fn cost(&self) -> f64 {
        self.cost_price.unwrap_or(0.0)
    }

    pub fn selling_price(&self) -> f64 {
        self.price.unwrap_or(0.0)
    }

    /// Minimum stock level, or `default` when the record has none.
    pub fn min_stock(&self, default: f64) -> f64 {
        self.min_stock_level.unwrap_or(default)
    }

    /// Classify stock: `0` is out of stock, `(0, min]` is low, anything else normal.
    pub fn stock_status(&self, default_min_stock: f64) -> StockStatus {
        let stock = self.stock();
        if stock == 0.0 {
            StockStatus::OutOfStock
        } else if stock > 0.0 && stock <= self.min_stock(default_min_stock) {
            StockStatus::Low
        } else {
            StockStatus::Normal
        }
    }

    /// Inventory value at cost: `max(stock, 0) * cost`.
    pub fn cost_value(&self) -> f64 {
        self.stocked_units() * self.cost()
    }

    /// Notional sales value at selling price: `max(stock, 0) * price`.
    pub fn retail_value(&self) -> f64 {
        self.stocked_units() * self.selling_price()
    }

    /// Notional margin on stock on hand: `(price - cost) * max(stock, 0)`.
    pub fn margin_value(&self) -> f64 {
        (self.selling_price() - self.cost()) * self.stocked_units()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn product(value: serde_json::Value) -> ProductRecord {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn deserializes_django_decimal_strings() {
        let p = product(json!({
            "id": 7,
            "name": "Milk 1L",
            "category": "Dairy",
            "price": "1.50",
            "cost_price": "0.90",
            "stock_quantity": "24.000",
            "min_stock_level": "6",
            "stock_status": "in_stock"
        }));
        assert_eq!(p.id, Some(7));
        assert_eq!(p.display_name(), "Milk 1L");
        assert_eq!(p.selling_price(), 1.5);
        assert_eq!(p.cost(), 0.9);
        assert_eq!(p.stock(), 24.0);
        assert_eq!(p.min_stock(5.0), 6.0);
    }

    #[test]
    fn missing_and_malformed_numbers_read_as_zero() {
        let p = product(json!({
            "name": "Mystery",
            "price": "n/a",
            "cost_price": null,
            "stock_quantity": {"nested": true}
        }));
        assert_eq!(p.selling_price(), 0.0);
        assert_eq!(p.cost(), 0.0);
        assert_eq!(p.stock(), 0.0);
        assert_eq!(p.min_stock(5.0), 5.0);
    }

    #[test]
    fn empty_category_falls_back_to_uncategorized() {
        assert_eq!(product(json!({"category": ""})).category_label(), UNCATEGORIZED);
        assert_eq!(product(json!({})).category_label(), UNCATEGORIZED);
        assert_eq!(product(json!({"category": "Bakery"})).category_label(), "Bakery");
    }

    #[test]
    fn stock_classification_boundaries() {
        let at = |stock: f64, min: Option<f64>| ProductRecord {
            stock_quantity: Some(stock),
            min_stock_level: min,
            ..Default::default()
        };
        assert_eq!(at(0.0, None).stock_status(5.0), StockStatus::OutOfStock);
        assert_eq!(at(0.5, None).stock_status(5.0), StockStatus::Low);
        assert_eq!(at(5.0, None).stock_status(5.0), StockStatus::Low);
        assert_eq!(at(5.5, None).stock_status(5.0), StockStatus::Normal);
        assert_eq!(at(10.0, Some(12.0)).stock_status(5.0), StockStatus::Low);
        assert_eq!(at(-2.0, None).stock_status(5.0), StockStatus::Normal);
    }

    #[test]
    fn negative_stock_contributes_no_value() {
        let p = ProductRecord {
            stock_quantity: Some(-4.0),
            cost_price: Some(2.0),
            price: Some(3.0),
            ..Default::default()
        };
        assert_eq!(p.cost_value(), 0.0);
        assert_eq!(p.retail_value(), 0.0);
        assert_eq!(p.margin_value(), 0.0);
    }
}
