//! Business logic services.

pub mod aggregator;
pub mod dashboard;
pub mod demo;
pub mod inventory;
pub mod sales;
pub mod shop_client;
