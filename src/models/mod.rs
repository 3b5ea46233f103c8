//! Shop backend records consumed by the dashboard and the snapshot it produces.

pub mod metrics;
pub mod numeric;
pub mod product;
pub mod sale;
pub mod waste;
