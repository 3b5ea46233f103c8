//! Sample inputs for demo mode.
//!
//! Only used when `DASHBOARD_DEMO_MODE` is enabled. Samples are inputs, not
//! precomputed numbers: they go through the same aggregation as live data and
//! are anchored on `now`, so the output stays deterministic.

use chrono::{DateTime, Days, NaiveTime, TimeZone};

use crate::models::sale::SaleRecord;
use crate::models::waste::WasteSummary;

/// (revenue, orders) per day, oldest first, ending today.
const SAMPLE_WEEK: [(f64, u32); 7] = [
    (450.0, 8),
    (520.0, 10),
    (380.0, 7),
    (680.0, 12),
    (890.0, 16),
    (1200.0, 20),
    (750.0, 14),
];

const SAMPLE_WASTE_VALUE: f64 = 450.0;
const SAMPLE_WASTE_COUNT: i64 = 12;
const SAMPLE_WASTE_QUANTITY: f64 = 36.0;

/// Sample sales for the seven days ending on `now`'s date.
///
/// Orders of a day are spread over the 06:00–22:00 trading hours and split
/// the day's revenue evenly.
pub fn sample_sales<Tz: TimeZone>(now: &DateTime<Tz>) -> Vec<SaleRecord> {
    let tz = now.timezone();
    let today = now.date_naive();
    let mut sales = Vec::new();
    let mut next_id = 1i64;

    for (position, (revenue, orders)) in SAMPLE_WEEK.iter().enumerate() {
        let back = (SAMPLE_WEEK.len() - 1 - position) as u64;
        let date = today - Days::new(back);
        let amount = (revenue / f64::from(*orders) * 100.0).round() / 100.0;

        for order in 0..*orders {
            let hour = 6 + (order * 5) % 17;
            let minute = (order * 7) % 60;
            let Some(time) = NaiveTime::from_hms_opt(hour, minute, 0) else {
                continue;
            };
            let Some(at) = tz.from_local_datetime(&date.and_time(time)).earliest() else {
                continue;
            };

            sales.push(SaleRecord {
                id: Some(next_id),
                created_at: Some(at.fixed_offset().to_rfc3339()),
                total_amount: Some(amount),
                items: Vec::new(),
            });
            next_id += 1;
        }
    }

    sales
}

pub fn sample_waste_summary() -> WasteSummary {
    WasteSummary {
        total_waste_value: Some(SAMPLE_WASTE_VALUE),
        waste_count: Some(SAMPLE_WASTE_COUNT),
        total_waste_quantity: Some(SAMPLE_WASTE_QUANTITY),
        previous_total_waste_value: None,
    }
}
