//! Sales pass: bucket sale records by local calendar day, month and hour.
//!
//! Every record is localized once into `now`'s time zone, with the offset in
//! force at the sale itself, so days before a DST change bucket correctly.
//! Records whose timestamp is missing or malformed are excluded from all
//! time buckets.

use std::collections::HashMap;

use chrono::{DateTime, Datelike, Days, NaiveDate, TimeZone, Timelike};

use crate::models::metrics::{DailySales, HourlySales, MonthlyRevenue};
use crate::models::sale::SaleRecord;
use crate::services::aggregator::{finite, ratio, MetricsSettings};

/// Days in the daily series, ending today.
pub const DAILY_WINDOW: u64 = 7;
/// Months in the monthly series, ending with the current month.
pub const MONTHLY_WINDOW: u32 = 6;
/// First hour of the hourly series.
pub const FIRST_HOUR: u32 = 6;
/// Last hour of the hourly series, inclusive.
pub const LAST_HOUR: u32 = 22;

const MONTH_LABELS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Transaction count and revenue of a bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Totals {
    pub count: u64,
    pub revenue: f64,
}

impl Totals {
    fn record(&mut self, amount: f64) {
        self.count += 1;
        self.revenue += amount;
    }

    fn merge(&mut self, other: Totals) {
        self.count += other.count;
        self.revenue += other.revenue;
    }

    /// `revenue / count`, zero for an empty bucket.
    pub fn average(&self) -> f64 {
        ratio(self.revenue, self.count as f64)
    }
}

/// Bucketed view of the sales list relative to `now`.
#[derive(Debug, Clone, PartialEq)]
pub struct SalesSummary {
    pub today: Totals,
    pub yesterday: Totals,
    /// The 7 local days ending today.
    pub week: Totals,
    /// The 7 local days before `week`.
    pub previous_week: Totals,
    /// The current calendar month, not the 6-month series total.
    pub month: Totals,
    pub previous_month: Totals,
    pub daily: Vec<DailySales>,
    pub monthly: Vec<MonthlyRevenue>,
    pub hourly: Vec<HourlySales>,
    /// Units sold per product id, from sale line items.
    pub units_sold: HashMap<i64, f64>,
}

pub fn summarize<Tz: TimeZone>(
    sales: &[SaleRecord],
    now: DateTime<Tz>,
    settings: &MetricsSettings,
) -> SalesSummary {
    let tz = now.timezone();
    let today = now.date_naive();

    let mut by_day: HashMap<NaiveDate, Totals> = HashMap::new();
    let mut by_month: HashMap<(i32, u32), Totals> = HashMap::new();
    let mut today_by_hour = [Totals::default(); 24];
    let mut units_sold: HashMap<i64, f64> = HashMap::new();

    for sale in sales {
        for item in &sale.items {
            if let Some(product) = item.product_key() {
                *units_sold.entry(product).or_insert(0.0) += item.units();
            }
        }

        let Some(at) = sale.local_time(&tz) else {
            continue;
        };
        let amount = sale.amount();
        let date = at.date_naive();

        by_day.entry(date).or_default().record(amount);
        by_month
            .entry((date.year(), date.month()))
            .or_default()
            .record(amount);
        if date == today {
            if let Some(bucket) = today_by_hour.get_mut(at.hour() as usize) {
                bucket.record(amount);
            }
        }
    }

    let day_totals = |back: u64| -> Totals {
        by_day
            .get(&days_before(today, back))
            .copied()
            .unwrap_or_default()
    };
    let month_totals = |back: u32| -> Totals {
        by_month
            .get(&months_before(today, back))
            .copied()
            .unwrap_or_default()
    };

    let mut week = Totals::default();
    let mut previous_week = Totals::default();
    for back in 0..DAILY_WINDOW {
        week.merge(day_totals(back));
        previous_week.merge(day_totals(back + DAILY_WINDOW));
    }

    let daily = (0..DAILY_WINDOW)
        .rev()
        .map(|back| {
            let date = days_before(today, back);
            let totals = day_totals(back);
            let revenue = finite(totals.revenue);
            DailySales {
                day: date.format("%a").to_string(),
                date,
                revenue,
                orders: totals.count,
                profit: finite(revenue * settings.profit_margin_ratio),
            }
        })
        .collect();

    let monthly = (0..MONTHLY_WINDOW)
        .rev()
        .map(|back| {
            let (year, month) = months_before(today, back);
            let totals = month_totals(back);
            let revenue = finite(totals.revenue);
            MonthlyRevenue {
                month: month_label(month).to_string(),
                year,
                revenue,
                orders: totals.count,
                target: finite(settings.monthly_target),
                profit: finite(revenue * settings.profit_margin_ratio),
            }
        })
        .collect();

    let hourly = (FIRST_HOUR..=LAST_HOUR)
        .map(|hour| {
            let totals = today_by_hour
                .get(hour as usize)
                .copied()
                .unwrap_or_default();
            HourlySales {
                hour,
                label: hour_label(hour),
                sales: totals.count,
                revenue: finite(totals.revenue),
            }
        })
        .collect();

    SalesSummary {
        today: day_totals(0),
        yesterday: day_totals(1),
        week,
        previous_week,
        month: month_totals(0),
        previous_month: month_totals(1),
        daily,
        monthly,
        hourly,
        units_sold,
    }
}

fn days_before(date: NaiveDate, back: u64) -> NaiveDate {
    date - Days::new(back)
}

/// Calendar `(year, month)` that lies `back` months before `date`'s month.
pub fn months_before(date: NaiveDate, back: u32) -> (i32, u32) {
    let index = date.year() * 12 + date.month0() as i32 - back as i32;
    (index.div_euclid(12), index.rem_euclid(12) as u32 + 1)
}

fn month_label(month: u32) -> &'static str {
    MONTH_LABELS
        .get(month.saturating_sub(1) as usize)
        .copied()
        .unwrap_or_default()
}

/// 12-hour clock label: `6AM`, `11AM`, `12PM`, `1PM`, `10PM`.
pub fn hour_label(hour: u32) -> String {
    match hour {
        0 => "12AM".to_string(),
        1..=11 => format!("{hour}AM"),
        12 => "12PM".to_string(),
        _ => format!("{}PM", hour - 12),
    }
}
