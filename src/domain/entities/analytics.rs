use chrono::{DateTime, Datelike, Duration, Months, TimeZone, Utc};
use serde::Serialize;
use strum::{AsRefStr, EnumString};

/// Reporting period for dashboard comparisons. Unknown values fall back to `Month`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, AsRefStr, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum AnalyticsPeriod {
    Today,
    Week,
    #[default]
    Month,
    Year,
}

impl AnalyticsPeriod {
    pub fn parse_or_default(raw: Option<&str>) -> Self {
        raw.and_then(|value| value.trim().to_lowercase().parse().ok())
            .unwrap_or_default()
    }

    /// Start of the current window ending at `now`.
    pub fn window_start(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            AnalyticsPeriod::Today => start_of_day(now),
            AnalyticsPeriod::Week => now - Duration::days(7),
            AnalyticsPeriod::Month => now.checked_sub_months(Months::new(1)).unwrap_or(now),
            AnalyticsPeriod::Year => now.checked_sub_months(Months::new(12)).unwrap_or(now),
        }
    }

    pub fn current_window(&self, now: DateTime<Utc>) -> Window {
        Window {
            start: self.window_start(now),
            end: now,
        }
    }
}

/// Half-open time range `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Window {
    /// The window of equal length that ends where this one starts.
    pub fn previous(&self) -> Window {
        let length = self.end - self.start;
        Window {
            start: self.start - length,
            end: self.start,
        }
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        at >= self.start && at < self.end
    }
}

/// A calendar-month bucket labelled with its short month name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthBucket {
    pub label: String,
    pub window: Window,
}

/// The twelve calendar months ending with the month containing `now`, oldest first.
pub fn last_twelve_months(now: DateTime<Utc>) -> Vec<MonthBucket> {
    let this_month = Utc
        .with_ymd_and_hms(now.year(), now.month(), 1, 0, 0, 0)
        .single()
        .unwrap_or_else(|| start_of_day(now));

    (0..12u32)
        .rev()
        .filter_map(|back| {
            let start = this_month.checked_sub_months(Months::new(back))?;
            let end = start.checked_add_months(Months::new(1))?;
            Some(MonthBucket {
                label: start.format("%b").to_string(),
                window: Window { start, end },
            })
        })
        .collect()
}

fn start_of_day(at: DateTime<Utc>) -> DateTime<Utc> {
    at.date_naive()
        .and_hms_opt(0, 0, 0)
        .map(|naive| naive.and_utc())
        .unwrap_or(at)
}

pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Period-over-period change in percent, 0 when there is no previous value.
pub fn percent_change(current: f64, previous: f64) -> f64 {
    if previous > 0.0 {
        round1((current - previous) / previous * 100.0)
    } else {
        0.0
    }
}

/// `part / total` as a percentage with one decimal, 0 for an empty total.
pub fn ratio_percent(part: i64, total: i64) -> f64 {
    if total > 0 {
        round1(part as f64 / total as f64 * 100.0)
    } else {
        0.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendMetric {
    pub value: f64,
    pub change: f64,
    pub trend: Trend,
}

impl TrendMetric {
    pub fn compare(current: f64, previous: f64) -> Self {
        let change = percent_change(current, previous);
        Self {
            value: current,
            change,
            trend: if change >= 0.0 { Trend::Up } else { Trend::Down },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RateMetric {
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardMetrics {
    pub revenue: TrendMetric,
    pub clients: TrendMetric,
    pub conversion_rate: RateMetric,
    pub churn_rate: RateMetric,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TicketStats {
    pub total: i64,
    pub open: i64,
    pub resolved: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    pub metrics: DashboardMetrics,
    pub tickets: TicketStats,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RevenuePoint {
    pub month: String,
    pub revenue: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AcquisitionPoint {
    pub month: String,
    pub clients: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DistributionSlice {
    pub name: String,
    pub value: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryPerformance {
    pub name: String,
    pub services: i64,
    pub revenue: f64,
}
