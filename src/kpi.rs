use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::models::{ActivityRecord, AgentDirectory, ReportMode};

/// Working days assumed in a month when computing par and daily averages.
pub const REFERENCE_DAYS: u32 = 26;

/// Cumulative par by month for year-to-date views.
pub const YTD_PAR_PERCENTAGES: [f64; 12] = [
    8.3, 16.6, 25.0, 33.3, 41.6, 50.0, 58.3, 66.6, 75.0, 83.3, 91.6, 100.0,
];

pub const QUOTATION_PREPARATION: &str = "Quotation Preparation";
pub const SALES_ORDER_PREPARATION: &str = "Sales Order Preparation";
pub const DELIVERED: &str = "Delivered";
pub const OUTBOUND_TOUCHBASE: &str = "Outbound - Touchbase";

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SummaryWindow {
    pub mode: ReportMode,
    /// 1-based.
    pub month: u32,
    pub year: i32,
}

impl SummaryWindow {
    pub fn contains(&self, date: NaiveDate) -> bool {
        let same_year = date.year() == self.year;
        match self.mode {
            ReportMode::Mtd => same_year && date.month() == self.month,
            ReportMode::Ytd => same_year,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AgentPeriodSummary {
    pub agent_name: String,
    pub reference_id: String,
    pub period_label: String,
    pub total_so_amount: f64,
    pub total_actual_sales: f64,
    pub target_quota: f64,
    pub par_percentage: f64,
    pub preparation_quote_count: u32,
    pub sales_order_count: u32,
    pub si_count: u32,
    pub outbound_calls: u32,
    pub average_daily_sales: f64,
    #[serde(skip)]
    pub records: Vec<ActivityRecord>,
}

impl AgentPeriodSummary {
    pub fn calls_to_quote(&self) -> f64 {
        percentage(self.preparation_quote_count, self.outbound_calls)
    }

    pub fn quote_to_sales_order(&self) -> f64 {
        percentage(self.sales_order_count, self.preparation_quote_count)
    }

    pub fn sales_order_to_invoice(&self) -> f64 {
        percentage(self.si_count, self.sales_order_count)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct KpiTotals {
    pub target_quota: f64,
    pub average_daily_sales: f64,
    pub calls_to_quote: f64,
    pub quote_to_sales_order: f64,
    pub sales_order_to_invoice: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct KpiReport {
    pub mode: ReportMode,
    pub groups: BTreeMap<String, AgentPeriodSummary>,
    pub totals: KpiTotals,
}

pub fn days_elapsed(mode: ReportMode, today: NaiveDate) -> u32 {
    match mode {
        ReportMode::Mtd => today.day().min(REFERENCE_DAYS),
        ReportMode::Ytd => REFERENCE_DAYS * 12,
    }
}

pub fn mtd_par(today: NaiveDate) -> f64 {
    days_elapsed(ReportMode::Mtd, today) as f64 / REFERENCE_DAYS as f64 * 100.0
}

pub fn ytd_par(month: u32) -> f64 {
    month
        .checked_sub(1)
        .and_then(|index| YTD_PAR_PERCENTAGES.get(index as usize))
        .copied()
        .unwrap_or(0.0)
}

pub fn month_name(month: u32) -> &'static str {
    month
        .checked_sub(1)
        .and_then(|index| MONTH_NAMES.get(index as usize))
        .copied()
        .unwrap_or("Unknown")
}

/// Groups the records inside `window` by agent and period and derives the
/// conversion funnel for each group.
///
/// `today` drives the elapsed-day count for month-to-date views regardless of
/// which month is selected.
pub fn summarize(
    records: &[ActivityRecord],
    directory: &AgentDirectory,
    window: SummaryWindow,
    today: NaiveDate,
) -> KpiReport {
    let elapsed = days_elapsed(window.mode, today);
    let mut groups: BTreeMap<String, AgentPeriodSummary> = BTreeMap::new();

    for record in records {
        let date = record.date_created.date_naive();
        if !window.contains(date) {
            continue;
        }

        let agent_name = directory.name_of(&record.referenceid);
        let period_label = match window.mode {
            ReportMode::Mtd => format!("{} {}", month_name(date.month()), date.year()),
            ReportMode::Ytd => date.year().to_string(),
        };
        let key = format!("{agent_name} {period_label}");

        let entry = groups.entry(key).or_insert_with(|| {
            let (par_percentage, quota_factor) = match window.mode {
                ReportMode::Mtd => (mtd_par(today), 1.0),
                ReportMode::Ytd => (ytd_par(date.month()), 12.0),
            };
            AgentPeriodSummary {
                agent_name: agent_name.clone(),
                reference_id: record.referenceid.clone(),
                period_label: period_label.clone(),
                total_so_amount: 0.0,
                total_actual_sales: 0.0,
                target_quota: record.targetquota * quota_factor,
                par_percentage,
                preparation_quote_count: 0,
                sales_order_count: 0,
                si_count: 0,
                outbound_calls: 0,
                average_daily_sales: 0.0,
                records: Vec::new(),
            }
        });

        entry.total_so_amount += record.soamount;
        entry.total_actual_sales += record.actualsales;
        if record.typeactivity == QUOTATION_PREPARATION {
            entry.preparation_quote_count += 1;
        }
        if record.typeactivity == SALES_ORDER_PREPARATION {
            entry.sales_order_count += 1;
        }
        if record.activitystatus == DELIVERED {
            entry.si_count += 1;
        }
        if record.source == OUTBOUND_TOUCHBASE {
            entry.outbound_calls += 1;
        }
        entry.average_daily_sales = if elapsed > 0 {
            round2(entry.si_count as f64 / elapsed as f64)
        } else {
            0.0
        };
        entry.records.push(record.clone());
    }

    let totals = totals(groups.values());
    KpiReport {
        mode: window.mode,
        groups,
        totals,
    }
}

/// Sums the target and averages the rates across groups; an empty set yields zeros.
pub fn totals<'a>(groups: impl Iterator<Item = &'a AgentPeriodSummary>) -> KpiTotals {
    let mut sum = KpiTotals::default();
    let mut count = 0usize;

    for group in groups {
        count += 1;
        sum.target_quota += group.target_quota;
        sum.average_daily_sales += group.average_daily_sales;
        sum.calls_to_quote += group.calls_to_quote();
        sum.quote_to_sales_order += group.quote_to_sales_order();
        sum.sales_order_to_invoice += group.sales_order_to_invoice();
    }

    let divisor = count.max(1) as f64;
    KpiTotals {
        target_quota: sum.target_quota,
        average_daily_sales: sum.average_daily_sales / divisor,
        calls_to_quote: sum.calls_to_quote / divisor,
        quote_to_sales_order: sum.quote_to_sales_order / divisor,
        sales_order_to_invoice: sum.sales_order_to_invoice / divisor,
    }
}

fn percentage(numerator: u32, denominator: u32) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64 * 100.0
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
