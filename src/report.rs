use std::fmt::Write;

use chrono::{DateTime, Utc};

use crate::activity_log::LogPage;
use crate::kpi::{month_name, KpiReport, SummaryWindow};
use crate::models::{AgentDirectory, NotificationRecord, ReportMode};
use crate::ranking::CallRanking;

/// Formats an amount with thousands separators and no decimals.
pub fn format_currency(amount: f64) -> String {
    let rounded = amount.round();
    let negative = rounded < 0.0;
    let digits = format!("{:.0}", rounded.abs());

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    if negative {
        format!("-₱{grouped}")
    } else {
        format!("₱{grouped}")
    }
}

pub fn build_summary_report(viewer: &str, window: SummaryWindow, report: &KpiReport) -> String {
    let mut output = String::new();
    let period = match window.mode {
        ReportMode::Mtd => format!("{} {}", month_name(window.month), window.year),
        ReportMode::Ytd => window.year.to_string(),
    };

    let _ = writeln!(output, "# Conversion Rate Summary");
    let _ = writeln!(output, "Generated for {} ({} {})", viewer, window.mode, period);
    let _ = writeln!(output);
    let _ = writeln!(
        output,
        "| Agent | {} | Target | Par | Average Daily Sales | Calls to Quote | Quote to SO | SO to SI |",
        if window.mode == ReportMode::Mtd { "Month" } else { "Year" }
    );
    let _ = writeln!(output, "|---|---|---|---|---|---|---|---|");

    let totals = &report.totals;
    let _ = writeln!(
        output,
        "| TOTAL / AVG | - | {} | - | {:.2} | {:.2}% | {:.2}% | {:.2}% |",
        format_currency(totals.target_quota),
        totals.average_daily_sales,
        totals.calls_to_quote,
        totals.quote_to_sales_order,
        totals.sales_order_to_invoice
    );

    if report.groups.is_empty() {
        let _ = writeln!(output);
        let _ = writeln!(output, "No accounts available");
        return output;
    }

    for group in report.groups.values() {
        let _ = writeln!(
            output,
            "| {} ({}) | {} | {} | {:.1}% | {:.2} | {:.2}% | {:.2}% | {:.2}% |",
            group.agent_name,
            group.reference_id,
            group.period_label,
            format_currency(group.target_quota),
            group.par_percentage,
            group.average_daily_sales,
            group.calls_to_quote(),
            group.quote_to_sales_order(),
            group.sales_order_to_invoice()
        );
    }

    output
}

pub fn build_activity_log(page: &LogPage) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "## Team Daily Activities");

    if page.rows.is_empty() {
        let _ = writeln!(output, "No activities match these filters.");
    } else {
        for row in &page.rows {
            let activity = &row.activity;
            let _ = writeln!(
                output,
                "- {} | {} | {} | {} | {} | SO {}",
                activity.date_created.format("%Y-%m-%d %H:%M"),
                row.agent_name,
                activity.companyname,
                activity.typeactivity,
                activity.activitystatus,
                format_currency(activity.soamount)
            );
        }
    }

    let _ = writeln!(output, "{} (page {} of {})", page.footer(), page.page, page.total_pages);
    output
}

pub fn build_ranking(day: chrono::NaiveDate, ranking: &[CallRanking]) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "## Team Daily Ranking for {}", day);

    if ranking.is_empty() {
        let _ = writeln!(output, "No calls logged on this day.");
        return output;
    }

    for row in ranking {
        let _ = writeln!(
            output,
            "{}. {} ({}): {} outbound, {} inbound, {} successful",
            row.rank,
            row.agent_name,
            row.reference_id,
            row.outbound_calls,
            row.inbound_calls,
            row.successful_calls
        );
    }
    output
}

pub fn build_notification_feed(
    due: &[NotificationRecord],
    directory: &AgentDirectory,
    now: DateTime<Utc>,
) -> String {
    let mut output = String::new();
    let unread = crate::notifications::unread_count(due);
    let _ = writeln!(
        output,
        "## Notifications ({} unread) as of {}",
        unread,
        now.format("%Y-%m-%d %H:%M UTC")
    );

    if due.is_empty() {
        let _ = writeln!(output, "Nothing due.");
        return output;
    }

    for record in due {
        let when = record
            .effective_date()
            .map(|date| date.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "-".to_string());
        let _ = writeln!(
            output,
            "- [{}] #{} {} | {} | {} | {}{}",
            record.status.label(),
            record.id,
            when,
            record.kind.label(),
            directory.name_of(&record.referenceid),
            record.companyname,
            record
                .message
                .as_deref()
                .map(|message| format!(" | {message}"))
                .unwrap_or_default()
        );
    }

    if let Some(inquiry) = crate::notifications::urgent_inquiry(due) {
        let _ = writeln!(output);
        let _ = writeln!(
            output,
            "Unread inquiry needs attention: #{} {}",
            inquiry.id, inquiry.companyname
        );
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kpi::summarize;
    use chrono::NaiveDate;

    #[test]
    fn currency_groups_thousands() {
        assert_eq!(format_currency(0.0), "₱0");
        assert_eq!(format_currency(999.4), "₱999");
        assert_eq!(format_currency(1_234_567.0), "₱1,234,567");
        assert_eq!(format_currency(-4500.0), "-₱4,500");
    }

    #[test]
    fn empty_summary_renders_totals_and_placeholder() {
        let window = SummaryWindow {
            mode: ReportMode::Mtd,
            month: 3,
            year: 2024,
        };
        let today = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        let report = summarize(&[], &AgentDirectory::default(), window, today);
        let text = build_summary_report("AB-NCR-000001", window, &report);

        assert!(text.contains("MTD March 2024"));
        assert!(text.contains("| TOTAL / AVG | - | ₱0 | - | 0.00 | 0.00% | 0.00% | 0.00% |"));
        assert!(text.contains("No accounts available"));
    }

    #[test]
    fn empty_ranking_says_so() {
        let day = NaiveDate::from_ymd_opt(2024, 7, 1).unwrap();
        assert!(build_ranking(day, &[]).contains("No calls logged"));
    }
}
