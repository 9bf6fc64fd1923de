use chrono::NaiveDate;

use crate::models::{ActivityRecord, AgentDirectory};

pub const DEFAULT_PER_PAGE: usize = 12;

#[derive(Debug, Clone, Default)]
pub struct ActivityFilter {
    pub search: String,
    pub client_type: Option<String>,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl ActivityFilter {
    pub fn matches(&self, activity: &ActivityRecord) -> bool {
        let needle = self.search.to_lowercase();
        let matches_search = activity.companyname.to_lowercase().contains(&needle)
            || activity.activitystatus.to_lowercase().contains(&needle);

        let date = activity.date_created.date_naive();
        let within_range = self.start.map_or(true, |start| date >= start)
            && self.end.map_or(true, |end| date <= end);

        let matches_client = self
            .client_type
            .as_deref()
            .map_or(true, |client_type| activity.typeclient == client_type);

        matches_search && within_range && matches_client
    }
}

#[derive(Debug, Clone)]
pub struct LogRow {
    pub agent_name: String,
    pub activity: ActivityRecord,
}

#[derive(Debug, Clone)]
pub struct LogPage {
    pub rows: Vec<LogRow>,
    pub page: usize,
    pub total_pages: usize,
    pub total_entries: usize,
    pub first_index: usize,
    pub last_index: usize,
}

impl LogPage {
    pub fn footer(&self) -> String {
        format!(
            "Showing {} to {} of {} entries",
            self.first_index, self.last_index, self.total_entries
        )
    }
}

/// Filters, joins agent names, sorts newest first, and slices out one page.
pub fn build_page<'a>(
    activities: impl IntoIterator<Item = &'a ActivityRecord>,
    directory: &AgentDirectory,
    filter: &ActivityFilter,
    page: usize,
    per_page: usize,
) -> LogPage {
    let mut rows: Vec<LogRow> = activities
        .into_iter()
        .filter(|activity| filter.matches(activity))
        .map(|activity| LogRow {
            agent_name: directory.name_of(&activity.referenceid),
            activity: activity.clone(),
        })
        .collect();
    rows.sort_by(|a, b| b.activity.date_created.cmp(&a.activity.date_created));

    let per_page = per_page.max(1);
    let page = page.max(1);
    let total_entries = rows.len();
    let total_pages = total_entries.div_ceil(per_page);
    let start = (page - 1).saturating_mul(per_page).min(total_entries);
    let end = start.saturating_add(per_page).min(total_entries);

    LogPage {
        rows: rows.drain(start..end).collect(),
        page,
        total_pages,
        total_entries,
        first_index: if total_entries == 0 { 0 } else { start + 1 },
        last_index: end,
    }
}
