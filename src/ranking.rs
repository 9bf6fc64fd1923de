use std::collections::HashMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::models::{ActivityRecord, AgentDirectory};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CallRanking {
    pub rank: usize,
    pub agent_name: String,
    pub reference_id: String,
    pub outbound_calls: u32,
    pub inbound_calls: u32,
    pub successful_calls: u32,
}

/// Ranks agents by call volume and outcome on a single day.
pub fn daily_ranking<'a>(
    activities: impl IntoIterator<Item = &'a ActivityRecord>,
    directory: &AgentDirectory,
    day: NaiveDate,
) -> Vec<CallRanking> {
    let mut tallies: HashMap<String, (u32, u32, u32)> = HashMap::new();

    for activity in activities {
        if activity.date_created.date_naive() != day {
            continue;
        }
        let entry = tallies.entry(activity.referenceid.clone()).or_insert((0, 0, 0));
        if activity.source.starts_with("Outbound") {
            entry.0 += 1;
        }
        if activity.source.starts_with("Inbound") {
            entry.1 += 1;
        }
        if activity.callstatus.as_deref() == Some("Successful") {
            entry.2 += 1;
        }
    }

    let mut rows: Vec<CallRanking> = tallies
        .into_iter()
        .map(|(reference_id, (outbound, inbound, successful))| CallRanking {
            rank: 0,
            agent_name: directory.name_of(&reference_id),
            reference_id,
            outbound_calls: outbound,
            inbound_calls: inbound,
            successful_calls: successful,
        })
        .collect();

    rows.sort_by(|a, b| {
        b.outbound_calls
            .cmp(&a.outbound_calls)
            .then(b.inbound_calls.cmp(&a.inbound_calls))
            .then(b.successful_calls.cmp(&a.successful_calls))
            .then(a.agent_name.cmp(&b.agent_name))
    });
    for (index, row) in rows.iter_mut().enumerate() {
        row.rank = index + 1;
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserRecord;
    use chrono::{TimeZone, Utc};

    fn call(agent: &str, source: &str, status: Option<&str>, day: u32) -> ActivityRecord {
        ActivityRecord {
            id: 0,
            companyname: "Acme".to_string(),
            contactperson: String::new(),
            referenceid: agent.to_string(),
            manager: String::new(),
            tsm: String::new(),
            typeclient: String::new(),
            typeactivity: String::new(),
            activitystatus: String::new(),
            source: source.to_string(),
            date_created: Utc.with_ymd_and_hms(2024, 7, day, 10, 0, 0).unwrap(),
            soamount: 0.0,
            actualsales: 0.0,
            targetquota: 0.0,
            activitynumber: None,
            callstatus: status.map(str::to_string),
        }
    }

    fn directory() -> AgentDirectory {
        let make = |reference_id: &str, first: &str| UserRecord {
            id: reference_id.to_string(),
            reference_id: reference_id.to_string(),
            firstname: first.to_string(),
            lastname: "Santos".to_string(),
            email: String::new(),
            role: "Territory Sales Associate".to_string(),
            department: "Sales".to_string(),
            company: String::new(),
            tsm: String::new(),
            manager: String::new(),
            target_quota: 0.0,
        };
        AgentDirectory::from_users(&[make("A", "Ana"), make("B", "Ben")])
    }

    #[test]
    fn ranks_by_outbound_then_inbound() {
        let calls = vec![
            call("A", "Outbound - Touchbase", Some("Successful"), 1),
            call("B", "Outbound - Touchbase", None, 1),
            call("B", "Outbound - Follow-up", None, 1),
            call("A", "Inbound - Call", Some("Successful"), 1),
            call("A", "Outbound - Touchbase", None, 2),
        ];
        let day = NaiveDate::from_ymd_opt(2024, 7, 1).unwrap();
        let ranking = daily_ranking(&calls, &directory(), day);

        assert_eq!(ranking.len(), 2);
        assert_eq!(ranking[0].agent_name, "Ben Santos");
        assert_eq!(ranking[0].outbound_calls, 2);
        assert_eq!(ranking[1].rank, 2);
        assert_eq!(ranking[1].inbound_calls, 1);
        assert_eq!(ranking[1].successful_calls, 2);
    }

    #[test]
    fn empty_day_has_no_rows() {
        let calls = vec![call("A", "Outbound - Touchbase", None, 2)];
        let day = NaiveDate::from_ymd_opt(2024, 7, 1).unwrap();
        assert!(daily_ranking(&calls, &directory(), day).is_empty());
    }
}
