use chrono::{DateTime, Duration, Months, Utc};

use crate::models::{NotificationKind, NotificationRecord, NotificationStatus};

/// Delay applied to a follow-up before it becomes due.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowUpDelay {
    Days(i64),
    Minutes(i64),
}

impl FollowUpDelay {
    fn duration(self) -> Duration {
        match self {
            FollowUpDelay::Days(days) => Duration::days(days),
            FollowUpDelay::Minutes(minutes) => Duration::minutes(minutes),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FollowUpRule {
    pub needle: &'static str,
    pub delay: FollowUpDelay,
    /// Months after creation past which the follow-up is dropped entirely.
    pub expires_after_months: Option<u32>,
}

/// Checked top to bottom; the first needle found in the message wins.
pub const FOLLOW_UP_RULES: &[FollowUpRule] = &[
    FollowUpRule {
        needle: "Ringing Only",
        delay: FollowUpDelay::Days(10),
        expires_after_months: None,
    },
    FollowUpRule {
        needle: "No Requirements",
        delay: FollowUpDelay::Days(15),
        expires_after_months: None,
    },
    FollowUpRule {
        needle: "Cannot Be Reached",
        delay: FollowUpDelay::Days(3),
        expires_after_months: None,
    },
    FollowUpRule {
        needle: "Not Connected With The Company",
        delay: FollowUpDelay::Minutes(15),
        expires_after_months: None,
    },
    FollowUpRule {
        needle: "With SPFS",
        delay: FollowUpDelay::Days(7),
        expires_after_months: Some(2),
    },
    FollowUpRule {
        needle: "Sent Quotation - Standard",
        delay: FollowUpDelay::Days(1),
        expires_after_months: None,
    },
    FollowUpRule {
        needle: "Sent Quotation - With Special Price",
        delay: FollowUpDelay::Days(1),
        expires_after_months: None,
    },
    FollowUpRule {
        needle: "Sent Quotation - With SPF",
        delay: FollowUpDelay::Days(5),
        expires_after_months: None,
    },
    FollowUpRule {
        needle: "Waiting for Projects",
        delay: FollowUpDelay::Days(30),
        expires_after_months: None,
    },
];

pub fn follow_up_rule(message: &str) -> Option<&'static FollowUpRule> {
    FOLLOW_UP_RULES.iter().find(|rule| message.contains(rule.needle))
}

/// Decides whether a single notification is due for `viewer` at `now`.
pub fn is_eligible(record: &NotificationRecord, viewer: &str, now: DateTime<Utc>) -> bool {
    let today = now.date_naive();
    match record.kind {
        NotificationKind::Callback => match record.callback {
            Some(callback) if record.referenceid == viewer => callback.date_naive() <= today,
            _ => false,
        },
        NotificationKind::Inquiry => match record.date_created {
            Some(created) if addressed_to(record, viewer) => created.date_naive() <= today,
            _ => false,
        },
        NotificationKind::FollowUp => match record.date_created {
            Some(created) if addressed_to(record, viewer) => follow_up_due(record, created, now),
            _ => false,
        },
        NotificationKind::Other(_) => false,
    }
}

fn addressed_to(record: &NotificationRecord, viewer: &str) -> bool {
    record.referenceid == viewer || record.tsm == viewer
}

fn follow_up_due(record: &NotificationRecord, created: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    let message = record.message.as_deref().unwrap_or_default();
    let Some(rule) = follow_up_rule(message) else {
        return now >= created;
    };

    if let Some(months) = rule.expires_after_months {
        match created.checked_add_months(Months::new(months)) {
            Some(valid_until) if now > valid_until => return false,
            Some(_) => {}
            None => return false,
        }
    }

    now >= created + rule.delay.duration()
}

/// Returns the due notifications, newest effective date first.
///
/// The sort is stable, so records sharing an effective date keep their fetch order.
pub fn eligible(
    records: &[NotificationRecord],
    viewer: &str,
    now: DateTime<Utc>,
) -> Vec<NotificationRecord> {
    let mut due: Vec<NotificationRecord> = records
        .iter()
        .filter(|record| is_eligible(record, viewer, now))
        .cloned()
        .collect();
    due.sort_by(|a, b| b.effective_date().cmp(&a.effective_date()));
    due
}

pub fn unread_count(due: &[NotificationRecord]) -> usize {
    due.iter()
        .filter(|record| record.status == NotificationStatus::Unread)
        .count()
}

/// The inquiry that should be surfaced immediately, if any.
pub fn urgent_inquiry(due: &[NotificationRecord]) -> Option<&NotificationRecord> {
    due.iter().find(|record| {
        record.kind == NotificationKind::Inquiry && record.status == NotificationStatus::Unread
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const VIEWER: &str = "AB-NCR-000001";

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 15, 9, 30, 0).unwrap()
    }

    fn notification(kind: NotificationKind) -> NotificationRecord {
        NotificationRecord {
            id: 1,
            kind,
            referenceid: VIEWER.to_string(),
            tsm: "TSM-01".to_string(),
            companyname: "Acme Lighting".to_string(),
            date_created: None,
            callback: None,
            message: None,
            status: NotificationStatus::Unread,
        }
    }

    fn follow_up(message: &str, created: DateTime<Utc>) -> NotificationRecord {
        let mut record = notification(NotificationKind::FollowUp);
        record.message = Some(message.to_string());
        record.date_created = Some(created);
        record
    }

    #[test]
    fn callback_due_today_but_not_tomorrow() {
        let mut today = notification(NotificationKind::Callback);
        today.callback = Some(Utc.with_ymd_and_hms(2024, 3, 15, 23, 0, 0).unwrap());
        assert!(is_eligible(&today, VIEWER, now()));

        let mut tomorrow = notification(NotificationKind::Callback);
        tomorrow.callback = Some(Utc.with_ymd_and_hms(2024, 3, 16, 0, 0, 0).unwrap());
        assert!(!is_eligible(&tomorrow, VIEWER, now()));
    }

    #[test]
    fn callback_only_reaches_its_agent() {
        let mut record = notification(NotificationKind::Callback);
        record.callback = Some(now());
        assert!(!is_eligible(&record, "TSM-01", now()));
    }

    #[test]
    fn inquiry_reaches_agent_or_tsm() {
        let mut record = notification(NotificationKind::Inquiry);
        record.date_created = Some(now() - Duration::hours(2));
        assert!(is_eligible(&record, VIEWER, now()));
        assert!(is_eligible(&record, "TSM-01", now()));
        assert!(!is_eligible(&record, "someone-else", now()));
    }

    #[test]
    fn ringing_only_waits_exactly_ten_days() {
        let nine = follow_up("Ringing Only", now() - Duration::days(9));
        let ten = follow_up("Ringing Only", now() - Duration::days(10));
        assert!(!is_eligible(&nine, VIEWER, now()));
        assert!(is_eligible(&ten, VIEWER, now()));
    }

    #[test]
    fn not_connected_waits_fifteen_minutes() {
        let message = "Call result: Not Connected With The Company";
        assert!(!is_eligible(&follow_up(message, now() - Duration::minutes(14)), VIEWER, now()));
        assert!(is_eligible(&follow_up(message, now() - Duration::minutes(15)), VIEWER, now()));
    }

    #[test]
    fn with_spfs_expires_after_two_months() {
        let fresh = follow_up("With SPFS", now() - Duration::days(8));
        assert!(is_eligible(&fresh, VIEWER, now()));

        let stale = follow_up("With SPFS", Utc.with_ymd_and_hms(2024, 1, 14, 9, 0, 0).unwrap());
        assert!(!is_eligible(&stale, VIEWER, now()));
    }

    #[test]
    fn first_matching_rule_wins() {
        assert_eq!(
            follow_up_rule("Sent Quotation - With SPFS").map(|rule| rule.needle),
            Some("With SPFS")
        );
        assert_eq!(
            follow_up_rule("Sent Quotation - With SPF").map(|rule| rule.delay),
            Some(FollowUpDelay::Days(5))
        );
        assert!(follow_up_rule("Left a voicemail").is_none());
    }

    #[test]
    fn unmatched_follow_up_is_due_immediately() {
        let record = follow_up("Left a voicemail", now());
        assert!(is_eligible(&record, VIEWER, now()));
    }

    #[test]
    fn eligible_sorts_newest_effective_date_first() {
        let mut callback = notification(NotificationKind::Callback);
        callback.id = 1;
        callback.date_created = Some(now() - Duration::days(30));
        callback.callback = Some(now() - Duration::days(1));

        let mut inquiry = notification(NotificationKind::Inquiry);
        inquiry.id = 2;
        inquiry.date_created = Some(now() - Duration::hours(1));

        let mut old = follow_up("Waiting for Projects", now() - Duration::days(40));
        old.id = 3;

        let mut unknown = notification(NotificationKind::Other("Taskflow Notification".into()));
        unknown.id = 4;
        unknown.date_created = Some(now());

        let due = eligible(&[old, callback, unknown, inquiry], VIEWER, now());
        let ids: Vec<i64> = due.iter().map(|record| record.id).collect();
        assert_eq!(ids, vec![2, 1, 3]);
    }

    #[test]
    fn urgent_inquiry_must_be_unread() {
        let mut read = notification(NotificationKind::Inquiry);
        read.status = NotificationStatus::Read;
        let mut unread = notification(NotificationKind::Inquiry);
        unread.id = 9;
        let callback = notification(NotificationKind::Callback);

        let due = vec![callback, read, unread];
        assert_eq!(urgent_inquiry(&due).map(|record| record.id), Some(9));
        assert_eq!(unread_count(&due), 2);
    }
}
