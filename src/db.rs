use chrono::{DateTime, Duration, NaiveDate, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{Result, SalesError};
use crate::models::{
    ActivityRecord, NotificationKind, NotificationRecord, NotificationStatus, UserRecord,
};

pub async fn init_db(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

pub async fn seed(pool: &PgPool) -> Result<()> {
    let users = vec![
        ("6650f0a1c2", "MD-NCR-000001", "Marco", "Dela Cruz", "marco.delacruz@taskflow.ph", "Manager", "", "", 0.0),
        ("6650f0a1c3", "VM-NCR-000002", "Vina", "Mendoza", "vina.mendoza@taskflow.ph", "Territory Sales Manager", "", "MD-NCR-000001", 0.0),
        ("6650f0a1c4", "AB-NCR-000001", "Ana", "Bautista", "ana.bautista@taskflow.ph", "Territory Sales Associate", "VM-NCR-000002", "MD-NCR-000001", 450_000.0),
        ("6650f0a1c5", "JR-NCR-000003", "Jomar", "Ramos", "jomar.ramos@taskflow.ph", "Territory Sales Associate", "VM-NCR-000002", "MD-NCR-000001", 380_000.0),
    ];

    for (id, reference_id, first, last, email, role, tsm, manager, quota) in users {
        sqlx::query(
            r#"
            INSERT INTO taskflow.users
            (id, reference_id, firstname, lastname, email, role, department, company, tsm, manager, target_quota)
            VALUES ($1, $2, $3, $4, $5, $6, 'Sales', 'Taskflow', $7, $8, $9)
            ON CONFLICT (reference_id) DO UPDATE
            SET firstname = EXCLUDED.firstname, lastname = EXCLUDED.lastname,
                role = EXCLUDED.role, tsm = EXCLUDED.tsm, manager = EXCLUDED.manager,
                target_quota = EXCLUDED.target_quota
            "#,
        )
        .bind(id)
        .bind(reference_id)
        .bind(first)
        .bind(last)
        .bind(email)
        .bind(role)
        .bind(tsm)
        .bind(manager)
        .bind(quota)
        .execute(pool)
        .await?;
    }

    let now = Utc::now();
    let activities = vec![
        ("seed-act-001", "AB-NCR-000001", "Acme Lighting Corp", "Quotation Preparation", "Ongoing", "Outbound - Touchbase", Some("Successful"), 2, 0.0, 0.0),
        ("seed-act-002", "AB-NCR-000001", "Acme Lighting Corp", "Sales Order Preparation", "Ongoing", "Outbound - Follow-up", None, 1, 125_000.0, 0.0),
        ("seed-act-003", "AB-NCR-000001", "Bright Electrical Supply", "Sales Order Preparation", "Delivered", "Inbound - Call", Some("Successful"), 0, 88_500.0, 88_500.0),
        ("seed-act-004", "JR-NCR-000003", "Cobalt Builders", "Quotation Preparation", "Ongoing", "Outbound - Touchbase", Some("Unsuccessful"), 0, 0.0, 0.0),
        ("seed-act-005", "JR-NCR-000003", "Cobalt Builders", "Follow Up", "Cancelled", "Outbound - Touchbase", None, 3, 0.0, 0.0),
    ];

    for (number, agent, company, typeactivity, status, source, callstatus, days_ago, so, actual) in activities {
        let quota = if agent == "AB-NCR-000001" { 450_000.0 } else { 380_000.0 };
        sqlx::query(
            r#"
            INSERT INTO taskflow.activities
            (activitynumber, companyname, contactperson, referenceid, manager, tsm, typeclient,
             typeactivity, activitystatus, source, callstatus, date_created, soamount, actualsales, targetquota)
            VALUES ($1, $2, 'Purchasing Head', $3, 'MD-NCR-000001', 'VM-NCR-000002', 'Top 50',
                    $4, $5, $6, $7, $8, $9, $10, $11)
            ON CONFLICT (activitynumber) DO NOTHING
            "#,
        )
        .bind(number)
        .bind(company)
        .bind(agent)
        .bind(typeactivity)
        .bind(status)
        .bind(source)
        .bind(callstatus)
        .bind(now - Duration::days(days_ago))
        .bind(so)
        .bind(actual)
        .bind(quota)
        .execute(pool)
        .await?;
    }

    let notifications = vec![
        ("seed-ntf-001", "Callback Notification", "Acme Lighting Corp", None, Some(now), 3),
        ("seed-ntf-002", "Inquiry Notification", "Bright Electrical Supply", Some("New inquiry from website"), None, 0),
        ("seed-ntf-003", "Follow-Up Notification", "Cobalt Builders", Some("Ringing Only"), None, 12),
    ];

    for (key, kind, company, message, callback, days_ago) in notifications {
        sqlx::query(
            r#"
            INSERT INTO taskflow.notifications
            (source_key, type, referenceid, tsm, companyname, date_created, callback, message, status)
            VALUES ($1, $2, 'AB-NCR-000001', 'VM-NCR-000002', $3, $4, $5, $6, 'Unread')
            ON CONFLICT (source_key) DO NOTHING
            "#,
        )
        .bind(key)
        .bind(kind)
        .bind(company)
        .bind(now - Duration::days(days_ago))
        .bind(callback)
        .bind(message)
        .execute(pool)
        .await?;
    }

    info!("Seed data ready");
    Ok(())
}

const USER_COLUMNS: &str = "id, reference_id, firstname, lastname, email, role, department, \
     company, tsm, manager, target_quota";

fn user_from_row(row: &PgRow) -> UserRecord {
    UserRecord {
        id: row.get("id"),
        reference_id: row.get("reference_id"),
        firstname: row.get("firstname"),
        lastname: row.get("lastname"),
        email: row.get("email"),
        role: row.get("role"),
        department: row.get("department"),
        company: row.get("company"),
        tsm: row.get("tsm"),
        manager: row.get("manager"),
        target_quota: row.get("target_quota"),
    }
}

pub async fn fetch_user(pool: &PgPool, user_id: &str) -> Result<UserRecord> {
    if user_id.trim().is_empty() {
        return Err(SalesError::MissingUserId);
    }

    let query = format!("SELECT {USER_COLUMNS} FROM taskflow.users WHERE id = $1");
    let row = sqlx::query(&query)
        .bind(user_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| SalesError::UserNotFound(user_id.to_string()))?;

    Ok(user_from_row(&row))
}

pub async fn fetch_users(pool: &PgPool) -> Result<Vec<UserRecord>> {
    let query = format!("SELECT {USER_COLUMNS} FROM taskflow.users ORDER BY lastname, firstname");
    let rows = sqlx::query(&query).fetch_all(pool).await?;
    debug!("Fetched {} users", rows.len());
    Ok(rows.iter().map(user_from_row).collect())
}

pub async fn fetch_activities(pool: &PgPool) -> Result<Vec<ActivityRecord>> {
    let rows = sqlx::query(
        "SELECT id, companyname, contactperson, referenceid, manager, tsm, typeclient, \
         typeactivity, activitystatus, source, date_created, soamount, actualsales, \
         targetquota, activitynumber, callstatus \
         FROM taskflow.activities",
    )
    .fetch_all(pool)
    .await?;

    let activities: Vec<ActivityRecord> = rows
        .iter()
        .map(|row| ActivityRecord {
            id: row.get("id"),
            companyname: row.get("companyname"),
            contactperson: row.get("contactperson"),
            referenceid: row.get("referenceid"),
            manager: row.get("manager"),
            tsm: row.get("tsm"),
            typeclient: row.get("typeclient"),
            typeactivity: row.get("typeactivity"),
            activitystatus: row.get("activitystatus"),
            source: row.get("source"),
            date_created: row.get("date_created"),
            soamount: row.get("soamount"),
            actualsales: row.get("actualsales"),
            targetquota: row.get("targetquota"),
            activitynumber: row.get("activitynumber"),
            callstatus: row.get("callstatus"),
        })
        .collect();

    debug!("Fetched {} activities", activities.len());
    Ok(activities)
}

pub async fn fetch_notifications(
    pool: &PgPool,
    reference_id: &str,
) -> Result<Vec<NotificationRecord>> {
    let rows = sqlx::query(
        "SELECT id, type, referenceid, tsm, companyname, date_created, callback, message, status \
         FROM taskflow.notifications \
         WHERE referenceid = $1 OR tsm = $1",
    )
    .bind(reference_id)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .iter()
        .map(|row| {
            let kind: String = row.get("type");
            let status: String = row.get("status");
            NotificationRecord {
                id: row.get("id"),
                kind: NotificationKind::from_label(&kind),
                referenceid: row.get("referenceid"),
                tsm: row.get("tsm"),
                companyname: row.get("companyname"),
                date_created: row.get("date_created"),
                callback: row.get("callback"),
                message: row.get("message"),
                status: NotificationStatus::from_label(&status),
            }
        })
        .collect())
}

pub async fn mark_notification_read(pool: &PgPool, id: i64) -> Result<bool> {
    let result = sqlx::query("UPDATE taskflow.notifications SET status = $1 WHERE id = $2")
        .bind(NotificationStatus::Read.label())
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Owner fields stamped onto every imported row.
#[derive(Debug, Clone)]
pub struct ImportOwner {
    pub referenceid: String,
    pub tsm: String,
    pub manager: String,
    pub targetquota: f64,
}

#[derive(Debug, serde::Deserialize)]
struct CsvRow {
    companyname: String,
    #[serde(default)]
    contactperson: String,
    #[serde(default)]
    typeclient: String,
    #[serde(default)]
    typeactivity: String,
    #[serde(default)]
    activitystatus: String,
    #[serde(default)]
    source: String,
    date_created: String,
    #[serde(default)]
    soamount: Option<f64>,
    #[serde(default)]
    actualsales: Option<f64>,
    #[serde(default)]
    activitynumber: Option<String>,
    #[serde(default)]
    callstatus: Option<String>,
}

/// Accepts RFC 3339 timestamps or bare `YYYY-MM-DD` dates (midnight UTC).
pub fn parse_created(raw: &str) -> Result<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(raw) {
        return Ok(timestamp.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| SalesError::InvalidInput(format!("unrecognised date_created {raw:?}")))
}

/// A CSV row validated and ready to insert.
#[derive(Debug, Clone)]
pub struct ImportRow {
    pub activitynumber: String,
    pub companyname: String,
    pub contactperson: String,
    pub typeclient: String,
    pub typeactivity: String,
    pub activitystatus: String,
    pub source: String,
    pub callstatus: Option<String>,
    pub date_created: DateTime<Utc>,
    pub soamount: f64,
    pub actualsales: f64,
}

/// Decodes and validates every row; any bad row fails the whole file.
pub fn read_import_rows<R: std::io::Read>(input: R) -> Result<Vec<ImportRow>> {
    let mut reader = csv::Reader::from_reader(input);
    let mut rows = Vec::new();

    for (index, result) in reader.deserialize::<CsvRow>().enumerate() {
        let row = result?;
        let date_created = parse_created(&row.date_created).map_err(|e| {
            SalesError::InvalidInput(format!("row {}: {}", index + 1, e))
        })?;
        let activitynumber = row
            .activitynumber
            .filter(|number| !number.trim().is_empty())
            .unwrap_or_else(|| format!("import-{}", Uuid::new_v4()));

        rows.push(ImportRow {
            activitynumber,
            companyname: row.companyname,
            contactperson: row.contactperson,
            typeclient: row.typeclient,
            typeactivity: row.typeactivity,
            activitystatus: row.activitystatus,
            source: row.source,
            callstatus: row.callstatus,
            date_created,
            soamount: row.soamount.unwrap_or(0.0),
            actualsales: row.actualsales.unwrap_or(0.0),
        });
    }

    Ok(rows)
}

/// Imports the file in one transaction, so a failed import inserts nothing.
pub async fn import_csv(
    pool: &PgPool,
    csv_path: &std::path::Path,
    owner: &ImportOwner,
) -> Result<usize> {
    let rows = read_import_rows(std::fs::File::open(csv_path)?)?;
    let mut tx = pool.begin().await?;
    let mut inserted = 0usize;

    for row in &rows {
        let result = sqlx::query(
            r#"
            INSERT INTO taskflow.activities
            (activitynumber, companyname, contactperson, referenceid, manager, tsm, typeclient,
             typeactivity, activitystatus, source, callstatus, date_created, soamount, actualsales, targetquota)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            ON CONFLICT (activitynumber) DO NOTHING
            "#,
        )
        .bind(&row.activitynumber)
        .bind(&row.companyname)
        .bind(&row.contactperson)
        .bind(&owner.referenceid)
        .bind(&owner.manager)
        .bind(&owner.tsm)
        .bind(&row.typeclient)
        .bind(&row.typeactivity)
        .bind(&row.activitystatus)
        .bind(&row.source)
        .bind(&row.callstatus)
        .bind(row.date_created)
        .bind(row.soamount)
        .bind(row.actualsales)
        .bind(owner.targetquota)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() > 0 {
            inserted += 1;
        }
    }

    tx.commit().await?;
    info!("Imported {} of {} activities from {:?}", inserted, rows.len(), csv_path);
    Ok(inserted)
}
