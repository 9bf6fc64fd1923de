use std::path::PathBuf;

use anyhow::Context;
use chrono::{Datelike, NaiveDate, Utc};
use clap::{ArgGroup, Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::{error, info, warn};

use taskflow_sales::activity_log::{self, ActivityFilter, DEFAULT_PER_PAGE};
use taskflow_sales::config::AppConfig;
use taskflow_sales::error::SalesError;
use taskflow_sales::kpi::{self, SummaryWindow};
use taskflow_sales::models::{ActivityRecord, AgentDirectory, ApiResponse, ReportMode, UserRecord};
use taskflow_sales::store::{JsonFileStore, PinnedAccounts};
use taskflow_sales::{db, notifications, poller, policy, ranking, report};

#[derive(Parser)]
#[command(name = "taskflow-sales")]
#[command(about = "Sales activity tracking, conversion summaries and notifications", long_about = None)]
struct Cli {
    /// Optional TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load realistic seed data
    Seed,
    /// Import activities from a CSV file for one agent
    Import {
        #[arg(long)]
        csv: PathBuf,
        #[arg(long)]
        referenceid: String,
        #[arg(long, default_value = "")]
        tsm: String,
        #[arg(long, default_value = "")]
        manager: String,
        #[arg(long, default_value_t = 0.0)]
        targetquota: f64,
    },
    /// Conversion rate summary (month-to-date or year-to-date)
    #[command(group(ArgGroup::new("period").args(["ytd", "month"]).multiple(false)))]
    Summary {
        #[arg(long)]
        user_id: Option<String>,
        #[arg(long)]
        ytd: bool,
        #[arg(long)]
        month: Option<u32>,
        #[arg(long)]
        year: Option<i32>,
        #[arg(long)]
        out: Option<PathBuf>,
        #[arg(long)]
        json: bool,
    },
    /// Team daily activity log
    Activities {
        #[arg(long)]
        user_id: Option<String>,
        #[arg(long, default_value = "")]
        search: String,
        #[arg(long)]
        client_type: Option<String>,
        #[arg(long)]
        start: Option<NaiveDate>,
        #[arg(long)]
        end: Option<NaiveDate>,
        #[arg(long, default_value_t = 1)]
        page: usize,
        #[arg(long, default_value_t = DEFAULT_PER_PAGE)]
        per_page: usize,
    },
    /// Daily call ranking of visible agents
    Ranking {
        #[arg(long)]
        user_id: Option<String>,
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Show due notifications, optionally polling until interrupted
    Notifications {
        #[arg(long)]
        user_id: Option<String>,
        #[arg(long)]
        watch: bool,
        #[arg(long)]
        json: bool,
    },
    /// Mark a notification as read
    Ack {
        #[arg(long)]
        id: i64,
    },
    /// Pin a company for quick access
    Pin {
        #[arg(long)]
        user_id: Option<String>,
        #[arg(long)]
        company: String,
    },
    /// Remove a pinned company
    Unpin {
        #[arg(long)]
        user_id: Option<String>,
        #[arg(long)]
        company: String,
    },
    /// List pinned companies
    Pins {
        #[arg(long)]
        user_id: Option<String>,
    },
    /// Territory sales associates visible to the user
    Users {
        #[arg(long)]
        user_id: Option<String>,
        #[arg(long, default_value = "")]
        search: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref())?;

    if let Err(e) = run(cli.command, &config).await {
        error!("{:#}", e);
        return Err(e);
    }
    Ok(())
}

async fn run(command: Commands, config: &AppConfig) -> anyhow::Result<()> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(config.database_url()?)
        .await
        .context("failed to connect to Postgres")?;

    match command {
        Commands::InitDb => {
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            db::seed(&pool).await?;
            println!("Seed data inserted.");
        }
        Commands::Import {
            csv,
            referenceid,
            tsm,
            manager,
            targetquota,
        } => {
            let owner = db::ImportOwner {
                referenceid,
                tsm,
                manager,
                targetquota,
            };
            let response = match db::import_csv(&pool, &csv, &owner).await {
                Ok(inserted) => ApiResponse::inserted(inserted),
                Err(e) => {
                    error!("Import from {} failed: {}", csv.display(), e);
                    ApiResponse::failure(format!("Import failed: {e}"))
                }
            };
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        Commands::Summary {
            user_id,
            ytd,
            month,
            year,
            out,
            json,
        } => {
            let viewer = load_viewer(&pool, user_id.as_deref()).await?;
            let today = Utc::now().date_naive();
            let window = SummaryWindow {
                mode: if ytd { ReportMode::Ytd } else { ReportMode::Mtd },
                month: month.unwrap_or_else(|| today.month()),
                year: year.unwrap_or_else(|| today.year()),
            };
            if !(1..=12).contains(&window.month) {
                return Err(SalesError::InvalidInput(format!("month {} is not 1-12", window.month)).into());
            }

            let (activities, directory) = load_visible_activities(&pool, &viewer).await?;
            let summary = kpi::summarize(&activities, &directory, window, today);
            info!(
                "Summarised {} groups for {} ({})",
                summary.groups.len(),
                viewer.reference_id,
                window.mode
            );

            let rendered = if json {
                serde_json::to_string_pretty(&ApiResponse::ok(&summary))?
            } else {
                report::build_summary_report(&viewer.reference_id, window, &summary)
            };
            match out {
                Some(path) => {
                    std::fs::write(&path, rendered)?;
                    println!("Report written to {}.", path.display());
                }
                None => println!("{rendered}"),
            }
        }
        Commands::Activities {
            user_id,
            search,
            client_type,
            start,
            end,
            page,
            per_page,
        } => {
            let viewer = load_viewer(&pool, user_id.as_deref()).await?;
            let (activities, directory) = load_visible_activities(&pool, &viewer).await?;
            let filter = ActivityFilter {
                search,
                client_type,
                start,
                end,
            };
            let log = activity_log::build_page(&activities, &directory, &filter, page, per_page);
            print!("{}", report::build_activity_log(&log));
        }
        Commands::Ranking { user_id, date } => {
            let viewer = load_viewer(&pool, user_id.as_deref()).await?;
            let day = date.unwrap_or_else(|| Utc::now().date_naive());
            let (activities, directory) = load_visible_activities(&pool, &viewer).await?;
            let ranking = ranking::daily_ranking(&activities, &directory, day);
            print!("{}", report::build_ranking(day, &ranking));
        }
        Commands::Notifications {
            user_id,
            watch,
            json,
        } => {
            let viewer = load_viewer(&pool, user_id.as_deref()).await?;
            let directory = AgentDirectory::from_users(&db::fetch_users(&pool).await?);
            if watch {
                watch_notifications(pool.clone(), viewer.reference_id, directory, config, json).await?;
            } else {
                refresh_notifications(&pool, &viewer.reference_id, &directory, json).await;
            }
        }
        Commands::Ack { id } => {
            let response: ApiResponse<()> = if db::mark_notification_read(&pool, id).await? {
                ApiResponse {
                    success: true,
                    data: None,
                    message: Some(format!("Notification {id} marked as read")),
                    inserted_count: None,
                }
            } else {
                warn!("Notification {} not found", id);
                ApiResponse::failure(format!("Notification {id} not found"))
            };
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        Commands::Pin { user_id, company } => {
            let viewer = load_viewer(&pool, user_id.as_deref()).await?;
            let mut pins = PinnedAccounts::new(JsonFileStore::open(&config.pin_store)?);
            let pinned = pins.pin(&viewer.reference_id, &company)?;
            println!("Pinned {} ({} pinned).", company, pinned.len());
        }
        Commands::Unpin { user_id, company } => {
            let viewer = load_viewer(&pool, user_id.as_deref()).await?;
            let mut pins = PinnedAccounts::new(JsonFileStore::open(&config.pin_store)?);
            let pinned = pins.unpin(&viewer.reference_id, &company)?;
            println!("Unpinned {} ({} pinned).", company, pinned.len());
        }
        Commands::Pins { user_id } => {
            let viewer = load_viewer(&pool, user_id.as_deref()).await?;
            let pins = PinnedAccounts::new(JsonFileStore::open(&config.pin_store)?);
            let pinned = pins.list(&viewer.reference_id)?;
            if pinned.is_empty() {
                println!("No pinned companies.");
            }
            for company in pinned {
                println!("- {company}");
            }
        }
        Commands::Users { user_id, search } => {
            let viewer = load_viewer(&pool, user_id.as_deref()).await?;
            let policy = policy::policy_for(&viewer);
            let needle = search.to_lowercase();
            let users = db::fetch_users(&pool).await?;
            let visible: Vec<&UserRecord> = users
                .iter()
                .filter(|user| policy.sees_user(user))
                .filter(|user| {
                    [&user.firstname, &user.lastname, &user.tsm, &user.reference_id]
                        .iter()
                        .any(|field| field.to_lowercase().contains(&needle))
                })
                .collect();

            if visible.is_empty() {
                println!("No users visible for {}.", viewer.role());
            }
            for user in visible {
                println!(
                    "- {} ({}) {} | TSM {} | target {}",
                    user.full_name(),
                    user.reference_id,
                    user.role,
                    if user.tsm.is_empty() { "-" } else { user.tsm.as_str() },
                    report::format_currency(user.target_quota)
                );
            }
        }
    }

    Ok(())
}

async fn load_viewer(pool: &PgPool, user_id: Option<&str>) -> anyhow::Result<UserRecord> {
    let user_id = user_id.ok_or(SalesError::MissingUserId)?;
    let viewer = db::fetch_user(pool, user_id).await?;
    info!("Loaded {} as {}", viewer.reference_id, viewer.role());
    Ok(viewer)
}

async fn load_visible_activities(
    pool: &PgPool,
    viewer: &UserRecord,
) -> anyhow::Result<(Vec<ActivityRecord>, AgentDirectory)> {
    let users = db::fetch_users(pool).await.context("Error fetching users")?;
    let activities = db::fetch_activities(pool)
        .await
        .context("Error fetching activities")?;

    let policy = policy::policy_for(viewer);
    let visible = policy::visible_activities(policy.as_ref(), &activities)
        .into_iter()
        .cloned()
        .collect();
    Ok((visible, AgentDirectory::from_users(&users)))
}

async fn refresh_notifications(pool: &PgPool, viewer: &str, directory: &AgentDirectory, json: bool) {
    let records = match db::fetch_notifications(pool, viewer).await {
        Ok(records) => records,
        Err(e) => {
            error!("Error fetching notifications: {}", e);
            eprintln!("Could not load notifications.");
            return;
        }
    };

    let now = Utc::now();
    let due = notifications::eligible(&records, viewer, now);
    if json {
        match serde_json::to_string_pretty(&ApiResponse::ok(&due)) {
            Ok(body) => println!("{body}"),
            Err(e) => error!("Error encoding notifications: {}", e),
        }
    } else {
        print!("{}", report::build_notification_feed(&due, directory, now));
    }
}

async fn watch_notifications(
    pool: PgPool,
    viewer: String,
    directory: AgentDirectory,
    config: &AppConfig,
    json: bool,
) -> anyhow::Result<()> {
    let period = config.poll_interval();
    info!("Polling notifications for {} every {:?}", viewer, period);

    let handle = poller::spawn(period, move || {
        let pool = pool.clone();
        let viewer = viewer.clone();
        let directory = directory.clone();
        async move {
            refresh_notifications(&pool, &viewer, &directory, json).await;
        }
    });

    tokio::signal::ctrl_c().await?;
    info!("Received Ctrl+C, stopping notification poll");
    handle.stop().await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_rejects_month_in_ytd_mode() {
        assert!(Cli::try_parse_from(["taskflow-sales", "summary", "--ytd", "--month", "3"]).is_err());
        assert!(Cli::try_parse_from(["taskflow-sales", "summary", "--month", "3"]).is_ok());
        assert!(Cli::try_parse_from(["taskflow-sales", "summary", "--ytd", "--year", "2024"]).is_ok());
    }
}
