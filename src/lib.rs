pub mod activity_log;
pub mod config;
pub mod db;
pub mod error;
pub mod kpi;
pub mod models;
pub mod notifications;
pub mod poller;
pub mod policy;
pub mod ranking;
pub mod report;
pub mod store;
