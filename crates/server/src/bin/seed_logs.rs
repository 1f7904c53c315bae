//! Generate mock log entries for local testing of the UI.
//!
//! Entries go through the same store insert path as `POST /log`.
//!
//! Usage:
//!   cargo run --bin seed_logs -- --count 5000 --days 60
//!   cargo run --bin seed_logs -- --db /tmp/loglens.sqlite

use std::{collections::BTreeMap, env, path::PathBuf};

use anyhow::{Context, bail};
use chrono::{Duration, Utc};
use db::{AttributeValue, CreateLogEntry, LogStore, models::severity::KNOWN_SEVERITIES};
use rand::{Rng, seq::IndexedRandom};
use tracing::info;
use tracing_subscriber::EnvFilter;
use utils::assets::database_path;
use uuid::Uuid;

const DEFAULT_COUNT: usize = 100;
const DEFAULT_DAYS: i64 = 30;
const PROGRESS_EVERY: usize = 1000;

const MESSAGES: &[&str] = &[
    "User authentication successful",
    "Database connection established",
    "Request processing completed",
    "Cache miss for key",
    "API rate limit exceeded",
    "File upload completed successfully",
    "Payment processing initiated",
    "Email notification sent",
    "Background job started",
    "Configuration loaded",
    "Health check passed",
    "Metrics collection updated",
    "Session expired for user",
    "Connection timeout occurred",
    "Invalid request format",
    "Resource not found",
    "Permission denied",
    "Service unavailable",
    "Internal server error",
    "Data validation failed",
];

const SERVICES: &[&str] = &[
    "auth-service",
    "user-service",
    "payment-service",
    "notification-service",
];

const HOSTS: &[&str] = &["web-01", "web-02", "worker-01", "worker-02"];

const ATTRIBUTES: &[(&str, &[&str])] = &[
    ("http.method", &["GET", "POST", "PUT", "DELETE", "PATCH"]),
    ("user.id", &["user-123", "user-456", "user-789", "user-101"]),
    ("request.id", &[]),
    ("database.name", &["users", "orders", "products", "sessions"]),
    (
        "error.type",
        &["ValidationError", "ConnectionError", "TimeoutError", "AuthError"],
    ),
    ("environment", &["development", "staging", "production"]),
    ("region", &["us-east-1", "us-west-2", "eu-west-1", "ap-southeast-1"]),
];

const STATUS_CODES: &[i64] = &[200, 201, 400, 401, 403, 404, 500, 503];

fn print_usage() {
    println!("Generate mock logs for loglens");
    println!();
    println!("Usage:");
    println!("  cargo run --bin seed_logs -- [options]");
    println!();
    println!("Options:");
    println!("  --db <path>     Database file (default: LOGLENS_DATABASE_PATH or data dir)");
    println!("  --count <n>     Number of logs to generate (default: {DEFAULT_COUNT})");
    println!("  --days <n>      Spread timestamps over the last n days (default: {DEFAULT_DAYS})");
    println!("  --help          Show this help");
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|pos| args.get(pos + 1))
        .map(String::as_str)
}

fn short_id() -> String {
    Uuid::new_v4().simple().to_string()[..8].to_string()
}

fn random_entry(rng: &mut impl Rng, days: i64) -> CreateLogEntry {
    let (severity_text, severity_number) =
        KNOWN_SEVERITIES[rng.random_range(0..KNOWN_SEVERITIES.len())];
    let timestamp = Utc::now() - Duration::minutes(rng.random_range(0..days * 24 * 60));

    let mut body = MESSAGES[rng.random_range(0..MESSAGES.len())].to_string();
    if body == "Cache miss for key" {
        body = format!("{body}: {}", short_id());
    }

    let (trace_id, span_id) = if rng.random_bool(0.7) {
        (
            Some(Uuid::new_v4().simple().to_string()),
            Some(Uuid::new_v4().simple().to_string()[..16].to_string()),
        )
    } else {
        (None, None)
    };

    // 2-5 attributes, duplicate picks collapse.
    let mut attributes = BTreeMap::new();
    for _ in 0..rng.random_range(2..=5) {
        if rng.random_bool(0.2) {
            let code = STATUS_CODES[rng.random_range(0..STATUS_CODES.len())];
            attributes.insert("http.status_code".to_string(), AttributeValue::from(code));
            continue;
        }
        let (key, values) = ATTRIBUTES[rng.random_range(0..ATTRIBUTES.len())];
        let value = values
            .choose(rng)
            .map(|v| v.to_string())
            .unwrap_or_else(short_id);
        attributes.insert(key.to_string(), AttributeValue::from(value));
    }

    CreateLogEntry {
        timestamp: Some(timestamp),
        severity_text: severity_text.to_string(),
        severity_number: Some(severity_number),
        body,
        trace_id,
        span_id,
        service_name: SERVICES.choose(rng).map(|s| s.to_string()),
        service_version: Some(format!("1.{}.0", rng.random_range(0..3))),
        host_name: HOSTS.choose(rng).map(|s| s.to_string()),
        scope_name: Some("seed_logs".to_string()),
        attributes,
        ..Default::default()
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = env::args().collect();
    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_usage();
        return Ok(());
    }

    let db_path = flag_value(&args, "--db")
        .map(PathBuf::from)
        .unwrap_or_else(database_path);
    let count = match flag_value(&args, "--count") {
        Some(raw) => raw.parse::<usize>().context("--count must be a number")?,
        None => DEFAULT_COUNT,
    };
    let days = match flag_value(&args, "--days") {
        Some(raw) => raw.parse::<i64>().context("--days must be a number")?,
        None => DEFAULT_DAYS,
    };
    if count == 0 {
        bail!("--count must be greater than 0");
    }
    if days <= 0 {
        bail!("--days must be greater than 0");
    }

    let store = LogStore::open(&db_path).await?;
    store.init().await?;

    info!(path = %db_path.display(), count, days, "Generating mock logs");

    let mut rng = rand::rng();
    for i in 0..count {
        let entry = random_entry(&mut rng, days).into_log_entry(Utc::now())?;
        store.insert_log(&entry).await?;

        if (i + 1) % PROGRESS_EVERY == 0 {
            info!("Generated {}/{} logs...", i + 1, count);
        }
    }

    store.close().await?;
    println!("Successfully generated {} mock logs in {}", count, db_path.display());

    Ok(())
}
