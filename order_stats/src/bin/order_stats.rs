use std::{
    io::{BufRead, BufReader},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use tracing_subscriber::EnvFilter;

use order_stats::{
    DashboardEngine,
    clock::{Clock, FixedClock, SystemClock},
    config::{self, ResolvedConfig},
    db::migrate,
    models::NewOrder,
    status::OrderStatus,
    store::{memory::MemoryStore, sqlite::SqliteStore},
};

#[derive(Parser)]
#[command(version, about = "Order dashboard statistics")]
struct Cli {
    /// TOML config file; DATABASE_URL and ORDER_STATS_TZ override it.
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Apply pending schema migrations.
    Migrate,
    /// Record a new order.
    Add {
        #[arg(long)]
        id: String,
        #[arg(long)]
        price: Decimal,
        /// Initial status; defaults to Pending.
        #[arg(long)]
        status: Option<String>,
        /// RFC3339 creation time; defaults to now.
        #[arg(long)]
        created_at: Option<DateTime<Utc>>,
    },
    /// Move an order to a new status.
    SetStatus { id: String, status: OrderStatus },
    /// Print one order as JSON.
    Show { id: String },
    /// Delete an order.
    Delete { id: String },
    /// Print the dashboard figures as JSON.
    Stats {
        /// RFC3339 reference instant; defaults to now.
        #[arg(long)]
        now: Option<DateTime<Utc>>,
        #[arg(long)]
        pretty: bool,
    },
    /// Orders created on one local day (YYYY-MM-DD), newest first.
    Day { date: NaiveDate },
    /// Insert orders from a JSON-lines file.
    Import {
        #[arg(long, value_name = "FILE")]
        file: PathBuf,
        /// Validate and print the stats the file alone would produce; write nothing.
        #[arg(long)]
        dry_run: bool,
    },
}

fn init_tracing(cfg: &ResolvedConfig) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(f) => f,
        Err(_) => EnvFilter::try_new(cfg.log_level.as_deref().unwrap_or("warn"))
            .context("invalid log_level")?,
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
    Ok(())
}

fn read_orders(path: &Path) -> Result<Vec<NewOrder>> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("open import file {}", path.display()))?;
    let mut orders = Vec::new();
    for (n, line) in BufReader::new(file).lines().enumerate() {
        let line = line.with_context(|| format!("read {}", path.display()))?;
        if line.trim().is_empty() {
            continue;
        }
        let order: NewOrder = serde_json::from_str(&line)
            .with_context(|| format!("{}:{}: bad order line", path.display(), n + 1))?;
        orders.push(order);
    }
    Ok(orders)
}

fn print_json<T: serde::Serialize>(value: &T, pretty: bool) -> Result<()> {
    let out = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{out}");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let cfg = config::load_config(cli.config.as_deref())?;
    init_tracing(&cfg)?;

    match cli.cmd {
        Cmd::Migrate => {
            let n = migrate::run_sqlite(&cfg.database_url)
                .with_context(|| format!("migrate {}", cfg.database_url))?;
            println!("applied {n} migration(s)");
        }
        Cmd::Add {
            id,
            price,
            status,
            created_at,
        } => {
            let store = SqliteStore::open(&cfg.database_url)?;
            let order = NewOrder {
                id,
                price,
                status,
                created_at: created_at.unwrap_or_else(Utc::now),
            };
            store.insert_order(order).await?;
        }
        Cmd::SetStatus { id, status } => {
            let store = SqliteStore::open(&cfg.database_url)?;
            store.update_status(&id, status, Utc::now()).await?;
        }
        Cmd::Show { id } => {
            let store = SqliteStore::open(&cfg.database_url)?;
            let order = store
                .get(&id)
                .await?
                .with_context(|| format!("order not found: {id}"))?;
            print_json(&order, true)?;
        }
        Cmd::Delete { id } => {
            let store = SqliteStore::open(&cfg.database_url)?;
            store.delete_order(&id).await?;
            tracing::info!(%id, "order deleted");
        }
        Cmd::Stats { now, pretty } => {
            let store = SqliteStore::open(&cfg.database_url)?;
            let engine = DashboardEngine::new(store, cfg.tz).with_recent_limit(cfg.recent_limit);
            let clock: Box<dyn Clock> = match now {
                Some(t) => Box::new(FixedClock(t)),
                None => Box::new(SystemClock),
            };
            let stats = engine.compute_with_clock(clock.as_ref()).await?;
            print_json(&stats, pretty)?;
        }
        Cmd::Day { date } => {
            let store = SqliteStore::open(&cfg.database_url)?;
            let orders = store.orders_on_day(date, cfg.tz).await?;
            print_json(&orders, false)?;
        }
        Cmd::Import { file, dry_run } => {
            let orders = read_orders(&file)?;
            if dry_run {
                let records = orders
                    .into_iter()
                    .map(NewOrder::into_record)
                    .collect::<Result<Vec<_>, _>>()?;
                let engine = DashboardEngine::new(MemoryStore::new(records), cfg.tz)
                    .with_recent_limit(cfg.recent_limit);
                let stats = engine.compute_with_clock(&SystemClock).await?;
                print_json(&stats, true)?;
            } else {
                let store = SqliteStore::open(&cfg.database_url)?;
                let n = store.insert_many(orders).await?;
                tracing::info!(inserted = n, file = %file.display(), "import complete");
                println!("imported {n} order(s)");
            }
        }
    }

    Ok(())
}
