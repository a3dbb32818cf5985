//! One-shot batch job: recompute every storage's cached product count.
//!
//! Exits 0 when the run completes, 1 on configuration, connection or
//! data-access failure. Corrections written before a failure stay written.

use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;

use stockroom_api::app::services::connect_store;
use stockroom_api::config::{AppConfig, StoreConfig};
use stockroom_infra::{ReconcileOptions, StorageCountReconciler};

#[derive(Debug, Parser)]
#[command(
    name = "reconcile-storage-counts",
    about = "Recount products per storage and fix drifted cached counts"
)]
struct Args {
    /// Postgres connection string (overrides USE_PERSISTENT_STORES/DATABASE_URL).
    #[arg(long)]
    database_url: Option<String>,

    /// Storages loaded per page.
    #[arg(long, env = "RECONCILE_PAGE_SIZE")]
    page_size: Option<usize>,

    /// Run against an empty in-memory catalog (smoke test).
    #[arg(long, conflicts_with = "database_url")]
    in_memory: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    stockroom_observability::init();

    let args = Args::parse();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("storage count reconciliation failed: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> anyhow::Result<()> {
    let store_config = resolve_store(&args)?;
    let page_size = match args.page_size {
        Some(n) => n,
        None => AppConfig::from_env().context("invalid configuration")?.reconcile_page_size,
    };

    let store = connect_store(&store_config).await?;
    let reconciler = StorageCountReconciler::with_options(
        store,
        ReconcileOptions::default().with_page_size(page_size),
    );

    let report = reconciler.run().await?;

    for c in &report.corrections {
        tracing::info!(
            storage_id = %c.storage_id,
            old_count = c.old_count,
            new_count = c.new_count,
            "correction"
        );
    }
    tracing::info!(
        storages_examined = report.storages_examined,
        corrections = report.corrections.len(),
        elapsed_ms = (report.finished_at - report.started_at).num_milliseconds(),
        "done"
    );
    Ok(())
}

fn resolve_store(args: &Args) -> anyhow::Result<StoreConfig> {
    resolve_store_with(args, |name| std::env::var(name).ok())
}

/// The in-memory catalog is only used when asked for; every other path must
/// end up at Postgres.
fn resolve_store_with<F>(args: &Args, lookup: F) -> anyhow::Result<StoreConfig>
where
    F: Fn(&str) -> Option<String>,
{
    if args.in_memory {
        return Ok(StoreConfig::InMemory);
    }

    let config = match &args.database_url {
        Some(url) => AppConfig::from_lookup(|name| match name {
            "USE_PERSISTENT_STORES" => Some("true".to_string()),
            "DATABASE_URL" => Some(url.clone()),
            other => lookup(other),
        }),
        None => AppConfig::from_lookup(lookup),
    }
    .context("invalid configuration")?;

    match config.store {
        StoreConfig::InMemory => anyhow::bail!(
            "no catalog database configured: pass --database-url or set DATABASE_URL \
             with USE_PERSISTENT_STORES=true (use --in-memory for a smoke run)"
        ),
        postgres => Ok(postgres),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn in_memory_flag_wins() {
        let args = Args::parse_from(["reconcile-storage-counts", "--in-memory"]);
        assert_eq!(resolve_store_with(&args, no_env).unwrap(), StoreConfig::InMemory);
    }

    #[test]
    fn missing_database_configuration_is_an_error() {
        let args = Args::parse_from(["reconcile-storage-counts"]);
        let err = resolve_store_with(&args, no_env).unwrap_err();
        assert!(format!("{err:#}").contains("DATABASE_URL"));
    }

    #[test]
    fn persistent_env_selects_postgres_without_flags() {
        let args = Args::parse_from(["reconcile-storage-counts"]);
        let store = resolve_store_with(&args, |name| match name {
            "USE_PERSISTENT_STORES" => Some("true".to_string()),
            "DATABASE_URL" => Some("postgres://job@db/stock".to_string()),
            _ => None,
        })
        .unwrap();
        assert!(matches!(store, StoreConfig::Postgres { .. }));
    }

    #[test]
    fn database_url_flag_selects_postgres() {
        let args = Args::parse_from([
            "reconcile-storage-counts",
            "--database-url",
            "postgres://job@db/stock",
        ]);
        match resolve_store_with(&args, no_env).unwrap() {
            StoreConfig::Postgres { database_url, .. } => {
                assert_eq!(database_url, "postgres://job@db/stock")
            }
            other => panic!("expected Postgres, got {other:?}"),
        }
    }

    #[test]
    fn flags_conflict() {
        let res = Args::try_parse_from([
            "reconcile-storage-counts",
            "--in-memory",
            "--database-url",
            "postgres://job@db/stock",
        ]);
        assert!(res.is_err());
    }
}
