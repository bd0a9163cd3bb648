use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use relay_core::{update, ColumnProjection, Msg, SessionView};
use relay_engine::{
    clear_session, load_snapshot, save_snapshot, ExportSettings, FileStore, QueryRunner,
    ReqwestBrowser, RunOutcome, SiteProfile, TableFormSite,
};
use relay_logging::{relay_info, relay_warn};

use crate::cli::{Cli, Command};
use crate::config::{self, RelayConfig};
use crate::prompt::StdinConfirmer;

pub async fn dispatch(cli: Cli) -> Result<()> {
    let config = config::load(&cli.config)?;
    let site = TableFormSite::new(config.site.clone());
    let keys = site.keys();
    let store = FileStore::new(&cli.state_dir);

    match cli.command {
        Command::Upload {
            file,
            project,
            id_column,
            status_column,
            excluded_status,
            confirm_each,
        } => {
            let projection = resolve_projection(
                &config,
                project,
                id_column,
                status_column,
                excluded_status,
            );
            let runner = build_runner(&config, site, store, &cli.output_dir)?;
            let (summary, outcome) = runner
                .upload_and_run(&file, projection.as_ref(), !confirm_each)
                .await
                .with_context(|| format!("running queries from {}", file.display()))?;
            relay_info!("{} queries uploaded", summary.rows);
            report(outcome);
        }
        Command::Resume => {
            let runner = build_runner(&config, site, store, &cli.output_dir)?;
            let outcome = runner.start().await.context("resuming session")?;
            report(outcome);
        }
        Command::Status => {
            let snapshot = load_snapshot(&store, &keys).await?;
            print_status(&config.site.source, &snapshot.view());
        }
        Command::Reset => {
            clear_session(&store, &keys).await?;
            relay_info!("Session for {} cleared", config.site.source);
        }
        Command::Autoclick { state } => {
            let snapshot = load_snapshot(&store, &keys).await?;
            let (snapshot, _) = update(snapshot, Msg::AutoclickChanged(state.enabled()))?;
            save_snapshot(&store, &keys, &snapshot).await?;
            relay_info!("Autoclick {}", if snapshot.autoclick { "on" } else { "off" });
        }
    }
    Ok(())
}

fn build_runner(
    config: &RelayConfig,
    site: TableFormSite,
    store: FileStore,
    output_dir: &Path,
) -> Result<QueryRunner> {
    let browser = ReqwestBrowser::new(config.fetch.to_settings())
        .context("building http client")?;
    let mut export = ExportSettings::new(output_dir);
    export.timestamp = Arc::new(|| Utc::now().format("%Y%m%dT%H%M%SZ").to_string());
    Ok(QueryRunner::new(Arc::new(browser), Arc::new(store), Arc::new(site), export)
        .with_confirmer(Arc::new(StdinConfirmer)))
}

/// Command-line column options win over the config file; any of them turns
/// projection on.
fn resolve_projection(
    config: &RelayConfig,
    project: bool,
    id_column: Option<String>,
    status_column: Option<String>,
    excluded_status: Option<String>,
) -> Option<ColumnProjection> {
    let requested =
        project || id_column.is_some() || status_column.is_some() || excluded_status.is_some();
    if !requested {
        return None;
    }
    let base = config
        .projection
        .clone()
        .map(ColumnProjection::from)
        .unwrap_or_default();
    Some(ColumnProjection {
        id_column: id_column.unwrap_or(base.id_column),
        status_column: status_column.unwrap_or(base.status_column),
        excluded_status: excluded_status.unwrap_or(base.excluded_status),
    })
}

fn report(outcome: RunOutcome) {
    match outcome {
        RunOutcome::Finished { path, page_loads } => {
            println!("Results written to {} after {page_loads} page loads", path.display());
        }
        RunOutcome::Paused { remaining } => {
            relay_warn!("Paused with {} queries left; run `relay resume` to continue", remaining);
        }
    }
}

fn print_status(source: &str, view: &SessionView) {
    println!("source:    {source}");
    if !view.uploaded {
        println!("session:   none");
        return;
    }
    println!("remaining: {}", view.remaining_queries);
    println!("scraped:   {} rows", view.scraped_rows);
    if let Some(header) = &view.header {
        println!("columns:   {header}");
    }
    println!("autoclick: {}", if view.autoclick { "on" } else { "off" });
}
