use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, error, info};

use class_alert::cli::Cli;
use class_alert::crawler::{self, PageReport};
use class_alert::logging;
use class_alert::settings::RunConfig;
use class_alert::static_scraper::build_client;

fn print_report(report: &PageReport, json: bool) {
    for notification in &report.notifications {
        if json {
            match serde_json::to_string(notification) {
                Ok(line) => println!("{}", line),
                Err(e) => error!(identity = %notification.identity, error = %e, "cannot serialize notification"),
            }
        } else {
            println!("{}", notification);
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);
    let start = Instant::now();

    let mut config = RunConfig::load(&cli.settings, &cli.names).with_context(|| {
        format!(
            "loading {} and {}",
            cli.settings.display(),
            cli.names.display()
        )
    })?;
    if let Some(workers) = cli.workers {
        config.worker_num = workers.max(1);
    }
    debug!(?config, "configuration loaded");

    let client = build_client()?;

    if cli.list_targets {
        let categories = crawler::discover(&client, &config)
            .await
            .with_context(|| format!("fetching {}", config.class_url))?;
        for url in crawler::resolve_targets(&categories, &config)? {
            println!("{}", url);
        }
        return Ok(());
    }

    let json = cli.json;
    let summary = crawler::run(&client, &config, |report| print_report(report, json))
        .await
        .with_context(|| format!("crawling from {}", config.class_url))?;

    info!(
        pages = summary.pages,
        failed = summary.failed,
        rows = summary.rows,
        notifications = summary.notifications,
        elapsed_secs = %format!("{:.5}", start.elapsed().as_secs_f64()),
        "run finished"
    );
    Ok(())
}
