//! Run orchestration: category discovery, then one isolated task per listing page.

use std::sync::Arc;
use std::time::Instant;

use futures::stream::{self, StreamExt};
use reqwest::Client;
use tracing::{debug, error, info};
use url::Url;

use crate::alert::evaluate;
use crate::error::{Result, ScraperError};
use crate::models::{CategoryMap, Notification};
use crate::settings::{AlertRule, RunConfig};
use crate::static_scraper::{fetch_categories, fetch_stock_table};

/// Outcome of one listing page.
#[derive(Debug)]
pub struct PageReport {
    pub url: Url,
    pub rows: usize,
    pub notifications: Vec<Notification>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub pages: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub rows: usize,
    pub notifications: usize,
}

/// Absolute urls of every category in the configured groups, minus exclusions.
pub fn resolve_targets(categories: &CategoryMap, config: &RunConfig) -> Result<Vec<Url>> {
    let base = Url::parse(&config.host).map_err(|source| ScraperError::InvalidUrl {
        url: config.host.clone(),
        source,
    })?;

    let mut targets = Vec::new();
    for group in &config.crawl_groups {
        let Some(links) = categories.get(group) else {
            return Err(ScraperError::Config(format!("no category group {:?} on the landing page", group)));
        };
        for (name, href) in links.iter() {
            if config.excluded.iter().any(|e| e == name) {
                debug!(category = %name, "excluded");
                continue;
            }
            let url = base.join(href).map_err(|source| ScraperError::InvalidUrl {
                url: href.to_string(),
                source,
            })?;
            targets.push(url);
        }
    }
    Ok(targets)
}

/// Fetches the landing page and maps the configured groups to their categories.
pub async fn discover(client: &Client, config: &RunConfig) -> Result<CategoryMap> {
    let start = Instant::now();
    let categories = fetch_categories(client, &config.class_url, &config.names).await?;
    info!(
        groups = categories.len(),
        elapsed_secs = %format!("{:.5}", start.elapsed().as_secs_f64()),
        "category discovery finished"
    );
    Ok(categories)
}

/// Fetch, extract and evaluate one listing page.
pub async fn process_page(client: Client, url: Url, rule: Arc<AlertRule>) -> Result<PageReport> {
    let table = fetch_stock_table(&client, url.as_str()).await?;
    let notifications = evaluate(&table, &rule);
    Ok(PageReport {
        url,
        rows: table.len(),
        notifications,
    })
}

/// Runs every target with at most `workers` pages in flight.
///
/// `on_report` sees each finished page as it completes. A failing page is
/// logged and counted; it never stops the others.
pub async fn crawl<F>(
    client: &Client,
    targets: Vec<Url>,
    rule: AlertRule,
    workers: usize,
    mut on_report: F,
) -> RunSummary
where
    F: FnMut(&PageReport),
{
    let rule = Arc::new(rule);
    let mut summary = RunSummary {
        pages: targets.len(),
        ..Default::default()
    };

    let mut results = stream::iter(targets)
        .map(|url| {
            let task_url = url.clone();
            let handle = tokio::spawn(process_page(client.clone(), url, Arc::clone(&rule)));
            async move {
                let outcome = match handle.await {
                    Ok(result) => result,
                    Err(join) => Err(ScraperError::Task(join.to_string())),
                };
                (task_url, outcome)
            }
        })
        .buffer_unordered(workers.max(1));

    while let Some((url, outcome)) = results.next().await {
        match outcome {
            Ok(report) => {
                summary.succeeded += 1;
                summary.rows += report.rows;
                summary.notifications += report.notifications.len();
                on_report(&report);
            }
            Err(e) => {
                summary.failed += 1;
                error!(url = %url, error = %e, "page failed");
            }
        }
    }
    summary
}

/// Full run: discovery must succeed before any page task starts.
pub async fn run<F>(client: &Client, config: &RunConfig, on_report: F) -> Result<RunSummary>
where
    F: FnMut(&PageReport),
{
    let categories = discover(client, config).await?;
    let targets = resolve_targets(&categories, config)?;
    info!(targets = targets.len(), workers = config.worker_num, "crawling");
    Ok(crawl(client, targets, config.rule.clone(), config.worker_num, on_report).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Categories;
    use crate::settings::NameMap;

    fn config(groups: &[&str], excluded: &[&str]) -> RunConfig {
        RunConfig {
            worker_num: 2,
            rule: AlertRule::new(5.0, 5.0),
            crawl_groups: groups.iter().map(|s| s.to_string()).collect(),
            excluded: excluded.iter().map(|s| s.to_string()).collect(),
            host: "https://tw.stock.yahoo.com".into(),
            class_url: "https://tw.stock.yahoo.com/class".into(),
            names: NameMap::new(),
        }
    }

    fn categories() -> CategoryMap {
        let mut listed = Categories::new();
        listed.insert("水泥".into(), "/class-quote?sectorId=1&exchange=TAI".into());
        listed.insert("存託憑證".into(), "/class-quote?sectorId=38&exchange=TAI".into());
        let mut otc = Categories::new();
        otc.insert("生技".into(), "/class-quote?sectorId=100&exchange=TWO".into());
        let mut map = CategoryMap::new();
        map.insert("上市類股".into(), listed);
        map.insert("上櫃類股".into(), otc);
        map
    }

    #[test]
    fn resolves_and_excludes() {
        let targets = resolve_targets(&categories(), &config(&["上市類股"], &["存託憑證"])).unwrap();
        assert_eq!(targets.len(), 1);
        assert_eq!(
            targets[0].as_str(),
            "https://tw.stock.yahoo.com/class-quote?sectorId=1&exchange=TAI"
        );
    }

    #[test]
    fn resolves_several_groups() {
        let targets = resolve_targets(&categories(), &config(&["上市類股", "上櫃類股"], &[])).unwrap();
        assert_eq!(targets.len(), 3);
    }

    #[test]
    fn targets_follow_page_order() {
        let mut listed = Categories::new();
        listed.insert("塑膠".into(), "/class-quote?sectorId=3".into());
        listed.insert("水泥".into(), "/class-quote?sectorId=1".into());
        listed.insert("食品".into(), "/class-quote?sectorId=2".into());
        let mut map = CategoryMap::new();
        map.insert("上市類股".into(), listed);

        let targets = resolve_targets(&map, &config(&["上市類股"], &[])).unwrap();
        let ids: Vec<_> = targets.iter().map(|u| u.query().unwrap_or_default()).collect();
        assert_eq!(ids, vec!["sectorId=3", "sectorId=1", "sectorId=2"]);
    }

    #[test]
    fn unknown_group_fails() {
        assert!(resolve_targets(&categories(), &config(&["集團股"], &[])).is_err());
    }

    #[tokio::test]
    async fn failed_pages_do_not_stop_the_run() {
        let client = Client::new();
        // nothing listens on port 9 of localhost
        let targets = vec![
            Url::parse("http://127.0.0.1:9/a").unwrap(),
            Url::parse("http://127.0.0.1:9/b").unwrap(),
        ];
        let mut seen = 0;
        let summary = crawl(&client, targets, AlertRule::new(5.0, 5.0), 1, |_| seen += 1).await;
        assert_eq!(summary.pages, 2);
        assert_eq!(summary.failed, 2);
        assert_eq!(seen, 0);
    }
}
