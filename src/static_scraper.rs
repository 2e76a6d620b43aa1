use reqwest::{Client, StatusCode};
use tracing::debug;

use crate::error::{Result, ScraperError};
use crate::models::{CategoryMap, StockTable};
use crate::scraper_logic::{extract_categories, extract_stock_table};
use crate::settings::NameMap;

const USER_AGENT: &str = concat!("class_alert/", env!("CARGO_PKG_VERSION"));

pub fn build_client() -> Result<Client> {
    Client::builder()
        .user_agent(USER_AGENT)
        .build()
        .map_err(ScraperError::Client)
}

/// GETs a page and returns its body. Anything but 200 is an error.
pub async fn fetch_html(client: &Client, url: &str) -> Result<String> {
    let transport = |source: reqwest::Error| ScraperError::Transport {
        url: url.to_string(),
        source,
    };

    let response = client.get(url).send().await.map_err(transport)?;
    let status = response.status();
    if status != StatusCode::OK {
        return Err(ScraperError::HttpStatus {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }
    let body = response.text().await.map_err(transport)?;
    debug!(url, bytes = body.len(), "fetched");
    Ok(body)
}

pub async fn fetch_categories(client: &Client, url: &str, names: &NameMap) -> Result<CategoryMap> {
    let body = fetch_html(client, url).await?;
    Ok(extract_categories(&body, names))
}

pub async fn fetch_stock_table(client: &Client, url: &str) -> Result<StockTable> {
    let body = fetch_html(client, url).await?;
    extract_stock_table(&body)
}
