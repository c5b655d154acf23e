use crate::model::ScraperError;
use crate::scraper::traits::Scraper;

use futures::future::join_all;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Client;
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, info, warn};

pub const PLACEHOLDER: char = '*';
const STORE_MARKER: &str = "storeId=";

pub struct ScraperImpl {
    pub client: Client,
}

impl ScraperImpl {
    pub fn new(headers: &BTreeMap<String, String>, timeout_secs: u64) -> Result<Self, ScraperError> {
        let mut header_map = HeaderMap::new();
        for (key, value) in headers {
            let name = HeaderName::from_bytes(key.as_bytes())
                .map_err(|e| ScraperError::Client(format!("{}: {}", key, e)))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| ScraperError::Client(format!("{}: {}", key, e)))?;
            header_map.insert(name, value);
        }

        let client = Client::builder()
            .default_headers(header_map)
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait::async_trait]
impl Scraper for ScraperImpl {
    async fn fetch_json(&self, url: &str) -> Result<Value, ScraperError> {
        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(ScraperError::InvalidResponse(response.status()));
        }

        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

/// Number of shards to request for `template`. The integer after the last
/// `storeId=` marker wins over `default_pieces`.
pub fn piece_count(template: &str, default_pieces: usize) -> usize {
    template
        .rfind(STORE_MARKER)
        .and_then(|pos| template[pos + STORE_MARKER.len()..].parse::<usize>().ok())
        .unwrap_or(default_pieces)
}

/// Expands a template with one `*` into URLs for pieces 1..=n, in order.
pub fn expand_template(template: &str, default_pieces: usize) -> Result<Vec<String>, ScraperError> {
    let template = template.trim();
    if template.matches(PLACEHOLDER).count() != 1 {
        return Err(ScraperError::InvalidTemplate(template.to_string()));
    }

    let n = piece_count(template, default_pieces);
    let (head, tail) = template
        .split_once(PLACEHOLDER)
        .ok_or_else(|| ScraperError::InvalidTemplate(template.to_string()))?;

    Ok((1..=n).map(|p| format!("{}{}{}", head, p, tail)).collect())
}

#[derive(Debug)]
pub struct ShardFailure {
    pub url: String,
    pub error: ScraperError,
}

/// Everything one fetch run produced. Payload order across templates is not meaningful.
#[derive(Debug, Default)]
pub struct FetchReport {
    pub payloads: Vec<Value>,
    pub failures: Vec<ShardFailure>,
}

impl FetchReport {
    fn merge(&mut self, other: FetchReport) {
        self.payloads.extend(other.payloads);
        self.failures.extend(other.failures);
    }
}

/// Fetches every shard of one template sequentially. Failed shards are
/// recorded and skipped.
pub async fn fetch_template<S: Scraper + ?Sized>(
    scraper: &S,
    template: &str,
    default_pieces: usize,
) -> FetchReport {
    let mut report = FetchReport::default();

    let urls = match expand_template(template, default_pieces) {
        Ok(urls) => urls,
        Err(e) => {
            warn!("Skipping template: {}", e);
            report.failures.push(ShardFailure {
                url: template.trim().to_string(),
                error: e,
            });
            return report;
        }
    };

    for url in urls {
        match scraper.fetch_json(&url).await {
            Ok(payload) => {
                debug!("Fetched {}", url);
                report.payloads.push(payload);
            }
            Err(e) => {
                warn!("Shard failed {}: {}", url, e);
                report.failures.push(ShardFailure { url, error: e });
            }
        }
    }

    report
}

/// One worker per template, all running concurrently; returns once every worker finished.
pub async fn fetch_all<S: Scraper + ?Sized>(
    scraper: &S,
    templates: &[String],
    default_pieces: usize,
) -> FetchReport {
    info!("Fetching {} templates...", templates.len());
    let workers = templates
        .iter()
        .map(|template| fetch_template(scraper, template, default_pieces));

    let mut merged = FetchReport::default();
    for report in join_all(workers).await {
        merged.merge(report);
    }

    info!(
        "Fetched {} payloads, {} shards failed",
        merged.payloads.len(),
        merged.failures.len()
    );
    merged
}
