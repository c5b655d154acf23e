use crate::model::ScraperError;
use serde_json::Value;

#[async_trait::async_trait]
pub trait Scraper: Send + Sync {
    /// GETs one catalog shard and parses the body as JSON.
    async fn fetch_json(&self, url: &str) -> Result<Value, ScraperError>;
}
