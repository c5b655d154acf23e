pub mod fetcher;
pub mod traits;

pub use fetcher::{fetch_all, FetchReport, ScraperImpl};
pub use traits::Scraper;
