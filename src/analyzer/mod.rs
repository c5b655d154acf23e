// Analyzer module: history loading, price matrix, statistics and deal classification.

pub mod history;
pub mod price_analysis;
pub mod price_matrix;
pub mod statistics;

// Re-export the main Analyzer implementation for ease of use.
pub use price_analysis::{Analyzer, AnalyzerImpl, DealReport};
