pub mod config;
pub mod knowledge; // Versioned allergen / medication / interaction data
pub mod models;
pub mod scan; // Normalizer, matchers, aggregator, engine

use tracing_subscriber::EnvFilter;

pub use knowledge::{KnowledgeBase, LoadError};
pub use models::UserProfile;
pub use scan::{IngredientSource, RiskReport, ScanEngine, Scanner};

/// Install the global tracing subscriber. `RUST_LOG` wins over
/// `default_filter`. Logs go to stderr so stdout stays clean for reports.
pub fn init_tracing(default_filter: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!("{} v{} logging initialised", config::APP_NAME, config::APP_VERSION);
}
