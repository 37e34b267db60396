use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}

pub mod aggregate;
pub mod app_config;
pub mod catalog;
pub mod categories;
pub mod config;
pub mod display;
pub mod units;

pub use aggregate::{aggregate, classify, AggregateView, PriceStatus, ReportObservation};
pub use app_config::{AppConfig, Environment};
pub use catalog::{dedupe_recent, FavoriteToggle, SearchState};
pub use categories::ProductCategory;
pub use config::{load_app_config, load_app_config_from_env};
pub use display::{present, DisplayModel, DisplayOptions};
pub use units::{base_unit_label, normalize, to_base_currency, CurrencyError, UnitScale, BASE_CURRENCY};
