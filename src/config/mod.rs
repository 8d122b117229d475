//! Configuration: platform paths and TOML-persisted settings.

pub mod paths;
pub mod settings;

pub use paths::AppPaths;
pub use settings::{AppConfig, SummaryConfig, TranscribeConfig};
