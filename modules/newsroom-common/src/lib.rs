pub mod config;
pub mod error;
pub mod pipeline;
pub mod strategy;
pub mod types;

pub use config::Config;
pub use error::{is_config_error, NewsroomError};
pub use pipeline::{GeneratedArticle, GenerationPipeline};
pub use strategy::{EditorialStrategy, StrategyPatch, WeightTable};
pub use types::*;
