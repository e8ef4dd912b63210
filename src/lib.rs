//! Alloy Designer: aluminum alloy property prediction and inverse search
//!
//! Predicts yield / ultimate tensile strength from composition and
//! processing history, and searches for recipes that hit a requested
//! strength within a tolerance band.
//!
//! ## Architecture
//!
//! - **Schema & Types**: bounded composition / processing vectors, targets, candidates
//! - **Predictor**: fixed surrogate models behind a lazily-loaded registry
//! - **Constraints / Series**: validity checks and alloy-family tagging
//! - **Search**: training lookup, random scan and pattern search, merged by the aggregator
//! - **Service**: predict / suggest / health / info operations
//! - **Protocol**: JSON-lines request loop used by `alloy-designer serve-stdio`

pub mod config;
pub mod constraints;
pub mod dataset;
pub mod predictor;
pub mod protocol;
pub mod schema;
pub mod search;
pub mod series;
pub mod service;
pub mod types;

// Re-export configuration
pub use config::{AppConfig, ConfigError};

// Re-export commonly used types
pub use types::{
    Candidate, CandidateSource, Composition, Element, ModelStats, Processing, ProcessingInput,
    ProcessingParam, SuggestionResult, TargetError, TargetProperty, TargetRange, TargetSpec,
};

// Re-export predictor and search entry points
pub use predictor::{ModelRegistry, PredictError, Predictor, PropertyModel};
pub use search::{SearchContext, StrategyKind, SuggestionEngine};
pub use series::AlloySeries;

// Re-export the service surface
pub use service::{AlloyService, PredictRequest, ServiceError, SuggestRequest};
