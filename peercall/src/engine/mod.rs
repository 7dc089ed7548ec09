//! The correlation engine and its builder.

mod builder;
mod options;
mod responder;
mod runtime;
mod stats;

pub use builder::EngineBuilder;
pub use options::RequestOptions;
pub use runtime::CorrelationEngine;
pub use stats::EngineStats;
