//! Dialog runtime for the ball advisor.
//!
//! - `llm`: the advisory oracle seam and its OpenAI-compatible client
//! - `recommend`: catalog filter merged with oracle advice, with a deterministic fallback
//! - `photos`: image lookup with a per-item text fallback
//! - `runtime`: per-conversation sessions driven by the core flow engine
//!
//! The oracle only ever contributes free text. Which balls are shown is decided by the
//! catalog filter alone.

pub mod llm;
pub mod photos;
pub mod prompt;
pub mod recommend;
pub mod runtime;

pub use llm::{AdvisoryOracle, OpenAiOracle, OracleError};
pub use photos::PhotoLocator;
pub use recommend::{Recommendation, RecommendationCoordinator};
pub use runtime::DialogRuntime;
