// src/analyze/mod.rs
//! Model-assisted extraction: prompt + provider call, then tolerant parsing of the reply.

pub mod ai_adapter;
pub mod parser;

pub use ai_adapter::{InsightModel, ModelResponse, ResponseStatus};
pub use parser::{parse_response, ParsedInsight};
