// AI pipeline stages for playlist generation
//
// This module provides:
// - Relevance filtering against a fixed candidate budget
// - Prompt compilation with album-grouped serialization
// - Chat-completion client for the generation call
// - Reply reconciliation back onto catalog tracks

pub mod system_prompt;
pub mod relevance;
pub mod prompt_builder;
pub mod openai_client;
pub mod reconciler;

// Re-export commonly used types
pub use openai_client::OpenAiClient;
pub use prompt_builder::{compile, Prompt};
pub use reconciler::reconcile;
pub use relevance::{select_candidates, CANDIDATE_BUDGET};
pub use system_prompt::SYSTEM_PROMPT;
