//! nerdherd-bedrock
//!
//! Bedrock-backed collaborators for the diagnosis conversation: Converse for
//! replies and ApplyGuardrail for input moderation.

pub mod chat;
pub mod error;
pub mod guardrail;

pub use chat::BedrockCompleter;
pub use guardrail::BedrockModerator;
