//! nerdherd-diagnosis
//!
//! The free-diagnosis conversation: turn-taking, moderation gating, reply
//! classification, the question cutoff, and hand-off of finished diagnoses
//! to a background persistence worker.

pub mod collaborators;
pub mod error;
pub mod persist;
pub mod prompt;
pub mod session;
