//! Grade and subject chat channels: eligibility-gated membership and
//! member-only messaging with server-assigned timestamps.

pub mod domain;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{JoinChannelRequest, MembershipOutcome, MessageView, PostMessageRequest};
pub use router::chat_router;
pub use service::{ChatError, ChatService};
