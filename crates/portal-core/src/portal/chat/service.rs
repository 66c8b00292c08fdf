use std::sync::Arc;

use chrono::Utc;

use super::domain::MembershipOutcome;
use crate::portal::domain::{
    ChatChannel, ChatMessage, ChannelId, Grade, Role, SubjectId, TutorRecord, UserId,
};
use crate::portal::gateway::{GatewayError, PortalGateway};

/// Channel membership and messaging workflow.
///
/// Eligibility is decided per join: a tutor needs an approved subject link
/// covering the channel, a student needs the derived channel flag plus a
/// grade match. Membership rows, not roles, gate posting.
pub struct ChatService<G> {
    gateway: Arc<G>,
}

impl<G> ChatService<G>
where
    G: PortalGateway + 'static,
{
    pub fn new(gateway: Arc<G>) -> Self {
        Self { gateway }
    }

    /// Return the channel for a grade, creating it on first use.
    pub fn ensure_grade_channel(&self, grade: Grade) -> Result<ChatChannel, ChatError> {
        Ok(self.gateway.ensure_channel(grade, None)?)
    }

    /// Return the channel for a subject, creating it on first use. The
    /// channel's grade is the subject's grade.
    pub fn ensure_subject_channel(&self, subject_id: SubjectId) -> Result<ChatChannel, ChatError> {
        let subject = self
            .gateway
            .fetch_subject(subject_id)?
            .ok_or(ChatError::SubjectNotFound)?;
        Ok(self
            .gateway
            .ensure_channel(subject.grade, Some(subject.id))?)
    }

    /// Join `user_id` to a channel, idempotently.
    pub fn join_channel(
        &self,
        user_id: &UserId,
        channel_id: ChannelId,
    ) -> Result<MembershipOutcome, ChatError> {
        let channel = self
            .gateway
            .fetch_channel(channel_id)?
            .ok_or(ChatError::ChannelNotFound)?;
        let account = self
            .gateway
            .fetch_account(user_id)?
            .ok_or(ChatError::AccountNotFound)?;

        let eligible = match account.role {
            Role::Student => self
                .gateway
                .student_for_user(user_id)?
                .map(|record| {
                    record.profile.can_join_subject_channels
                        && record.profile.grade == channel.grade
                })
                .unwrap_or(false),
            Role::Tutor => match self.gateway.tutor_for_user(user_id)? {
                Some(record) => self.tutor_covers_channel(&record, &channel)?,
                None => false,
            },
            Role::Admin => false,
        };
        if !eligible {
            return Err(ChatError::NotEligible);
        }

        let newly_joined = self.gateway.insert_membership(user_id, channel_id)?;
        Ok(MembershipOutcome {
            channel_id,
            user_id: user_id.clone(),
            newly_joined,
        })
    }

    /// Append a message with a server-assigned timestamp.
    pub fn post_message(
        &self,
        user_id: &UserId,
        channel_id: ChannelId,
        text: &str,
    ) -> Result<ChatMessage, ChatError> {
        self.gateway
            .fetch_channel(channel_id)?
            .ok_or(ChatError::ChannelNotFound)?;
        if !self.gateway.is_member(user_id, channel_id)? {
            return Err(ChatError::NotAMember);
        }
        if text.trim().is_empty() {
            return Err(ChatError::EmptyMessage);
        }

        Ok(self
            .gateway
            .append_message(user_id, channel_id, text.to_string(), Utc::now())?)
    }

    pub fn recent_messages(
        &self,
        channel_id: ChannelId,
        limit: usize,
    ) -> Result<Vec<ChatMessage>, ChatError> {
        self.gateway
            .fetch_channel(channel_id)?
            .ok_or(ChatError::ChannelNotFound)?;
        Ok(self.gateway.messages_for_channel(channel_id, limit)?)
    }

    /// A subject channel needs the approved link for that subject; a
    /// grade-only channel accepts any approved link within its grade.
    fn tutor_covers_channel(
        &self,
        record: &TutorRecord,
        channel: &ChatChannel,
    ) -> Result<bool, ChatError> {
        let approved = record.approved_subject_ids();
        match channel.subject_id {
            Some(subject_id) => Ok(approved.contains(&subject_id)),
            None => {
                for subject_id in approved {
                    if let Some(subject) = self.gateway.fetch_subject(subject_id)? {
                        if subject.grade == channel.grade {
                            return Ok(true);
                        }
                    }
                }
                Ok(false)
            }
        }
    }
}

/// Error raised by the chat workflow.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("channel not found")]
    ChannelNotFound,
    #[error("subject not found")]
    SubjectNotFound,
    #[error("no account exists for that user")]
    AccountNotFound,
    #[error("user is not eligible to join this channel")]
    NotEligible,
    #[error("user is not a member of this channel")]
    NotAMember,
    #[error("message text must not be blank")]
    EmptyMessage,
    #[error("persistence failure: {0}")]
    Persistence(#[from] GatewayError),
}
