//! Outbound messaging capability.
//!
//! The concrete chat platform lives outside this crate. The engine only
//! needs the operations below: posting and editing announcements, managing
//! the reaction markers on them, reading the current marker state back, and
//! sending direct notices. Implementations are injected as
//! `Arc<dyn ChatPort>` when the engine is built.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{ChannelId, CommunityId, MessageId, UserId};

/// The reaction markers users apply to an announcement message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerKind {
    Accept,
    Win,
    Lose,
}

impl MarkerKind {
    /// Stable name of the marker, also the custom-emoji name on the
    /// platform side.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Accept => "wagerin",
            Self::Win => "wagerwin",
            Self::Lose => "wagerlose",
        }
    }
}

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("chat transport error: {0}")]
    Transport(String),
}

#[async_trait]
pub trait ChatPort: Send + Sync {
    /// Post a new announcement and return the platform message id used to
    /// correlate later marker events.
    async fn post_announcement(
        &self,
        channel_id: ChannelId,
        text: &str,
    ) -> Result<MessageId, ChatError>;

    async fn edit_message(
        &self,
        channel_id: ChannelId,
        message_id: MessageId,
        text: &str,
    ) -> Result<(), ChatError>;

    /// Pre-fill a marker on a message so users can click instead of search.
    async fn add_marker(
        &self,
        channel_id: ChannelId,
        message_id: MessageId,
        marker: MarkerKind,
    ) -> Result<(), ChatError>;

    /// Remove a marker from every user on the message.
    async fn clear_marker(
        &self,
        channel_id: ChannelId,
        message_id: MessageId,
        marker: MarkerKind,
    ) -> Result<(), ChatError>;

    async fn remove_marker_for_user(
        &self,
        channel_id: ChannelId,
        message_id: MessageId,
        marker: MarkerKind,
        user_id: UserId,
    ) -> Result<(), ChatError>;

    /// Users currently showing `marker` on the message.
    async fn marker_users(
        &self,
        channel_id: ChannelId,
        message_id: MessageId,
        marker: MarkerKind,
    ) -> Result<Vec<UserId>, ChatError>;

    async fn send_direct(&self, user_id: UserId, text: &str) -> Result<(), ChatError>;

    async fn display_name(&self, user_id: UserId) -> Result<String, ChatError>;

    /// Permanent link to a message, for use in notices and listings.
    fn message_link(
        &self,
        community_id: CommunityId,
        channel_id: ChannelId,
        message_id: MessageId,
    ) -> String;
}

/// Direct notice, fire-and-forget. Delivery failures never roll back a
/// committed state transition; they are logged and swallowed.
pub(crate) async fn notify(chat: &dyn ChatPort, user_id: UserId, text: &str) {
    if let Err(err) = chat.send_direct(user_id, text).await {
        tracing::warn!("direct notice to {user_id} failed: {err}");
    }
}

/// Display name with an id-based fallback when the platform lookup fails.
pub(crate) async fn name_or_id(chat: &dyn ChatPort, user_id: UserId) -> String {
    match chat.display_name(user_id).await {
        Ok(name) => name,
        Err(err) => {
            tracing::debug!("display name lookup for {user_id} failed: {err}");
            format!("user {user_id}")
        }
    }
}
