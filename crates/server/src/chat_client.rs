//! HTTP client for the chat gateway.
//!
//! The gateway process sits next to the chat platform and exposes the
//! outbound operations the engine needs over plain JSON endpoints. This
//! client implements [`ChatPort`] against it.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use engine::{ChannelId, ChatError, ChatPort, CommunityId, MarkerKind, MessageId, UserId};

#[derive(Clone, Debug)]
pub struct HttpChat {
    client: Client,
    base_url: String,
    link_base: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

#[derive(Serialize)]
struct MessageNew<'a> {
    channel_id: ChannelId,
    text: &'a str,
}

#[derive(Deserialize)]
struct MessagePosted {
    message_id: MessageId,
}

#[derive(Serialize)]
struct MessageEdit<'a> {
    channel_id: ChannelId,
    message_id: MessageId,
    text: &'a str,
}

#[derive(Serialize)]
struct MarkerOp {
    channel_id: ChannelId,
    message_id: MessageId,
    marker: MarkerKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    user_id: Option<UserId>,
}

#[derive(Deserialize)]
struct MarkerUsers {
    user_ids: Vec<UserId>,
}

#[derive(Serialize)]
struct DirectNew<'a> {
    user_id: UserId,
    text: &'a str,
}

#[derive(Serialize)]
struct UserRef {
    user_id: UserId,
}

#[derive(Deserialize)]
struct DisplayName {
    name: String,
}

impl HttpChat {
    /// `base_url` is the gateway endpoint, `link_base` the public message
    /// link prefix of the chat platform.
    pub fn new(client: Client, base_url: String, link_base: String) -> Self {
        Self {
            client,
            base_url,
            link_base,
        }
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    async fn post_json<TReq: Serialize + ?Sized, TResp: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        body: &TReq,
    ) -> Result<TResp, ChatError> {
        let resp = self
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .map_err(|err| ChatError::Transport(err.to_string()))?;

        let status = resp.status();
        if status.is_success() {
            return resp
                .json::<TResp>()
                .await
                .map_err(|err| ChatError::Transport(err.to_string()));
        }

        let message = match resp.json::<ErrorBody>().await {
            Ok(err) => err.error,
            Err(_) => "gateway error".to_string(),
        };
        Err(ChatError::Transport(format!("{status}: {message}")))
    }

    async fn post_json_unit<TReq: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &TReq,
    ) -> Result<(), ChatError> {
        let resp = self
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .map_err(|err| ChatError::Transport(err.to_string()))?;

        let status = resp.status();
        if status.is_success() {
            return Ok(());
        }
        let message = match resp.json::<ErrorBody>().await {
            Ok(err) => err.error,
            Err(_) => "gateway error".to_string(),
        };
        Err(ChatError::Transport(format!("{status}: {message}")))
    }
}

#[async_trait]
impl ChatPort for HttpChat {
    async fn post_announcement(
        &self,
        channel_id: ChannelId,
        text: &str,
    ) -> Result<MessageId, ChatError> {
        let posted: MessagePosted = self
            .post_json("/messages", &MessageNew { channel_id, text })
            .await?;
        Ok(posted.message_id)
    }

    async fn edit_message(
        &self,
        channel_id: ChannelId,
        message_id: MessageId,
        text: &str,
    ) -> Result<(), ChatError> {
        self.post_json_unit(
            "/messages/edit",
            &MessageEdit {
                channel_id,
                message_id,
                text,
            },
        )
        .await
    }

    async fn add_marker(
        &self,
        channel_id: ChannelId,
        message_id: MessageId,
        marker: MarkerKind,
    ) -> Result<(), ChatError> {
        self.post_json_unit(
            "/markers/add",
            &MarkerOp {
                channel_id,
                message_id,
                marker,
                user_id: None,
            },
        )
        .await
    }

    async fn clear_marker(
        &self,
        channel_id: ChannelId,
        message_id: MessageId,
        marker: MarkerKind,
    ) -> Result<(), ChatError> {
        self.post_json_unit(
            "/markers/clear",
            &MarkerOp {
                channel_id,
                message_id,
                marker,
                user_id: None,
            },
        )
        .await
    }

    async fn remove_marker_for_user(
        &self,
        channel_id: ChannelId,
        message_id: MessageId,
        marker: MarkerKind,
        user_id: UserId,
    ) -> Result<(), ChatError> {
        self.post_json_unit(
            "/markers/remove",
            &MarkerOp {
                channel_id,
                message_id,
                marker,
                user_id: Some(user_id),
            },
        )
        .await
    }

    async fn marker_users(
        &self,
        channel_id: ChannelId,
        message_id: MessageId,
        marker: MarkerKind,
    ) -> Result<Vec<UserId>, ChatError> {
        let users: MarkerUsers = self
            .post_json(
                "/markers/list",
                &MarkerOp {
                    channel_id,
                    message_id,
                    marker,
                    user_id: None,
                },
            )
            .await?;
        Ok(users.user_ids)
    }

    async fn send_direct(&self, user_id: UserId, text: &str) -> Result<(), ChatError> {
        self.post_json_unit("/directs", &DirectNew { user_id, text })
            .await
    }

    async fn display_name(&self, user_id: UserId) -> Result<String, ChatError> {
        let name: DisplayName = self.post_json("/users/name", &UserRef { user_id }).await?;
        Ok(name.name)
    }

    fn message_link(
        &self,
        community_id: CommunityId,
        channel_id: ChannelId,
        message_id: MessageId,
    ) -> String {
        format!(
            "{}/{community_id}/{channel_id}/{message_id}",
            self.link_base.trim_end_matches('/')
        )
    }
}
