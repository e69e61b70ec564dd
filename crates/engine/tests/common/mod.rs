use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use sea_orm::Database;

use engine::{
    ChannelId, ChatError, ChatPort, CommunityId, Engine, MarkerKind, MessageId, UserId,
};
use migration::MigratorTrait;

/// In-memory chat backend. Records everything the engine sends outward and
/// holds a manipulable marker state so tests can play the platform side.
/// Individual operations can be switched to fail, to play a flaky gateway.
#[derive(Default)]
pub struct FakeChat {
    pub posts: Mutex<Vec<(ChannelId, String)>>,
    pub edits: Mutex<Vec<(MessageId, String)>>,
    pub directs: Mutex<Vec<(UserId, String)>>,
    pub added_markers: Mutex<Vec<(MessageId, MarkerKind)>>,
    pub removed_markers: Mutex<Vec<(MessageId, MarkerKind, UserId)>>,
    pub cleared_markers: Mutex<Vec<(MessageId, MarkerKind)>>,
    markers: Mutex<HashMap<(MessageId, MarkerKind), Vec<UserId>>>,
    names: Mutex<HashMap<UserId, String>>,
    next_message_id: Mutex<MessageId>,
    fail_posts: AtomicBool,
    fail_edits: AtomicBool,
    fail_directs: AtomicBool,
}

impl FakeChat {
    pub fn set_marker_users(&self, message_id: MessageId, marker: MarkerKind, users: Vec<UserId>) {
        self.markers
            .lock()
            .unwrap()
            .insert((message_id, marker), users);
    }

    pub fn fail_posts(&self) {
        self.fail_posts.store(true, Ordering::SeqCst);
    }

    pub fn fail_edits(&self) {
        self.fail_edits.store(true, Ordering::SeqCst);
    }

    pub fn fail_directs(&self) {
        self.fail_directs.store(true, Ordering::SeqCst);
    }

    pub fn set_name(&self, user_id: UserId, name: &str) {
        self.names.lock().unwrap().insert(user_id, name.to_string());
    }

    pub fn directs_to(&self, user_id: UserId) -> Vec<String> {
        self.directs
            .lock()
            .unwrap()
            .iter()
            .filter(|(id, _)| *id == user_id)
            .map(|(_, text)| text.clone())
            .collect()
    }

    pub fn last_edit(&self) -> Option<(MessageId, String)> {
        self.edits.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl ChatPort for FakeChat {
    async fn post_announcement(
        &self,
        channel_id: ChannelId,
        text: &str,
    ) -> Result<MessageId, ChatError> {
        if self.fail_posts.load(Ordering::SeqCst) {
            return Err(ChatError::Transport("post rejected".to_string()));
        }
        let mut next = self.next_message_id.lock().unwrap();
        *next += 1;
        self.posts
            .lock()
            .unwrap()
            .push((channel_id, text.to_string()));
        Ok(*next)
    }

    async fn edit_message(
        &self,
        _channel_id: ChannelId,
        message_id: MessageId,
        text: &str,
    ) -> Result<(), ChatError> {
        if self.fail_edits.load(Ordering::SeqCst) {
            return Err(ChatError::Transport("edit rejected".to_string()));
        }
        self.edits
            .lock()
            .unwrap()
            .push((message_id, text.to_string()));
        Ok(())
    }

    async fn add_marker(
        &self,
        _channel_id: ChannelId,
        message_id: MessageId,
        marker: MarkerKind,
    ) -> Result<(), ChatError> {
        self.added_markers.lock().unwrap().push((message_id, marker));
        Ok(())
    }

    async fn clear_marker(
        &self,
        _channel_id: ChannelId,
        message_id: MessageId,
        marker: MarkerKind,
    ) -> Result<(), ChatError> {
        self.cleared_markers
            .lock()
            .unwrap()
            .push((message_id, marker));
        self.markers.lock().unwrap().remove(&(message_id, marker));
        Ok(())
    }

    async fn remove_marker_for_user(
        &self,
        _channel_id: ChannelId,
        message_id: MessageId,
        marker: MarkerKind,
        user_id: UserId,
    ) -> Result<(), ChatError> {
        self.removed_markers
            .lock()
            .unwrap()
            .push((message_id, marker, user_id));
        if let Some(users) = self.markers.lock().unwrap().get_mut(&(message_id, marker)) {
            users.retain(|&id| id != user_id);
        }
        Ok(())
    }

    async fn marker_users(
        &self,
        _channel_id: ChannelId,
        message_id: MessageId,
        marker: MarkerKind,
    ) -> Result<Vec<UserId>, ChatError> {
        Ok(self
            .markers
            .lock()
            .unwrap()
            .get(&(message_id, marker))
            .cloned()
            .unwrap_or_default())
    }

    async fn send_direct(&self, user_id: UserId, text: &str) -> Result<(), ChatError> {
        if self.fail_directs.load(Ordering::SeqCst) {
            return Err(ChatError::Transport("direct rejected".to_string()));
        }
        self.directs
            .lock()
            .unwrap()
            .push((user_id, text.to_string()));
        Ok(())
    }

    async fn display_name(&self, user_id: UserId) -> Result<String, ChatError> {
        Ok(self
            .names
            .lock()
            .unwrap()
            .get(&user_id)
            .cloned()
            .unwrap_or_else(|| format!("user {user_id}")))
    }

    fn message_link(
        &self,
        community_id: CommunityId,
        channel_id: ChannelId,
        message_id: MessageId,
    ) -> String {
        format!("https://chat.test/{community_id}/{channel_id}/{message_id}")
    }
}

pub async fn setup() -> (Engine, Arc<FakeChat>) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();

    let chat = Arc::new(FakeChat::default());
    let engine = Engine::builder()
        .database(db)
        .chat(chat.clone())
        .starting_money(100)
        .build()
        .unwrap();
    (engine, chat)
}
