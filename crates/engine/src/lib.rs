//! Wager engine.
//!
//! Members of a chat community stake a shared virtual currency on informal
//! bets, mediated entirely through reaction markers on announcement
//! messages. The engine owns the wager lifecycle state machine
//! (Proposed -> Accepted -> Complete), the reconciliation of conflicting
//! marker events into a settled result, and the balance bookkeeping around
//! it. The chat platform itself is an external collaborator reached through
//! the [`ChatPort`] trait.

use std::sync::Arc;

use sea_orm::DatabaseConnection;

pub use chat::{ChatError, ChatPort, MarkerKind};
pub use error::EngineError;
pub use ledger::{BalanceSummary, Ledger};
pub use lifecycle::{MessageOrigin, Provisioned, UserWagers};
pub use users::User;
pub use wagers::{Wager, WagerStatus, WagerStore};

mod chat;
mod error;
mod ledger;
mod lifecycle;
mod locks;
mod settlement;
mod text;
mod users;
mod wagers;

/// Platform snowflakes.
pub type UserId = i64;
pub type CommunityId = i64;
pub type ChannelId = i64;
pub type MessageId = i64;
/// Engine-assigned wager key.
pub type WagerId = i32;

pub const DEFAULT_STARTING_MONEY: i64 = 100;

type ResultEngine<T> = Result<T, EngineError>;

pub struct Engine {
    pub(crate) database: DatabaseConnection,
    pub(crate) ledger: Ledger,
    pub(crate) wagers: WagerStore,
    pub(crate) chat: Arc<dyn ChatPort>,
    pub(crate) locks: locks::WagerLocks,
    pub(crate) starting_money: i64,
}

impl Engine {
    /// Return a builder for `Engine`.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn wagers(&self) -> &WagerStore {
        &self.wagers
    }

    /// Permanent link for a wager's announcement, empty while no
    /// announcement is attached.
    pub(crate) fn link_for(&self, wager: &Wager) -> String {
        wager
            .message_id
            .map(|message_id| {
                self.chat
                    .message_link(wager.community_id, wager.channel_id, message_id)
            })
            .unwrap_or_default()
    }
}

/// The builder for `Engine`.
#[derive(Default)]
pub struct EngineBuilder {
    database: DatabaseConnection,
    chat: Option<Arc<dyn ChatPort>>,
    starting_money: Option<i64>,
}

impl EngineBuilder {
    /// Pass the required database.
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// Pass the required outbound messaging capability.
    pub fn chat(mut self, chat: Arc<dyn ChatPort>) -> EngineBuilder {
        self.chat = Some(chat);
        self
    }

    /// Balance granted to a user on first contact.
    pub fn starting_money(mut self, amount: i64) -> EngineBuilder {
        self.starting_money = Some(amount);
        self
    }

    /// Construct `Engine`.
    pub fn build(self) -> Result<Engine, String> {
        let chat = self.chat.ok_or_else(|| "missing chat port".to_string())?;
        Ok(Engine {
            ledger: Ledger::new(self.database.clone()),
            wagers: WagerStore::new(self.database.clone()),
            database: self.database,
            chat,
            locks: locks::WagerLocks::default(),
            starting_money: self.starting_money.unwrap_or(DEFAULT_STARTING_MONEY),
        })
    }
}
