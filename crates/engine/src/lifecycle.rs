//! Wager lifecycle orchestration.
//!
//! Creation, cancellation, participant-departure cleanup and the read-only
//! command surface (listings, balance). State transitions go through the
//! [`WagerStore`](crate::WagerStore) and [`Ledger`](crate::Ledger); outward
//! notices are fire-and-forget and never roll back a committed transition.

use sea_orm::TransactionTrait;

use crate::{
    ChannelId, CommunityId, Engine, EngineError, MarkerKind, ResultEngine, UserId, WagerId,
    chat::{name_or_id, notify},
    text,
    users::User,
    wagers::Wager,
};

/// Context a create-wager request originated from. Wagers are
/// community-only; direct-message requests are rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MessageOrigin {
    Community {
        community_id: CommunityId,
        channel_id: ChannelId,
    },
    Direct,
}

/// Outcome of user provisioning. Callers must handle creation explicitly;
/// there is no silent fallthrough on lookup failure.
#[derive(Clone, Debug)]
pub enum Provisioned {
    Found(User),
    Created(User),
}

impl Provisioned {
    pub fn user(&self) -> &User {
        match self {
            Self::Found(user) | Self::Created(user) => user,
        }
    }

    pub fn into_user(self) -> User {
        match self {
            Self::Found(user) | Self::Created(user) => user,
        }
    }
}

/// Created and accepted wagers of one user, for listings.
#[derive(Clone, Debug, Default)]
pub struct UserWagers {
    pub created: Vec<Wager>,
    pub accepted: Vec<Wager>,
}

impl Engine {
    /// Return the existing ledger entry for a user, or materialize one with
    /// the configured starting balance and send the welcome notice.
    ///
    /// A failed welcome notice is logged and swallowed; only a database
    /// failure fails provisioning.
    pub async fn find_or_create_user(&self, user_id: UserId) -> ResultEngine<Provisioned> {
        if let Some(user) = self.ledger.find(user_id).await? {
            return Ok(Provisioned::Found(user));
        }

        let user = self
            .ledger
            .create(&User::new(user_id, self.starting_money))
            .await
            .map_err(|err| EngineError::UserProvisioning(err.to_string()))?;
        notify(self.chat.as_ref(), user.id, &text::welcome()).await;
        Ok(Provisioned::Created(user))
    }

    /// Create a wager, post its announcement and pre-fill the accept marker.
    ///
    /// The affordability check and the insert share one database
    /// transaction so a concurrent commitment cannot slip in between.
    pub async fn create_wager(
        &self,
        origin: MessageOrigin,
        creator_id: UserId,
        amount: i64,
        description: &str,
    ) -> ResultEngine<Wager> {
        let MessageOrigin::Community {
            community_id,
            channel_id,
        } = origin
        else {
            notify(self.chat.as_ref(), creator_id, &text::direct_message_context()).await;
            return Err(EngineError::UnsupportedContext(
                "wagers are community-only".to_string(),
            ));
        };

        let creator = match self.find_or_create_user(creator_id).await {
            Ok(provisioned) => provisioned.into_user(),
            Err(err) => {
                tracing::error!("provisioning creator {creator_id} failed: {err}");
                notify(self.chat.as_ref(), creator_id, &text::provisioning_failed()).await;
                return Err(err);
            }
        };

        if amount < 1 {
            notify(self.chat.as_ref(), creator.id, &text::not_a_real_bet(amount)).await;
            return Err(EngineError::InvalidAmount(format!(
                "wager amount must be >= 1, got {amount}"
            )));
        }

        let txn = self.database.begin().await?;
        if !self
            .ledger
            .can_afford_within(&txn, creator.id, amount)
            .await?
        {
            let summary = self.ledger.summary_within(&txn, creator.id).await?;
            txn.rollback().await?;
            notify(
                self.chat.as_ref(),
                creator.id,
                &text::cannot_afford_create(&summary),
            )
            .await;
            return Err(EngineError::InsufficientFunds(format!(
                "cannot cover a wager of {amount}"
            )));
        }
        let mut wager = self
            .wagers
            .create_within(&txn, community_id, channel_id, creator.id, amount, description)
            .await?;
        txn.commit().await?;

        let creator_name = name_or_id(self.chat.as_ref(), creator.id).await;
        let message_id = match self
            .chat
            .post_announcement(channel_id, &text::proposed_announcement(&creator_name, &wager))
            .await
        {
            Ok(message_id) => message_id,
            Err(err) => {
                // No announcement, no commitment: the row must not stay
                // behind holding the amount outstanding.
                if let Err(delete_err) = self.wagers.cancel(wager.id).await {
                    tracing::error!(
                        "removing unannounced wager {} failed: {delete_err}",
                        wager.id
                    );
                }
                return Err(EngineError::Chat(err));
            }
        };
        self.wagers.attach_announcement(wager.id, message_id).await?;
        wager.message_id = Some(message_id);

        if let Err(err) = self
            .chat
            .add_marker(channel_id, message_id, MarkerKind::Accept)
            .await
        {
            tracing::warn!("pre-filling accept marker on {message_id} failed: {err}");
        }

        Ok(wager)
    }

    /// Cancel requested wagers; with no ids, send the requester the list of
    /// their outstanding created wagers and the ids to cancel them with.
    pub async fn cancel_wagers(&self, user_id: UserId, wager_ids: &[WagerId]) -> ResultEngine<()> {
        let user = self.find_or_create_user(user_id).await?.into_user();

        if wager_ids.is_empty() {
            let open = self.wagers.open_created_by(user.id).await?;
            let mut content = text::cancellable_header();
            for wager in &open {
                content.push_str(&text::cancellable_entry(wager, &self.link_for(wager)));
            }
            notify(self.chat.as_ref(), user.id, &content).await;
            return Ok(());
        }

        for &wager_id in wager_ids {
            if let Err(err) = self.cancel_wager(wager_id, user.id).await {
                tracing::debug!("cancel of wager {wager_id} by {user_id} rejected: {err}");
            }
        }
        Ok(())
    }

    /// Cancel a single wager. Legal only for its creator and only while the
    /// wager is not completed; cancellation performs no balance transfer.
    pub async fn cancel_wager(
        &self,
        wager_id: WagerId,
        requesting_user_id: UserId,
    ) -> ResultEngine<()> {
        let Some(wager) = self
            .wagers
            .find_for_cancel(wager_id, requesting_user_id)
            .await?
        else {
            notify(
                self.chat.as_ref(),
                requesting_user_id,
                &text::no_wager_found(wager_id),
            )
            .await;
            return Err(EngineError::InvalidTransition(format!(
                "wager {wager_id} is not cancellable by {requesting_user_id}"
            )));
        };

        let _guard = self.locks.acquire(wager.id).await;
        self.wagers.cancel(wager.id).await?;

        self.strike_announcement(&wager).await;
        notify(
            self.chat.as_ref(),
            requesting_user_id,
            &text::canceled_notice(wager_id),
        )
        .await;
        Ok(())
    }

    /// Force-cancel every open wager of a member who left the community,
    /// notifying the counterparty rather than the departed user.
    pub async fn handle_member_removed(
        &self,
        community_id: CommunityId,
        user_id: UserId,
    ) -> ResultEngine<()> {
        let open = self
            .wagers
            .open_for_participant_in(community_id, user_id)
            .await?;

        for wager in open {
            let _guard = self.locks.acquire(wager.id).await;
            match self.wagers.cancel(wager.id).await {
                Ok(()) => {}
                // Settled or canceled since we listed it; nothing to do.
                Err(EngineError::InvalidTransition(_)) => continue,
                Err(err) => return Err(err),
            }

            self.strike_announcement(&wager).await;
            if let Some(counterparty) = wager.counterparty(user_id) {
                let departed_name = name_or_id(self.chat.as_ref(), user_id).await;
                notify(
                    self.chat.as_ref(),
                    counterparty,
                    &text::counterparty_canceled_notice(&departed_name, &wager),
                )
                .await;
            }
        }
        Ok(())
    }

    /// Created and accepted wagers for one user. Pure read.
    pub async fn wager_overview(&self, user_id: UserId) -> ResultEngine<UserWagers> {
        Ok(UserWagers {
            created: self.wagers.created_by(user_id).await?,
            accepted: self.wagers.accepted_by(user_id).await?,
        })
    }

    /// Send the user their wager listing as direct notices.
    pub async fn send_wager_list(&self, user_id: UserId) -> ResultEngine<()> {
        let user = self.find_or_create_user(user_id).await?.into_user();
        let overview = self.wager_overview(user.id).await?;

        if overview.created.is_empty() && overview.accepted.is_empty() {
            notify(self.chat.as_ref(), user.id, &text::list_empty()).await;
            return Ok(());
        }

        if !overview.created.is_empty() {
            let mut content = text::list_created_header();
            for wager in &overview.created {
                let counterparty_name = match wager.taker_id {
                    Some(taker_id) => name_or_id(self.chat.as_ref(), taker_id).await,
                    None => "Nobody".to_string(),
                };
                let winner_name = winner_label(wager, user.id, &counterparty_name);
                content.push_str(&text::list_entry(
                    wager,
                    "Accepted by",
                    &counterparty_name,
                    winner_name.as_deref(),
                    &self.link_for(wager),
                ));
            }
            notify(self.chat.as_ref(), user.id, &content).await;
        }

        if !overview.accepted.is_empty() {
            let mut content = text::list_accepted_header();
            for wager in &overview.accepted {
                let creator_name = name_or_id(self.chat.as_ref(), wager.creator_id).await;
                let winner_name = winner_label(wager, user.id, &creator_name);
                content.push_str(&text::list_entry(
                    wager,
                    "Created by",
                    &creator_name,
                    winner_name.as_deref(),
                    &self.link_for(wager),
                ));
            }
            notify(self.chat.as_ref(), user.id, &content).await;
        }

        Ok(())
    }

    /// Send the user their money/outstanding/available breakdown.
    pub async fn send_balance(&self, user_id: UserId) -> ResultEngine<()> {
        let user = self.find_or_create_user(user_id).await?.into_user();
        let summary = self.ledger.summary(user.id).await?;
        notify(self.chat.as_ref(), user.id, &text::balance_notice(&summary)).await;
        Ok(())
    }

    /// Credit every known user, called by the periodic allowance task.
    pub async fn distribute_allowance(&self, amount: i64) -> ResultEngine<u64> {
        let credited = self.ledger.credit_all(amount).await?;
        tracing::info!("credited {amount} to {credited} users");
        Ok(credited)
    }

    /// Strike through a canceled announcement. The message content is
    /// rebuilt from the wager state rather than read back from the
    /// platform.
    async fn strike_announcement(&self, wager: &Wager) {
        let Some(message_id) = wager.message_id else {
            return;
        };

        let creator_name = name_or_id(self.chat.as_ref(), wager.creator_id).await;
        let content = match wager.taker_id {
            Some(taker_id) if wager.accepted => {
                let taker_name = name_or_id(self.chat.as_ref(), taker_id).await;
                text::accepted_announcement(&creator_name, &taker_name, wager)
            }
            _ => text::proposed_announcement(&creator_name, wager),
        };

        if let Err(err) = self
            .chat
            .edit_message(wager.channel_id, message_id, &text::struck(&content))
            .await
        {
            tracing::warn!("strike-through edit of message {message_id} failed: {err}");
        }
    }
}

fn winner_label(wager: &Wager, viewer_id: UserId, counterparty_name: &str) -> Option<String> {
    if !wager.completed {
        return None;
    }
    if wager.winner_id == Some(viewer_id) {
        Some("You".to_string())
    } else {
        Some(counterparty_name.to_string())
    }
}
