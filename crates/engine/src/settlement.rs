//! Marker reconciliation and settlement.
//!
//! Every marker event triggers a re-evaluation of the *entire current*
//! marker state on the announcement message, not just the triggering
//! delta. This is deliberate: re-aggregation is self-healing against missed
//! events, because the next marker event recomputes the same answer from
//! scratch.

use sea_orm::TransactionTrait;

use crate::{
    Engine, EngineError, MarkerKind, MessageId, ResultEngine, UserId,
    chat::{name_or_id, notify},
    text,
    wagers::Wager,
};

/// Participants of a wager currently showing one marker.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Candidate {
    Nobody,
    One(UserId),
    Several,
}

/// Restrict the raw reactor set to the wager's participants.
fn sole_candidate(wager: &Wager, users: &[UserId]) -> Candidate {
    let mut participants = vec![wager.creator_id];
    participants.extend(wager.taker_id);

    let mut hits = participants
        .into_iter()
        .filter(|participant| users.contains(participant));
    match (hits.next(), hits.next()) {
        (None, _) => Candidate::Nobody,
        (Some(user_id), None) => Candidate::One(user_id),
        (Some(_), Some(_)) => Candidate::Several,
    }
}

impl Engine {
    /// Entry point for an inbound marker event.
    pub async fn on_marker_added(
        &self,
        marker: MarkerKind,
        message_id: MessageId,
        acting_user_id: UserId,
    ) -> ResultEngine<()> {
        match marker {
            MarkerKind::Accept => self.handle_accept(message_id, acting_user_id).await,
            MarkerKind::Win | MarkerKind::Lose => self.handle_result(message_id).await,
        }
    }

    /// Accept protocol: the marker must come from someone other than the
    /// creator, on a Proposed wager, and the taker must be able to cover
    /// the amount on top of their outstanding commitments.
    async fn handle_accept(
        &self,
        message_id: MessageId,
        acting_user_id: UserId,
    ) -> ResultEngine<()> {
        let Some(located) = self.wagers.find_proposed_by_announcement(message_id).await? else {
            // Marker on an unrelated or no-longer-proposed message.
            return Ok(());
        };

        let _guard = self.locks.acquire(located.id).await;
        // Re-read under the per-wager lock: the first read only located the
        // wager, the state may have moved since.
        let Some(wager) = self.wagers.find_proposed_by_announcement(message_id).await? else {
            return Ok(());
        };

        if wager.creator_id == acting_user_id {
            self.retract_marker(&wager, MarkerKind::Accept, acting_user_id)
                .await;
            notify(self.chat.as_ref(), acting_user_id, &text::self_acceptance()).await;
            return Err(EngineError::SelfAcceptance);
        }

        // Unreachable given creation-time validation, but the store is not
        // the only writer of historic rows.
        if wager.amount < 1 {
            notify(
                self.chat.as_ref(),
                acting_user_id,
                &text::not_a_real_bet(wager.amount),
            )
            .await;
            return Err(EngineError::InvalidAmount(format!(
                "wager {} has amount {}",
                wager.id, wager.amount
            )));
        }

        let acceptor = match self.find_or_create_user(acting_user_id).await {
            Ok(provisioned) => provisioned.into_user(),
            Err(err) => {
                tracing::error!("provisioning acceptor {acting_user_id} failed: {err}");
                if let Err(post_err) = self
                    .chat
                    .post_announcement(wager.channel_id, &text::provisioning_failed())
                    .await
                {
                    tracing::warn!("provisioning failure notice failed: {post_err}");
                }
                return Err(err);
            }
        };

        let txn = self.database.begin().await?;
        if !self
            .ledger
            .can_afford_within(&txn, acceptor.id, wager.amount)
            .await?
        {
            let summary = self.ledger.summary_within(&txn, acceptor.id).await?;
            txn.rollback().await?;
            self.retract_marker(&wager, MarkerKind::Accept, acceptor.id)
                .await;
            notify(
                self.chat.as_ref(),
                acceptor.id,
                &text::cannot_afford_accept(&wager, &summary),
            )
            .await;
            return Err(EngineError::InsufficientFunds(format!(
                "cannot cover a wager of {}",
                wager.amount
            )));
        }
        let accepted = self.wagers.accept_within(&txn, wager.id, acceptor.id).await?;
        txn.commit().await?;

        if !accepted {
            tracing::debug!("accept of wager {} by {} lost a race", wager.id, acceptor.id);
            return Ok(());
        }

        let creator_name = name_or_id(self.chat.as_ref(), wager.creator_id).await;
        let taker_name = name_or_id(self.chat.as_ref(), acceptor.id).await;

        let mut accepted_wager = wager.clone();
        accepted_wager.taker_id = Some(acceptor.id);
        accepted_wager.accepted = true;

        if let Err(err) = self
            .chat
            .edit_message(
                wager.channel_id,
                message_id,
                &text::accepted_announcement(&creator_name, &taker_name, &accepted_wager),
            )
            .await
        {
            tracing::warn!("acceptance edit of message {message_id} failed: {err}");
        }
        for marker in [MarkerKind::Win, MarkerKind::Lose] {
            if let Err(err) = self
                .chat
                .add_marker(wager.channel_id, message_id, marker)
                .await
            {
                tracing::warn!("pre-filling {} marker failed: {err}", marker.as_str());
            }
        }

        let link = self.link_for(&accepted_wager);
        notify(
            self.chat.as_ref(),
            acceptor.id,
            &text::accepted_taker_notice(&creator_name, &accepted_wager, &link),
        )
        .await;
        notify(
            self.chat.as_ref(),
            wager.creator_id,
            &text::accepted_creator_notice(&taker_name, &link),
        )
        .await;

        Ok(())
    }

    /// Win/Lose resolution: re-aggregate the full marker state and settle
    /// when exactly one participant claims each side and they differ.
    async fn handle_result(&self, message_id: MessageId) -> ResultEngine<()> {
        let Some(wager) = self.wagers.find_accepted_by_announcement(message_id).await? else {
            return Ok(());
        };
        let _guard = self.locks.acquire(wager.id).await;
        // Idempotent guard: the wager may have been settled or canceled
        // while we waited for the lock.
        let Some(wager) = self.wagers.find_accepted_by_announcement(message_id).await? else {
            return Ok(());
        };

        let win_users = match self
            .chat
            .marker_users(wager.channel_id, message_id, MarkerKind::Win)
            .await
        {
            Ok(users) => users,
            Err(err) => {
                // The next marker event re-aggregates from scratch.
                tracing::warn!("reading win markers on {message_id} failed: {err}");
                return Ok(());
            }
        };
        let winner = match sole_candidate(&wager, &win_users) {
            Candidate::Several => {
                // Both participants claim the win: clear the marker and make
                // them re-react.
                self.clear_marker(&wager, MarkerKind::Win).await;
                return Ok(());
            }
            Candidate::One(user_id) => Some(user_id),
            Candidate::Nobody => None,
        };

        let lose_users = match self
            .chat
            .marker_users(wager.channel_id, message_id, MarkerKind::Lose)
            .await
        {
            Ok(users) => users,
            Err(err) => {
                tracing::warn!("reading lose markers on {message_id} failed: {err}");
                return Ok(());
            }
        };
        let loser = match sole_candidate(&wager, &lose_users) {
            Candidate::Several => {
                self.clear_marker(&wager, MarkerKind::Lose).await;
                return Ok(());
            }
            Candidate::One(user_id) => Some(user_id),
            Candidate::Nobody => None,
        };

        match (winner, loser) {
            (Some(winner_id), Some(loser_id)) if winner_id == loser_id => {
                // One person cannot both win and lose: retract both of their
                // markers and wait for a coherent claim.
                self.retract_marker(&wager, MarkerKind::Win, winner_id).await;
                self.retract_marker(&wager, MarkerKind::Lose, winner_id).await;
                Ok(())
            }
            (Some(winner_id), Some(_)) => self.resolve(&wager, winner_id).await,
            // Only one side resolved so far; wait for the counterpart event.
            _ => Ok(()),
        }
    }

    /// Completion step: transfer the amount and mark the wager completed as
    /// one unit. Re-running against an already-settled wager is a no-op.
    pub(crate) async fn resolve(&self, wager: &Wager, winner_id: UserId) -> ResultEngine<()> {
        let Some(taker_id) = wager.taker_id else {
            return Err(EngineError::InvalidTransition(format!(
                "wager {} has no taker to settle against",
                wager.id
            )));
        };
        let loser_id = if winner_id == wager.creator_id {
            taker_id
        } else {
            wager.creator_id
        };

        let txn = self.database.begin().await?;
        if !self
            .wagers
            .complete_within(&txn, wager.id, winner_id, loser_id)
            .await?
        {
            // Already settled, or the result does not match the
            // participants anymore.
            txn.rollback().await?;
            return Ok(());
        }
        self.ledger.credit_within(&txn, winner_id, wager.amount).await?;
        self.ledger.debit_within(&txn, loser_id, wager.amount).await?;
        txn.commit().await?;

        let creator_name = name_or_id(self.chat.as_ref(), wager.creator_id).await;
        let winner_name = name_or_id(self.chat.as_ref(), winner_id).await;
        let loser_name = name_or_id(self.chat.as_ref(), loser_id).await;

        if let Some(message_id) = wager.message_id {
            if let Err(err) = self
                .chat
                .edit_message(
                    wager.channel_id,
                    message_id,
                    &text::resolved_announcement(&creator_name, &winner_name, &loser_name, wager),
                )
                .await
            {
                tracing::warn!("result edit of message {message_id} failed: {err}");
            }
        }

        let link = self.link_for(wager);
        notify(
            self.chat.as_ref(),
            winner_id,
            &text::won_notice(&loser_name, wager.amount, &link),
        )
        .await;
        notify(
            self.chat.as_ref(),
            loser_id,
            &text::lost_notice(&winner_name, wager.amount, &link),
        )
        .await;

        Ok(())
    }

    async fn retract_marker(&self, wager: &Wager, marker: MarkerKind, user_id: UserId) {
        let Some(message_id) = wager.message_id else {
            return;
        };
        if let Err(err) = self
            .chat
            .remove_marker_for_user(wager.channel_id, message_id, marker, user_id)
            .await
        {
            tracing::warn!(
                "retracting {} marker of {user_id} on {message_id} failed: {err}",
                marker.as_str()
            );
        }
    }

    async fn clear_marker(&self, wager: &Wager, marker: MarkerKind) {
        let Some(message_id) = wager.message_id else {
            return;
        };
        if let Err(err) = self
            .chat
            .clear_marker(wager.channel_id, message_id, marker)
            .await
        {
            tracing::warn!(
                "clearing {} marker on {message_id} failed: {err}",
                marker.as_str()
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn accepted_wager() -> Wager {
        Wager {
            id: 1,
            community_id: 1,
            channel_id: 2,
            message_id: Some(3),
            creator_id: 10,
            amount: 30,
            description: "rain tomorrow".to_string(),
            created_at: Utc::now(),
            taker_id: Some(20),
            accepted: true,
            completed: false,
            winner_id: None,
            loser_id: None,
        }
    }

    #[test]
    fn non_participants_are_ignored() {
        let wager = accepted_wager();
        assert_eq!(sole_candidate(&wager, &[99, 42]), Candidate::Nobody);
        assert_eq!(sole_candidate(&wager, &[99, 20]), Candidate::One(20));
    }

    #[test]
    fn both_participants_is_ambiguous() {
        let wager = accepted_wager();
        assert_eq!(sole_candidate(&wager, &[10, 20]), Candidate::Several);
        assert_eq!(sole_candidate(&wager, &[20, 99, 10]), Candidate::Several);
    }

    #[test]
    fn missing_taker_cannot_be_a_candidate() {
        let mut wager = accepted_wager();
        wager.taker_id = None;
        assert_eq!(sole_candidate(&wager, &[20]), Candidate::Nobody);
        assert_eq!(sole_candidate(&wager, &[10]), Candidate::One(10));
    }
}
