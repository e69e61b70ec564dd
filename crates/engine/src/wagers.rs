//! Wager records and their status transitions.
//!
//! The `WagerStore` is the system of record for the wager state machine:
//! Proposed (`accepted=false, completed=false`) -> Accepted -> Complete, with
//! deletion from Proposed/Accepted on cancellation. All mutation goes through
//! the store; the settlement and lifecycle layers never assign fields
//! directly.
//!
//! `accept` and `complete` are conditional updates: the status filters are
//! part of the `UPDATE ... WHERE` clause, so when two events race on the same
//! wager exactly one sees `rows_affected == 1` and the other observes a
//! failed transition.

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveValue, Condition, ConnectionTrait, DatabaseConnection, QueryFilter, QueryOrder,
    entity::prelude::*, sea_query::Expr,
};

use crate::{ChannelId, CommunityId, EngineError, MessageId, ResultEngine, UserId, WagerId};

/// Derived lifecycle status, for listings.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WagerStatus {
    Created,
    Accepted,
    Complete,
}

/// A two-party bet with an amount, a free-text condition and a lifecycle
/// status.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Wager {
    pub id: WagerId,
    pub community_id: CommunityId,
    pub channel_id: ChannelId,
    /// Correlation key mapping marker events back to this wager. `None`
    /// until the announcement has been posted; the wager is unreachable by
    /// marker events before that.
    pub message_id: Option<MessageId>,
    pub creator_id: UserId,
    pub amount: i64,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub taker_id: Option<UserId>,
    pub accepted: bool,
    pub completed: bool,
    pub winner_id: Option<UserId>,
    pub loser_id: Option<UserId>,
}

impl Wager {
    pub fn status(&self) -> WagerStatus {
        if self.completed {
            WagerStatus::Complete
        } else if self.accepted {
            WagerStatus::Accepted
        } else {
            WagerStatus::Created
        }
    }

    pub fn is_participant(&self, user_id: UserId) -> bool {
        self.creator_id == user_id || self.taker_id == Some(user_id)
    }

    /// The other party of the wager, if `user_id` is a participant and the
    /// counterpart exists.
    pub fn counterparty(&self, user_id: UserId) -> Option<UserId> {
        if self.creator_id == user_id {
            self.taker_id
        } else if self.taker_id == Some(user_id) {
            Some(self.creator_id)
        } else {
            None
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "wagers")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub community_id: i64,
    pub channel_id: i64,
    pub message_id: Option<i64>,
    pub creator_id: i64,
    pub amount: i64,
    pub description: String,
    pub created_at: DateTimeUtc,
    pub taker_id: Option<i64>,
    pub accepted: bool,
    pub completed: bool,
    pub winner_id: Option<i64>,
    pub loser_id: Option<i64>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Wager {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            community_id: model.community_id,
            channel_id: model.channel_id,
            message_id: model.message_id,
            creator_id: model.creator_id,
            amount: model.amount,
            description: model.description,
            created_at: model.created_at,
            taker_id: model.taker_id,
            accepted: model.accepted,
            completed: model.completed,
            winner_id: model.winner_id,
            loser_id: model.loser_id,
        }
    }
}

/// Owns creation and mutation of wager records.
#[derive(Clone, Debug)]
pub struct WagerStore {
    database: DatabaseConnection,
}

impl WagerStore {
    pub fn new(database: DatabaseConnection) -> Self {
        Self { database }
    }

    /// Persist a new wager in the Proposed state. The caller must have
    /// already checked affordability.
    pub async fn create_within<C: ConnectionTrait>(
        &self,
        conn: &C,
        community_id: CommunityId,
        channel_id: ChannelId,
        creator_id: UserId,
        amount: i64,
        description: &str,
    ) -> ResultEngine<Wager> {
        if amount < 1 {
            return Err(EngineError::InvalidAmount(format!(
                "wager amount must be >= 1, got {amount}"
            )));
        }

        let model = ActiveModel {
            id: ActiveValue::NotSet,
            community_id: ActiveValue::Set(community_id),
            channel_id: ActiveValue::Set(channel_id),
            message_id: ActiveValue::Set(None),
            creator_id: ActiveValue::Set(creator_id),
            amount: ActiveValue::Set(amount),
            description: ActiveValue::Set(description.to_string()),
            created_at: ActiveValue::Set(Utc::now()),
            taker_id: ActiveValue::Set(None),
            accepted: ActiveValue::Set(false),
            completed: ActiveValue::Set(false),
            winner_id: ActiveValue::Set(None),
            loser_id: ActiveValue::Set(None),
        }
        .insert(conn)
        .await?;

        Ok(model.into())
    }

    pub async fn create(
        &self,
        community_id: CommunityId,
        channel_id: ChannelId,
        creator_id: UserId,
        amount: i64,
        description: &str,
    ) -> ResultEngine<Wager> {
        self.create_within(
            &self.database,
            community_id,
            channel_id,
            creator_id,
            amount,
            description,
        )
        .await
    }

    /// Record the announcement message id once the outward post succeeded.
    /// Required before the wager becomes reachable by marker events.
    pub async fn attach_announcement(
        &self,
        wager_id: WagerId,
        message_id: MessageId,
    ) -> ResultEngine<()> {
        let updated = Entity::update_many()
            .col_expr(Column::MessageId, Expr::value(Some(message_id)))
            .filter(Column::Id.eq(wager_id))
            .exec(&self.database)
            .await?;
        if updated.rows_affected == 0 {
            return Err(EngineError::InvalidTransition(format!(
                "wager {wager_id} not found"
            )));
        }
        Ok(())
    }

    pub async fn get(&self, wager_id: WagerId) -> ResultEngine<Option<Wager>> {
        let model = Entity::find_by_id(wager_id).one(&self.database).await?;
        Ok(model.map(Wager::from))
    }

    /// Proposed wager correlated to an announcement message, if any.
    pub async fn find_proposed_by_announcement(
        &self,
        message_id: MessageId,
    ) -> ResultEngine<Option<Wager>> {
        let model = Entity::find()
            .filter(Column::MessageId.eq(message_id))
            .filter(Column::Accepted.eq(false))
            .filter(Column::Completed.eq(false))
            .one(&self.database)
            .await?;
        Ok(model.map(Wager::from))
    }

    /// Accepted, not-completed wager correlated to an announcement message.
    pub async fn find_accepted_by_announcement(
        &self,
        message_id: MessageId,
    ) -> ResultEngine<Option<Wager>> {
        let model = Entity::find()
            .filter(Column::MessageId.eq(message_id))
            .filter(Column::Accepted.eq(true))
            .filter(Column::Completed.eq(false))
            .one(&self.database)
            .await?;
        Ok(model.map(Wager::from))
    }

    /// Record the taker. Returns `false` when the transition was not legal
    /// anymore (already accepted or completed, deleted, or taker equals
    /// creator) - i.e. this call lost the race.
    pub async fn accept_within<C: ConnectionTrait>(
        &self,
        conn: &C,
        wager_id: WagerId,
        taker_id: UserId,
    ) -> ResultEngine<bool> {
        let updated = Entity::update_many()
            .col_expr(Column::TakerId, Expr::value(Some(taker_id)))
            .col_expr(Column::Accepted, Expr::value(true))
            .filter(Column::Id.eq(wager_id))
            .filter(Column::Accepted.eq(false))
            .filter(Column::Completed.eq(false))
            .filter(Column::CreatorId.ne(taker_id))
            .exec(conn)
            .await?;
        Ok(updated.rows_affected == 1)
    }

    pub async fn accept(&self, wager_id: WagerId, taker_id: UserId) -> ResultEngine<()> {
        if self.accept_within(&self.database, wager_id, taker_id).await? {
            Ok(())
        } else {
            Err(EngineError::InvalidTransition(format!(
                "wager {wager_id} is not open for acceptance"
            )))
        }
    }

    /// Mark the wager completed with the given result. Legal only from the
    /// Accepted state and only when `{winner, loser}` equals
    /// `{creator, taker}`. Returns `false` when the wager was already
    /// settled or the result does not match the participants.
    pub async fn complete_within<C: ConnectionTrait>(
        &self,
        conn: &C,
        wager_id: WagerId,
        winner_id: UserId,
        loser_id: UserId,
    ) -> ResultEngine<bool> {
        let participants_match = Condition::any()
            .add(
                Condition::all()
                    .add(Column::CreatorId.eq(winner_id))
                    .add(Column::TakerId.eq(loser_id)),
            )
            .add(
                Condition::all()
                    .add(Column::CreatorId.eq(loser_id))
                    .add(Column::TakerId.eq(winner_id)),
            );

        let updated = Entity::update_many()
            .col_expr(Column::Completed, Expr::value(true))
            .col_expr(Column::WinnerId, Expr::value(Some(winner_id)))
            .col_expr(Column::LoserId, Expr::value(Some(loser_id)))
            .filter(Column::Id.eq(wager_id))
            .filter(Column::Accepted.eq(true))
            .filter(Column::Completed.eq(false))
            .filter(participants_match)
            .exec(conn)
            .await?;
        Ok(updated.rows_affected == 1)
    }

    pub async fn complete(
        &self,
        wager_id: WagerId,
        winner_id: UserId,
        loser_id: UserId,
    ) -> ResultEngine<()> {
        if self
            .complete_within(&self.database, wager_id, winner_id, loser_id)
            .await?
        {
            Ok(())
        } else {
            Err(EngineError::InvalidTransition(format!(
                "wager {wager_id} cannot be completed with winner {winner_id}"
            )))
        }
    }

    /// Delete the record. Legal only while not completed.
    pub async fn cancel(&self, wager_id: WagerId) -> ResultEngine<()> {
        let deleted = Entity::delete_many()
            .filter(Column::Id.eq(wager_id))
            .filter(Column::Completed.eq(false))
            .exec(&self.database)
            .await?;
        if deleted.rows_affected == 0 {
            return Err(EngineError::InvalidTransition(format!(
                "wager {wager_id} is not cancellable"
            )));
        }
        Ok(())
    }

    /// Cancellation authorization: the wager must exist, not be completed
    /// and belong to the requesting creator.
    pub async fn find_for_cancel(
        &self,
        wager_id: WagerId,
        creator_id: UserId,
    ) -> ResultEngine<Option<Wager>> {
        let model = Entity::find()
            .filter(Column::Id.eq(wager_id))
            .filter(Column::CreatorId.eq(creator_id))
            .filter(Column::Completed.eq(false))
            .one(&self.database)
            .await?;
        Ok(model.map(Wager::from))
    }

    pub async fn created_by(&self, user_id: UserId) -> ResultEngine<Vec<Wager>> {
        let models = Entity::find()
            .filter(Column::CreatorId.eq(user_id))
            .order_by_asc(Column::Id)
            .all(&self.database)
            .await?;
        Ok(models.into_iter().map(Wager::from).collect())
    }

    pub async fn accepted_by(&self, user_id: UserId) -> ResultEngine<Vec<Wager>> {
        let models = Entity::find()
            .filter(Column::TakerId.eq(user_id))
            .order_by_asc(Column::Id)
            .all(&self.database)
            .await?;
        Ok(models.into_iter().map(Wager::from).collect())
    }

    /// Not-completed wagers created by the user, for the cancel listing.
    pub async fn open_created_by(&self, user_id: UserId) -> ResultEngine<Vec<Wager>> {
        let models = Entity::find()
            .filter(Column::CreatorId.eq(user_id))
            .filter(Column::Completed.eq(false))
            .order_by_asc(Column::Id)
            .all(&self.database)
            .await?;
        Ok(models.into_iter().map(Wager::from).collect())
    }

    /// Not-completed wagers in one community where the user is creator or
    /// taker, for departure cleanup.
    pub async fn open_for_participant_in(
        &self,
        community_id: CommunityId,
        user_id: UserId,
    ) -> ResultEngine<Vec<Wager>> {
        let models = Entity::find()
            .filter(Column::CommunityId.eq(community_id))
            .filter(Column::Completed.eq(false))
            .filter(
                Condition::any()
                    .add(Column::CreatorId.eq(user_id))
                    .add(Column::TakerId.eq(user_id)),
            )
            .order_by_asc(Column::Id)
            .all(&self.database)
            .await?;
        Ok(models.into_iter().map(Wager::from).collect())
    }
}
