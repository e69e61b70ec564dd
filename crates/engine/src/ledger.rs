//! Balance bookkeeping.
//!
//! The ledger owns user balances and the outstanding-amount computation.
//! `credit`/`debit` are unconditional side effects; validation happens
//! upstream (`can_afford` before a new commitment is created, never
//! retroactively). The `*_within` variants run against a caller-provided
//! connection so affordability checks and settlement transfers can share a
//! database transaction with the wager-state transition.

use sea_orm::{
    ConnectionTrait, DatabaseConnection, QueryFilter, Statement, entity::prelude::*,
    sea_query::Expr,
};

use crate::{EngineError, ResultEngine, UserId, users, users::User};

/// Snapshot of a user's money for notices: total, committed and available.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BalanceSummary {
    pub money: i64,
    pub outstanding: i64,
}

impl BalanceSummary {
    pub fn available(&self) -> i64 {
        self.money - self.outstanding
    }
}

#[derive(Clone, Debug)]
pub struct Ledger {
    database: DatabaseConnection,
}

impl Ledger {
    pub fn new(database: DatabaseConnection) -> Self {
        Self { database }
    }

    pub async fn find(&self, user_id: UserId) -> ResultEngine<Option<User>> {
        let model = users::Entity::find_by_id(user_id).one(&self.database).await?;
        Ok(model.map(User::from))
    }

    pub async fn get_within<C: ConnectionTrait>(
        &self,
        conn: &C,
        user_id: UserId,
    ) -> ResultEngine<User> {
        users::Entity::find_by_id(user_id)
            .one(conn)
            .await?
            .map(User::from)
            .ok_or(EngineError::UserNotFound(user_id))
    }

    pub async fn get(&self, user_id: UserId) -> ResultEngine<User> {
        self.get_within(&self.database, user_id).await
    }

    /// Materialize a ledger entry for a user seen for the first time.
    pub async fn create(&self, user: &User) -> ResultEngine<User> {
        let model = users::ActiveModel::from(user).insert(&self.database).await?;
        Ok(model.into())
    }

    pub async fn credit_within<C: ConnectionTrait>(
        &self,
        conn: &C,
        user_id: UserId,
        amount: i64,
    ) -> ResultEngine<()> {
        let updated = users::Entity::update_many()
            .col_expr(
                users::Column::Money,
                Expr::col(users::Column::Money).add(amount),
            )
            .filter(users::Column::Id.eq(user_id))
            .exec(conn)
            .await?;
        if updated.rows_affected == 0 {
            return Err(EngineError::UserNotFound(user_id));
        }
        Ok(())
    }

    pub async fn debit_within<C: ConnectionTrait>(
        &self,
        conn: &C,
        user_id: UserId,
        amount: i64,
    ) -> ResultEngine<()> {
        self.credit_within(conn, user_id, -amount).await
    }

    pub async fn credit(&self, user_id: UserId, amount: i64) -> ResultEngine<()> {
        self.credit_within(&self.database, user_id, amount).await
    }

    pub async fn debit(&self, user_id: UserId, amount: i64) -> ResultEngine<()> {
        self.debit_within(&self.database, user_id, amount).await
    }

    /// Sum of amounts over all non-completed wagers where the user is
    /// creator or taker. Committed but not yet settled, so not available for
    /// new commitments.
    pub async fn outstanding_within<C: ConnectionTrait>(
        &self,
        conn: &C,
        user_id: UserId,
    ) -> ResultEngine<i64> {
        let backend = conn.get_database_backend();
        let stmt = Statement::from_sql_and_values(
            backend,
            "SELECT COALESCE(SUM(amount), 0) AS sum \
             FROM wagers \
             WHERE (creator_id = ? OR taker_id = ?) AND completed = ?",
            vec![user_id.into(), user_id.into(), false.into()],
        );
        let row = conn.query_one(stmt).await?;
        Ok(row.and_then(|r| r.try_get("", "sum").ok()).unwrap_or(0))
    }

    pub async fn outstanding(&self, user_id: UserId) -> ResultEngine<i64> {
        self.outstanding_within(&self.database, user_id).await
    }

    /// Affordability gate used before wager creation and acceptance. The
    /// boundary is inclusive: `amount == money - outstanding` is affordable.
    pub async fn can_afford_within<C: ConnectionTrait>(
        &self,
        conn: &C,
        user_id: UserId,
        amount: i64,
    ) -> ResultEngine<bool> {
        let user = self.get_within(conn, user_id).await?;
        let outstanding = self.outstanding_within(conn, user_id).await?;
        Ok(amount <= user.money - outstanding)
    }

    pub async fn can_afford(&self, user_id: UserId, amount: i64) -> ResultEngine<bool> {
        self.can_afford_within(&self.database, user_id, amount).await
    }

    pub async fn summary_within<C: ConnectionTrait>(
        &self,
        conn: &C,
        user_id: UserId,
    ) -> ResultEngine<BalanceSummary> {
        let user = self.get_within(conn, user_id).await?;
        let outstanding = self.outstanding_within(conn, user_id).await?;
        Ok(BalanceSummary {
            money: user.money,
            outstanding,
        })
    }

    pub async fn summary(&self, user_id: UserId) -> ResultEngine<BalanceSummary> {
        self.summary_within(&self.database, user_id).await
    }

    /// Credit every known user, used by the periodic allowance sweep. Only
    /// ever adds money, so it needs no coordination with per-wager locks.
    pub async fn credit_all(&self, amount: i64) -> ResultEngine<u64> {
        let updated = users::Entity::update_many()
            .col_expr(
                users::Column::Money,
                Expr::col(users::Column::Money).add(amount),
            )
            .exec(&self.database)
            .await?;
        Ok(updated.rows_affected)
    }
}
