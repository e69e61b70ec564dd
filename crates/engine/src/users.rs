//! Users table.
//!
//! A user is keyed by the platform snowflake assigned at first contact and
//! carries a single global balance. Balances are not scoped per community;
//! only wagers are.

use sea_orm::entity::{ActiveValue, prelude::*};

use crate::UserId;

/// A member of the chat community with a currency balance.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub money: i64,
}

impl User {
    pub fn new(id: UserId, starting_money: i64) -> Self {
        Self {
            id,
            money: starting_money,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: i64,
    pub money: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for User {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            money: model.money,
        }
    }
}

impl From<&User> for ActiveModel {
    fn from(user: &User) -> Self {
        Self {
            id: ActiveValue::Set(user.id),
            money: ActiveValue::Set(user.money),
        }
    }
}
