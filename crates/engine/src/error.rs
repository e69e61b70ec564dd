//! The module contains the errors the engine can throw.
//!
//! Validation failures (`InvalidAmount`, `InsufficientFunds`,
//! `SelfAcceptance`, `UnsupportedContext`) are resolved at the boundary and
//! surfaced to the acting user as a direct notice before the error is
//! returned. [`InvalidTransition`] means a state change raced against another
//! event and lost; the losing event is dropped without mutation.
use sea_orm::DbErr;
use thiserror::Error;

use crate::{UserId, chat::ChatError};

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Invalid wager transition: {0}")]
    InvalidTransition(String),
    #[error("Insufficient funds: {0}")]
    InsufficientFunds(String),
    #[error("a wager cannot be accepted by its creator")]
    SelfAcceptance,
    #[error("Unsupported context: {0}")]
    UnsupportedContext(String),
    #[error("user {0} not found")]
    UserNotFound(UserId),
    #[error("failed to provision user: {0}")]
    UserProvisioning(String),
    #[error(transparent)]
    Chat(#[from] ChatError),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::InvalidAmount(a), Self::InvalidAmount(b)) => a == b,
            (Self::InvalidTransition(a), Self::InvalidTransition(b)) => a == b,
            (Self::InsufficientFunds(a), Self::InsufficientFunds(b)) => a == b,
            (Self::SelfAcceptance, Self::SelfAcceptance) => true,
            (Self::UnsupportedContext(a), Self::UnsupportedContext(b)) => a == b,
            (Self::UserNotFound(a), Self::UserNotFound(b)) => a == b,
            (Self::UserProvisioning(a), Self::UserProvisioning(b)) => a == b,
            (Self::Chat(a), Self::Chat(b)) => a.to_string() == b.to_string(),
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
