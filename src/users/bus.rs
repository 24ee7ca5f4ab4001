//! Command and query buses
//!
//! Handlers never touch the store directly; they build a command (state
//! change, no payload back) or a query (read, typed result) and dispatch it
//! on the matching bus. Each message type carries its own handling logic.

use std::sync::Arc;

use async_trait::async_trait;

use crate::auth::{PasswordService, TokenService};
use crate::error::AppResult;

use super::store::UserStore;

/// Collaborators available to every command and query
#[derive(Clone)]
pub struct UserServices {
    pub users: Arc<dyn UserStore>,
    pub tokens: TokenService,
    pub passwords: PasswordService,
}

impl UserServices {
    pub fn new(users: Arc<dyn UserStore>, tokens: TokenService, passwords: PasswordService) -> Self {
        Self {
            users,
            tokens,
            passwords,
        }
    }
}

/// A state change
#[async_trait]
pub trait Command: Send {
    async fn handle(self, services: &UserServices) -> AppResult<()>;
}

/// A read with a typed result
#[async_trait]
pub trait Query: Send {
    type Output: Send;

    async fn handle(self, services: &UserServices) -> AppResult<Self::Output>;
}

// =========================================================================
// CommandBus
// =========================================================================

/// Dispatches commands
#[derive(Clone)]
pub struct CommandBus {
    services: Arc<UserServices>,
}

impl CommandBus {
    pub fn new(services: Arc<UserServices>) -> Self {
        Self { services }
    }

    pub async fn send<C: Command>(&self, command: C) -> AppResult<()> {
        command.handle(&self.services).await
    }
}

// =========================================================================
// QueryBus
// =========================================================================

/// Dispatches queries
#[derive(Clone)]
pub struct QueryBus {
    services: Arc<UserServices>,
}

impl QueryBus {
    pub fn new(services: Arc<UserServices>) -> Self {
        Self { services }
    }

    pub async fn send<Q: Query>(&self, query: Q) -> AppResult<Q::Output> {
        query.handle(&self.services).await
    }
}

/// Both buses over one set of services
pub fn buses(services: UserServices) -> (CommandBus, QueryBus) {
    let services = Arc::new(services);
    (CommandBus::new(services.clone()), QueryBus::new(services))
}
