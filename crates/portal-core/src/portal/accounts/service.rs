use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::portal::domain::{AccountStatus, NewAccount, Role, UserAccount, UserId};
use crate::portal::gateway::{GatewayError, PortalGateway};

/// Inbound registration payload. Credentials are the identity
/// collaborator's problem; the portal stores the role-tagged account only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountRegistration {
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub role: Role,
}

/// Admin edit payload. The role is absent on purpose: it is assigned
/// exactly once at registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountUpdate {
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub status: AccountStatus,
}

/// Sanitized account representation for listings and responses.
#[derive(Debug, Clone, Serialize)]
pub struct AccountView {
    pub user_id: UserId,
    pub full_name: String,
    pub email: String,
    pub role: &'static str,
    pub status: &'static str,
}

impl From<&UserAccount> for AccountView {
    fn from(account: &UserAccount) -> Self {
        Self {
            user_id: account.id.clone(),
            full_name: account.full_name.clone(),
            email: account.email.clone(),
            role: account.role.label(),
            status: account.status.label(),
        }
    }
}

/// Account registration and admin maintenance workflow.
pub struct AccountService<G> {
    gateway: Arc<G>,
}

impl<G> AccountService<G>
where
    G: PortalGateway + 'static,
{
    pub fn new(gateway: Arc<G>) -> Self {
        Self { gateway }
    }

    /// Register a new account. The role is fixed here and never changes.
    pub fn register(&self, registration: AccountRegistration) -> Result<UserAccount, AccountError> {
        if registration.full_name.trim().is_empty() || registration.email.trim().is_empty() {
            return Err(AccountError::MissingFields);
        }

        let account = NewAccount {
            full_name: registration.full_name.trim().to_string(),
            email: registration.email.trim().to_string(),
            phone: registration.phone,
            role: registration.role,
            status: AccountStatus::Active,
            created_at: Utc::now(),
        };

        match self.gateway.insert_account(account) {
            Ok(stored) => Ok(stored),
            Err(GatewayError::Conflict) => Err(AccountError::EmailAlreadyRegistered),
            Err(other) => Err(other.into()),
        }
    }

    pub fn fetch(&self, user_id: &UserId) -> Result<UserAccount, AccountError> {
        self.gateway
            .fetch_account(user_id)?
            .ok_or(AccountError::AccountNotFound)
    }

    /// Admin-only listing of the first `limit` accounts.
    pub fn list(
        &self,
        caller_is_admin: bool,
        limit: usize,
    ) -> Result<Vec<UserAccount>, AccountError> {
        if !caller_is_admin {
            return Err(AccountError::AdminRequired);
        }
        Ok(self.gateway.list_accounts(limit)?)
    }

    /// Admin-only edit of contact fields and status. Role is immutable.
    pub fn update(
        &self,
        caller_is_admin: bool,
        user_id: &UserId,
        update: AccountUpdate,
    ) -> Result<UserAccount, AccountError> {
        if !caller_is_admin {
            return Err(AccountError::AdminRequired);
        }
        if update.full_name.trim().is_empty() || update.email.trim().is_empty() {
            return Err(AccountError::MissingFields);
        }

        let existing = self
            .gateway
            .fetch_account(user_id)?
            .ok_or(AccountError::AccountNotFound)?;
        let updated = UserAccount {
            full_name: update.full_name.trim().to_string(),
            email: update.email.trim().to_string(),
            phone: update.phone,
            status: update.status,
            ..existing
        };

        match self.gateway.update_account(updated.clone()) {
            Ok(()) => Ok(updated),
            Err(GatewayError::Conflict) => Err(AccountError::EmailAlreadyRegistered),
            Err(GatewayError::NotFound) => Err(AccountError::AccountNotFound),
            Err(other) => Err(other.into()),
        }
    }

    /// Admin-only delete; the gateway cascades to profiles, joins,
    /// memberships, and messages.
    pub fn delete(&self, caller_is_admin: bool, user_id: &UserId) -> Result<(), AccountError> {
        if !caller_is_admin {
            return Err(AccountError::AdminRequired);
        }
        match self.gateway.delete_account(user_id) {
            Ok(()) => Ok(()),
            Err(GatewayError::NotFound) => Err(AccountError::AccountNotFound),
            Err(other) => Err(other.into()),
        }
    }
}

/// Error raised by the account workflow.
#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    #[error("full name and email are required")]
    MissingFields,
    #[error("email is already registered")]
    EmailAlreadyRegistered,
    #[error("no account exists for that user")]
    AccountNotFound,
    #[error("admin capability required")]
    AdminRequired,
    #[error("persistence failure: {0}")]
    Persistence(#[from] GatewayError),
}
