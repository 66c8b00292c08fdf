//! Role-tagged account registration and admin maintenance.

pub mod router;
pub mod service;

pub use router::account_router;
pub use service::{
    AccountError, AccountRegistration, AccountService, AccountUpdate, AccountView,
};
