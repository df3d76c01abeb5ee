//! Application layer containing the core business logic orchestration.
//!
//! [`bank::Bank`] is the session and ledger controller and the only entry
//! point the outer surfaces use. It draws numbers through
//! [`generator::NumberGenerator`], verifies credentials through
//! [`auth::Authenticator`] and delegates every balance change to the
//! record store port.

pub mod auth;
pub mod bank;
pub mod generator;
