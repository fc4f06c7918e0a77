//! Directory client for administering door access tokens.
//!
//! This crate speaks the line-oriented request/reply protocol of the token directory server over
//! TLS. It encodes the four token operations, decodes search replies into [`User`] records and
//! exposes them through [`DirectoryClient`] bound to one admin login.

#![deny(missing_docs)]

mod attribute;
mod channel;
mod client;
mod codec;
mod config;
mod enrollment;
mod user;

pub use attribute::Attribute;
pub use channel::{Channel, ScriptedChannel, TlsChannel, Transcript};
pub use client::DirectoryClient;
pub use codec::{decode_users, Operation, Request, RECORD_SEPARATOR};
pub use config::DirectoryConfig;
pub use enrollment::{enroll_token, revoke_all_tokens, revoke_token, token_from_tag, EnrollOutcome};
pub use user::{Token, User};

/// Convenient result alias that reuses the core error type.
pub type Result<T> = doorkey_core::Result<T>;
