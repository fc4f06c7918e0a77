//! # doorkey-core
//!
//! Core types and utilities for administering door access tokens on a directory server.
//!
//! This crate provides the validated value types that end up on the wire, admin credentials,
//! the shared error type, persisted server settings and the hash capability used to derive
//! token ids.
//!
//! ## Modules
//!
//! - [`error`] - Error type shared by every layer of the client
//! - [`values`] - Validated wire values (host name, port, timeout, ids, password, ...)
//! - [`credentials`] - Admin credentials authorizing directory requests
//! - [`config`] - Serializable server settings
//! - [`hash`] - Hash capability for deriving token ids

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod credentials;
pub mod error;
pub mod hash;
pub mod values;

// Re-export commonly used types
pub use credentials::AdminCredentials;
pub use error::{Error, Result};
pub use hash::{HashFunction, Sha256Hash};
pub use values::{Hostname, Name, Password, Port, Timeout, TokenData, TokenId, UserId};
