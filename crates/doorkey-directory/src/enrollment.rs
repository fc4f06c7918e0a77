//! Token enrollment and revocation workflows.
//!
//! These combine a [`DirectoryClient`] call with the matching change on the local [`User`], the
//! way an interactive caller keeps its view in step with the server.

use crate::{
    attribute::Attribute,
    client::DirectoryClient,
    user::{Token, User},
    Result,
};
use doorkey_core::{HashFunction, TokenId};
use tracing::{info, warn};

/// Result of [`enroll_token`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnrollOutcome {
    /// The user already held the token locally; nothing was sent.
    AlreadyPresent,
    /// The server lists the token for the user and it was added locally.
    Added,
    /// The server did not record the token, usually because another user holds it.
    Rejected,
}

/// Derives a token from a scanned tag identifier.
///
/// The raw identifier is rendered as lowercase hex and hashed; the digest is the token id.
///
/// # Errors
///
/// Returns [`doorkey_core::Error::HashUnavailable`] if the hash fails, or a validation error if
/// the digest is not a valid token id.
pub fn token_from_tag(hash: &dyn HashFunction, tag_id: &[u8]) -> Result<Token> {
    let digest = hash.hash(&hex::encode(tag_id))?;
    Ok(Token::new(TokenId::new(digest)?))
}

/// Adds `token` to `user` on the server and confirms it with a follow-up search.
///
/// The server silently ignores a token id already in use, so the outcome is only
/// [`EnrollOutcome::Added`] if the search lists the token for the user afterwards.
///
/// # Errors
///
/// Returns [`doorkey_core::Error::MissingCredentials`] or a transport error.
pub async fn enroll_token(
    client: &mut DirectoryClient,
    user: &mut User,
    token: Token,
) -> Result<EnrollOutcome> {
    if user.has_token(&token) {
        return Ok(EnrollOutcome::AlreadyPresent);
    }

    client.ensure_connected().await?;
    client.add_token(user, &token).await?;

    let confirmed = client
        .search("", &[Attribute::new("", user.id().as_str())])
        .await?
        .iter()
        .filter(|listed| listed.id() == user.id())
        .any(|listed| listed.tokens().any(|held| held.id() == token.id()));

    if confirmed {
        info!(uid = %user.id(), "Token enrolled");
        user.add(token);
        Ok(EnrollOutcome::Added)
    } else {
        warn!(uid = %user.id(), "Server did not record the token");
        Ok(EnrollOutcome::Rejected)
    }
}

/// Removes `token` from `user` on the server, then locally.
///
/// # Errors
///
/// Returns [`doorkey_core::Error::MissingCredentials`] or a transport error; the local user is
/// left unchanged on error.
pub async fn revoke_token(
    client: &mut DirectoryClient,
    user: &mut User,
    token: &Token,
) -> Result<()> {
    client.ensure_connected().await?;
    client.remove_token(user, token).await?;
    user.remove(token);
    Ok(())
}

/// Removes every token from `user` on the server, then locally.
///
/// # Errors
///
/// Returns [`doorkey_core::Error::MissingCredentials`] or a transport error; the local user is
/// left unchanged on error.
pub async fn revoke_all_tokens(client: &mut DirectoryClient, user: &mut User) -> Result<()> {
    client.ensure_connected().await?;
    client.remove_all_tokens(user).await?;
    user.remove_all_tokens();
    Ok(())
}
