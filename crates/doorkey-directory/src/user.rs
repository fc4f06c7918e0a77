//! Directory user and token records.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

use doorkey_core::{Name, TokenData, TokenId, UserId};

/// Access token held by a user.
///
/// Two tokens are equal when both id and data are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Token {
    id: TokenId,
    #[serde(default)]
    data: TokenData,
}

impl Token {
    /// Creates a token without data.
    #[must_use]
    pub const fn new(id: TokenId) -> Self {
        Self {
            id,
            data: TokenData::empty(),
        }
    }

    /// Creates a token carrying `data`.
    #[must_use]
    pub const fn with_data(id: TokenId, data: TokenData) -> Self {
        Self { id, data }
    }

    /// Returns the token id.
    #[must_use]
    pub const fn id(&self) -> &TokenId {
        &self.id
    }

    /// Returns the token data.
    #[must_use]
    pub const fn data(&self) -> &TokenData {
        &self.data
    }
}

/// Representation of a directory user and the tokens it holds.
///
/// The token set has set semantics: adding an equal token twice keeps one instance. It is only
/// changed through [`User::add`], [`User::remove`] and [`User::remove_all_tokens`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    name: Name,
    id: UserId,
    #[serde(default)]
    tokens: HashSet<Token>,
}

impl User {
    /// Creates a user without tokens.
    #[must_use]
    pub fn new(name: Name, id: UserId) -> Self {
        Self {
            name,
            id,
            tokens: HashSet::new(),
        }
    }

    /// Creates a user holding `tokens`.
    #[must_use]
    pub fn with_tokens<I>(name: Name, id: UserId, tokens: I) -> Self
    where
        I: IntoIterator<Item = Token>,
    {
        Self {
            name,
            id,
            tokens: tokens.into_iter().collect(),
        }
    }

    /// Returns the display name.
    #[must_use]
    pub const fn name(&self) -> &Name {
        &self.name
    }

    /// Returns the user id.
    #[must_use]
    pub const fn id(&self) -> &UserId {
        &self.id
    }

    /// Returns an iterator over the held tokens, in no particular order.
    pub fn tokens(&self) -> impl Iterator<Item = &Token> + '_ {
        self.tokens.iter()
    }

    /// Returns the number of held tokens.
    #[must_use]
    pub fn token_count(&self) -> usize {
        self.tokens.len()
    }

    /// Returns true if the user holds `token`.
    #[must_use]
    pub fn has_token(&self, token: &Token) -> bool {
        self.tokens.contains(token)
    }

    /// Adds a token. Returns false if an equal token was already held.
    pub fn add(&mut self, token: Token) -> bool {
        self.tokens.insert(token)
    }

    /// Removes a token. Returns false if it was not held.
    pub fn remove(&mut self, token: &Token) -> bool {
        self.tokens.remove(token)
    }

    /// Removes every token.
    pub fn remove_all_tokens(&mut self) {
        self.tokens.clear();
    }
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.name, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(id: &str) -> Token {
        Token::new(TokenId::new(id).unwrap())
    }

    fn max() -> User {
        User::new(
            Name::new("Max Mustermann").unwrap(),
            UserId::new("1").unwrap(),
        )
    }

    #[test]
    fn token_equality_uses_id_and_data() {
        let plain = token("aksbasd");
        let with_data = Token::with_data(
            TokenId::new("aksbasd").unwrap(),
            TokenData::new("room 101").unwrap(),
        );
        assert_eq!(plain, token("aksbasd"));
        assert_ne!(plain, with_data);
        assert!(plain.data().is_empty());
    }

    #[test]
    fn adding_same_token_twice_keeps_one() {
        let mut user = max();
        assert!(user.add(token("tok1")));
        assert!(!user.add(token("tok1")));
        assert_eq!(user.token_count(), 1);
        assert!(user.has_token(&token("tok1")));
    }

    #[test]
    fn same_id_with_different_data_is_distinct() {
        let mut user = max();
        user.add(token("tok1"));
        user.add(Token::with_data(
            TokenId::new("tok1").unwrap(),
            TokenData::new("spare").unwrap(),
        ));
        assert_eq!(user.token_count(), 2);
    }

    #[test]
    fn removing_missing_token_leaves_set_unchanged() {
        let mut user = User::with_tokens(
            Name::new("Max Mustermann").unwrap(),
            UserId::new("1").unwrap(),
            [token("tok1"), token("tok2")],
        );
        let before = user.clone();
        assert!(!user.remove(&token("tok3")));
        assert_eq!(user, before);

        assert!(user.remove(&token("tok1")));
        assert_eq!(user.token_count(), 1);

        user.remove_all_tokens();
        assert_eq!(user.token_count(), 0);
    }

    #[test]
    fn display_shows_name() {
        assert_eq!(max().to_string(), "Max Mustermann");
    }

    #[test]
    fn user_serde_round_trip_keeps_tokens() {
        let user = User::with_tokens(
            Name::new("Erika Musterfrau").unwrap(),
            UserId::new("2").unwrap(),
            [token("a"), token("b")],
        );
        let json = serde_json::to_string(&user).unwrap();
        let restored: User = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, user);
    }
}
