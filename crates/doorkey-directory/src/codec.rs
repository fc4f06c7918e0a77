//! Request encoding and search reply decoding for the line protocol.
//!
//! A request is one line of `$`-separated fields: the opcode, the admin uid and password, the
//! target uid and, for the token operations, the token id. Only `search` has a structured reply:
//! user records separated by `$`, each of the form
//! `lastname,firstname;uid;password:token1;token2;...`.

use tracing::warn;

use crate::user::{Token, User};
use doorkey_core::values::FIELD_SEPARATOR;
use doorkey_core::{Name, Password, TokenId, UserId};

/// Separator between user records in a search reply.
pub const RECORD_SEPARATOR: char = '$';

const TOKEN_SEPARATOR: char = ';';

/// Operations understood by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Look up a user by uid.
    Search,
    /// Attach a token to a user.
    AddToken,
    /// Detach one token from a user.
    DeleteToken,
    /// Detach every token from a user.
    DeleteAll,
}

impl Operation {
    /// Opcode sent as the first field of the request line.
    #[must_use]
    pub const fn opcode(self) -> &'static str {
        match self {
            Self::Search => "search",
            Self::AddToken => "addToken",
            Self::DeleteToken => "deleteToken",
            Self::DeleteAll => "deleteAll",
        }
    }
}

/// A request addressed to one target user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Request<'a> {
    /// `search$<admin>$<password>$<target>`
    Search {
        /// User to look up.
        target: &'a UserId,
    },
    /// `addToken$<admin>$<password>$<target>$<token>`
    AddToken {
        /// User receiving the token.
        target: &'a UserId,
        /// Token to attach.
        token: &'a TokenId,
    },
    /// `deleteToken$<admin>$<password>$<target>$<token>`
    DeleteToken {
        /// User losing the token.
        target: &'a UserId,
        /// Token to detach.
        token: &'a TokenId,
    },
    /// `deleteAll$<admin>$<password>$<target>`
    DeleteAll {
        /// User losing all tokens.
        target: &'a UserId,
    },
}

impl<'a> Request<'a> {
    /// Returns the operation of this request.
    #[must_use]
    pub const fn operation(&self) -> Operation {
        match self {
            Self::Search { .. } => Operation::Search,
            Self::AddToken { .. } => Operation::AddToken,
            Self::DeleteToken { .. } => Operation::DeleteToken,
            Self::DeleteAll { .. } => Operation::DeleteAll,
        }
    }

    /// Returns the target user id.
    #[must_use]
    pub const fn target(&self) -> &'a UserId {
        match *self {
            Self::Search { target }
            | Self::AddToken { target, .. }
            | Self::DeleteToken { target, .. }
            | Self::DeleteAll { target } => target,
        }
    }

    /// Returns the token id for token-specific requests.
    #[must_use]
    pub const fn token(&self) -> Option<&'a TokenId> {
        match *self {
            Self::AddToken { token, .. } | Self::DeleteToken { token, .. } => Some(token),
            Self::Search { .. } | Self::DeleteAll { .. } => None,
        }
    }

    /// Encodes the request line (without terminator) under the given admin credentials.
    ///
    /// The value types guarantee that no field contains the separator.
    #[must_use]
    pub fn encode(&self, admin: &UserId, password: &Password) -> String {
        let mut line = String::from(self.operation().opcode());
        let fields = [admin.as_str(), password.expose(), self.target().as_str()]
            .into_iter()
            .chain(self.token().map(TokenId::as_str));
        for field in fields {
            line.push(FIELD_SEPARATOR);
            line.push_str(field);
        }
        line
    }
}

/// Decodes a search reply into users.
///
/// An absent or empty reply yields no users. Records that do not match the record grammar are
/// skipped.
pub fn decode_users<'a>(reply: impl Into<Option<&'a str>>) -> Vec<User> {
    let Some(reply) = reply.into() else {
        return Vec::new();
    };

    reply
        .split(RECORD_SEPARATOR)
        .enumerate()
        .filter(|(_, record)| !record.is_empty())
        .filter_map(|(index, record)| {
            let user = parse_record(record);
            if user.is_none() {
                // The record carries a password, so only its position is logged.
                warn!(index, "Dropping malformed user record in search reply");
            }
            user
        })
        .collect()
}

fn parse_record(record: &str) -> Option<User> {
    let (last_name, rest) = record.split_once(',')?;
    let (first_name, rest) = rest.split_once(';')?;
    let (uid, rest) = rest.split_once(';')?;
    let (password, tokens) = rest.split_once(':')?;

    if [last_name, first_name, uid, password]
        .iter()
        .any(|field| field.is_empty())
    {
        return None;
    }

    let token_ids = parse_token_list(tokens)?;
    let name = Name::new(format!("{first_name} {last_name}")).ok()?;
    let id = UserId::new(uid).ok()?;

    Some(User::with_tokens(
        name,
        id,
        token_ids.into_iter().map(Token::new),
    ))
}

fn parse_token_list(tokens: &str) -> Option<Vec<TokenId>> {
    if tokens.is_empty() {
        return Some(Vec::new());
    }

    tokens
        .split(TOKEN_SEPARATOR)
        .map(|token| {
            if token.is_empty() {
                None
            } else {
                TokenId::new(token).ok()
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn admin() -> (UserId, Password) {
        (
            UserId::new("admin").unwrap(),
            Password::new("s3cret").unwrap(),
        )
    }

    fn token_ids(user: &User) -> Vec<String> {
        let mut ids: Vec<String> = user.tokens().map(|t| t.id().to_string()).collect();
        ids.sort();
        ids
    }

    #[test]
    fn encodes_every_operation() {
        let (uid, password) = admin();
        let target = UserId::new("42").unwrap();
        let token = TokenId::new("abcdef").unwrap();

        assert_eq!(
            Request::Search { target: &target }.encode(&uid, &password),
            "search$admin$s3cret$42"
        );
        assert_eq!(
            Request::AddToken {
                target: &target,
                token: &token
            }
            .encode(&uid, &password),
            "addToken$admin$s3cret$42$abcdef"
        );
        assert_eq!(
            Request::DeleteToken {
                target: &target,
                token: &token
            }
            .encode(&uid, &password),
            "deleteToken$admin$s3cret$42$abcdef"
        );
        assert_eq!(
            Request::DeleteAll { target: &target }.encode(&uid, &password),
            "deleteAll$admin$s3cret$42"
        );
    }

    #[test]
    fn encodes_empty_fields() {
        let uid = UserId::new("").unwrap();
        let password = Password::new("").unwrap();
        let target = UserId::new("").unwrap();
        assert_eq!(
            Request::DeleteAll { target: &target }.encode(&uid, &password),
            "deleteAll$$$"
        );
    }

    #[test]
    fn request_accessors() {
        let target = UserId::new("7").unwrap();
        let token = TokenId::new("t").unwrap();
        let request = Request::DeleteToken {
            target: &target,
            token: &token,
        };
        assert_eq!(request.operation(), Operation::DeleteToken);
        assert_eq!(request.target(), &target);
        assert_eq!(request.token(), Some(&token));
        assert_eq!(Request::Search { target: &target }.token(), None);
    }

    #[test]
    fn decodes_single_user_with_tokens() {
        let users = decode_users("Mustermann,Max;1;pw:tok1;tok2");
        assert_eq!(users.len(), 1);

        let user = &users[0];
        assert_eq!(user.name().as_str(), "Max Mustermann");
        assert_eq!(user.id().as_str(), "1");
        assert_eq!(token_ids(user), vec!["tok1", "tok2"]);
        assert!(user.tokens().all(|t| t.data().is_empty()));
    }

    #[test]
    fn absent_or_empty_reply_yields_no_users() {
        assert!(decode_users(None).is_empty());
        assert!(decode_users("").is_empty());
        assert!(decode_users("$").is_empty());
    }

    #[test]
    fn malformed_record_is_dropped() {
        let reply = "Mustermann,Max;1;pw:tok1;tok2$Doe,John;2$Musterfrau,Erika;3;pw2:";
        let users = decode_users(reply);
        assert_eq!(users.len(), 2);
        assert_eq!(users[0].id().as_str(), "1");
        assert_eq!(users[1].id().as_str(), "3");
        assert_eq!(users[1].token_count(), 0);
    }

    #[test]
    fn record_grammar_edge_cases() {
        // Missing colon after the password.
        assert!(decode_users("Doe,John;2;pw").is_empty());
        // Empty fields.
        assert!(decode_users(",John;2;pw:").is_empty());
        assert!(decode_users("Doe,;2;pw:").is_empty());
        assert!(decode_users("Doe,John;;pw:").is_empty());
        assert!(decode_users("Doe,John;2;:").is_empty());
        // Empty token segments.
        assert!(decode_users("Doe,John;2;pw:;tok").is_empty());
        assert!(decode_users("Doe,John;2;pw:tok;").is_empty());
        assert!(decode_users("Doe,John;2;pw:tok;;tok2").is_empty());
    }

    #[test]
    fn password_and_tokens_may_contain_other_delimiters() {
        let users = decode_users("Doe,John;2;p;w:tok:1;tok,2");
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].name().as_str(), "John Doe");
        assert_eq!(token_ids(&users[0]), vec!["tok,2", "tok:1"]);
    }

    #[test]
    fn duplicate_token_ids_collapse() {
        let users = decode_users("Doe,John;2;pw:tok;tok");
        assert_eq!(users[0].token_count(), 1);
    }
}
