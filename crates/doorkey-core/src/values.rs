//! Validated value types used on the wire.
//!
//! Every type in this module checks its format rule on construction, so an instance that exists
//! is always safe to place into a request line. Construction never yields a partially valid
//! value: it either returns the instance or a [`Error::ValidationError`].

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use std::time::Duration;

use crate::error::{Error, Result};

/// Separator between the fields of a request line.
pub const FIELD_SEPARATOR: char = '$';

/// Format rule applied to a text value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TextRule {
    /// Any string, including the empty one.
    Any,
    /// Any string that does not contain [`FIELD_SEPARATOR`].
    NoSeparator,
}

impl TextRule {
    fn check(self, kind: &str, value: &str) -> Result<()> {
        match self {
            Self::Any => Ok(()),
            Self::NoSeparator if value.contains(FIELD_SEPARATOR) => Err(Error::ValidationError(
                format!("{kind} '{value}' must not contain '{FIELD_SEPARATOR}'"),
            )),
            Self::NoSeparator => Ok(()),
        }
    }
}

/// Macro to generate validated text value types.
macro_rules! text_value {
    ($(#[$meta:meta])* $name:ident, $doc:expr, $rule:expr) => {
        $(#[$meta])*
        #[doc = $doc]
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Validates `value` and wraps it.
            ///
            /// # Errors
            ///
            /// Returns [`Error::ValidationError`] if the value violates the format rule.
            pub fn new(value: impl Into<String>) -> Result<Self> {
                let value = value.into();
                $rule.check(stringify!($name), &value)?;
                Ok(Self(value))
            }

            /// Borrows the inner string.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Converts into the inner string.
            #[must_use]
            pub fn into_string(self) -> String {
                self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = Error;

            fn try_from(value: String) -> Result<Self> {
                Self::new(value)
            }
        }

        impl TryFrom<&str> for $name {
            type Error = Error;

            fn try_from(value: &str) -> Result<Self> {
                Self::new(value)
            }
        }

        impl FromStr for $name {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self> {
                Self::new(s)
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

text_value!(UserId, "User id of a directory entry (no `$`).", TextRule::NoSeparator);
text_value!(TokenId, "Identifier of an access token (no `$`).", TextRule::NoSeparator);
text_value!(Name, "Display name of a user (any text).", TextRule::Any);
text_value!(
    #[derive(Default)]
    TokenData,
    "Opaque payload attached to a token (any text, empty by default).",
    TextRule::Any
);

impl TokenData {
    /// Token data carrying nothing.
    #[must_use]
    pub const fn empty() -> Self {
        Self(String::new())
    }

    /// Returns true if no data is attached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Password used to authorize requests (no `$`).
///
/// The value is held in a [`SecretString`] and is only revealed through [`Password::expose`].
#[derive(Clone, Deserialize)]
#[serde(try_from = "String")]
pub struct Password(SecretString);

impl Password {
    /// Validates `value` and wraps it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ValidationError`] if the value contains `$`.
    pub fn new(value: impl Into<String>) -> Result<Self> {
        let value = value.into();
        if value.contains(FIELD_SEPARATOR) {
            return Err(Error::ValidationError(format!(
                "Password must not contain '{FIELD_SEPARATOR}'"
            )));
        }
        Ok(Self(SecretString::from(value)))
    }

    /// Reveals the password text.
    #[must_use]
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password([REDACTED])")
    }
}

impl PartialEq for Password {
    fn eq(&self, other: &Self) -> bool {
        self.expose() == other.expose()
    }
}

impl Eq for Password {}

impl Hash for Password {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.expose().hash(state);
    }
}

impl TryFrom<String> for Password {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl FromStr for Password {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

/// Host name of the server: a dotted-quad IPv4 address or a DNS name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Hostname(String);

impl Hostname {
    /// Parses a host name.
    ///
    /// An IPv4 address has four groups of one to three digits, each at most 255. A DNS name is
    /// at least two dot-separated labels of letters, digits and inner hyphens; the last label
    /// must start with a letter.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ValidationError`] if `value` is neither form.
    pub fn parse(value: impl Into<String>) -> Result<Self> {
        let value = value.into();
        if is_ipv4(&value) || is_dns_name(&value) {
            Ok(Self(value))
        } else {
            Err(Error::ValidationError(format!(
                "'{value}' is not a valid host name"
            )))
        }
    }

    /// Borrows the host name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn is_ipv4(value: &str) -> bool {
    let octets: Vec<&str> = value.split('.').collect();
    octets.len() == 4
        && octets.iter().all(|octet| {
            (1..=3).contains(&octet.len())
                && octet.bytes().all(|b| b.is_ascii_digit())
                && octet.parse::<u16>().is_ok_and(|n| n <= 255)
        })
}

fn is_dns_name(value: &str) -> bool {
    let labels: Vec<&str> = value.split('.').collect();
    let Some((last, leading)) = labels.split_last() else {
        return false;
    };
    !leading.is_empty()
        && leading.iter().all(|label| is_label(label))
        && is_label(last)
        && last.starts_with(|c: char| c.is_ascii_alphabetic())
}

fn is_label(label: &str) -> bool {
    !label.is_empty()
        && label.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-')
        && !label.starts_with('-')
        && !label.ends_with('-')
}

impl TryFrom<String> for Hostname {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(value)
    }
}

impl FromStr for Hostname {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl From<Hostname> for String {
    fn from(value: Hostname) -> Self {
        value.0
    }
}

impl fmt::Display for Hostname {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Server port. Any non-negative number is a valid value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u32")]
pub struct Port(u32);

impl Port {
    /// Creates a port.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ValidationError`] if `port` is negative.
    pub fn new(port: i32) -> Result<Self> {
        u32::try_from(port)
            .map(Self)
            .map_err(|_| Error::ValidationError(format!("port {port} should be >= 0")))
    }

    /// Returns the port number.
    #[must_use]
    pub const fn as_u32(&self) -> u32 {
        self.0
    }

    /// Returns the port as a TCP port number.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConnectionFailed`] if the port lies outside the TCP range.
    pub fn tcp_port(&self) -> Result<u16> {
        u16::try_from(self.0)
            .map_err(|_| Error::ConnectionFailed(format!("port {} is out of range", self.0)))
    }
}

impl From<u16> for Port {
    fn from(port: u16) -> Self {
        Self(u32::from(port))
    }
}

impl TryFrom<i64> for Port {
    type Error = Error;

    fn try_from(value: i64) -> Result<Self> {
        let port = i32::try_from(value)
            .map_err(|_| Error::ValidationError(format!("port {value} is out of range")))?;
        Self::new(port)
    }
}

impl From<Port> for u32 {
    fn from(port: Port) -> Self {
        port.0
    }
}

impl fmt::Display for Port {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Timeout in milliseconds. Zero means no timeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u32")]
pub struct Timeout(u32);

impl Timeout {
    /// A timeout that never expires.
    pub const NONE: Self = Self(0);

    /// Creates a timeout of `millis` milliseconds.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ValidationError`] if `millis` is negative.
    pub fn from_millis(millis: i32) -> Result<Self> {
        u32::try_from(millis)
            .map(Self)
            .map_err(|_| Error::ValidationError(format!("timeout {millis} should be >= 0")))
    }

    /// Returns the timeout in milliseconds.
    #[must_use]
    pub const fn as_millis(&self) -> u32 {
        self.0
    }

    /// Returns the deadline to apply, or `None` if the timeout is disabled.
    #[must_use]
    pub fn duration(&self) -> Option<Duration> {
        (self.0 > 0).then(|| Duration::from_millis(u64::from(self.0)))
    }
}

impl TryFrom<i64> for Timeout {
    type Error = Error;

    fn try_from(value: i64) -> Result<Self> {
        let millis = i32::try_from(value)
            .map_err(|_| Error::ValidationError(format!("timeout {value} is out of range")))?;
        Self::from_millis(millis)
    }
}

impl From<Timeout> for u32 {
    fn from(timeout: Timeout) -> Self {
        timeout.0
    }
}

impl fmt::Display for Timeout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
