//! Admin credentials under which every directory request is authorized.

use crate::values::{Password, UserId};

/// Admin user id and password.
///
/// Both halves may be set independently and at any time; a request can only be built once both
/// are present.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdminCredentials {
    uid: Option<UserId>,
    password: Option<Password>,
}

impl AdminCredentials {
    /// Creates credentials with both halves set.
    #[must_use]
    pub const fn new(uid: UserId, password: Password) -> Self {
        Self {
            uid: Some(uid),
            password: Some(password),
        }
    }

    /// Creates empty credentials.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            uid: None,
            password: None,
        }
    }

    /// Replaces the admin user id.
    pub fn set_uid(&mut self, uid: UserId) {
        self.uid = Some(uid);
    }

    /// Replaces the admin password.
    pub fn set_password(&mut self, password: Password) {
        self.password = Some(password);
    }

    /// Returns the admin user id, if set.
    #[must_use]
    pub const fn uid(&self) -> Option<&UserId> {
        self.uid.as_ref()
    }

    /// Returns the admin password, if set.
    #[must_use]
    pub const fn password(&self) -> Option<&Password> {
        self.password.as_ref()
    }

    /// Returns true if both user id and password are set.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.uid.is_some() && self.password.is_some()
    }

    /// Returns both halves when they are set.
    #[must_use]
    pub fn pair(&self) -> Option<(&UserId, &Password)> {
        self.uid.as_ref().zip(self.password.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credentials_complete_only_with_both_halves() {
        let mut creds = AdminCredentials::empty();
        assert!(!creds.is_complete());
        assert!(creds.pair().is_none());

        creds.set_uid(UserId::new("admin").unwrap());
        assert!(!creds.is_complete());

        creds.set_password(Password::new("secret").unwrap());
        assert!(creds.is_complete());

        let (uid, password) = creds.pair().unwrap();
        assert_eq!(uid.as_str(), "admin");
        assert_eq!(password.expose(), "secret");
    }

    #[test]
    fn test_credentials_debug_hides_password() {
        let creds = AdminCredentials::new(
            UserId::new("admin").unwrap(),
            Password::new("secret").unwrap(),
        );
        assert!(!format!("{creds:?}").contains("secret"));
    }
}
