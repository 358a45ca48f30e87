//! User identity extracted from the login handshake
//!
//! The same shape is used by all three clients; each backend fills in the
//! fields it knows about and leaves the rest empty.

use serde::{Deserialize, Serialize};

use super::enums::UserType;

/// School the account belongs to, filled in by the profile card endpoints.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct School {
    pub name: Option<String>,
    pub dedication: Option<String>,
    pub city: Option<String>,
    pub province: Option<String>,
    pub code: Option<String>,
}

/// Denormalized identity of the logged-in account
///
/// `UserProfile::default()` is the documented empty shape of a logged-out
/// client.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    /// First name
    pub name: Option<String>,
    /// Last name
    pub surname: Option<String>,
    /// Numeric part of the identifier, kept as text ("1234567")
    pub id: Option<String>,
    /// Full alphanumeric identifier ("S1234567X")
    pub ident: Option<String>,
    #[serde(rename = "type")]
    pub user_type: Option<UserType>,
    pub school: Option<School>,
}

impl UserProfile {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// "Name Surname", skipping missing parts.
    #[must_use]
    pub fn display_name(&self) -> String {
        [self.name.as_deref(), self.surname.as_deref()]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// School code, when a profile card has been fetched.
    #[must_use]
    pub fn school_code(&self) -> Option<&str> {
        self.school.as_ref().and_then(|school| school.code.as_deref())
    }
}

/// Keeps only the ASCII digits of an identifier ("AB123XY" -> "123").
#[must_use]
pub fn numeric_id(ident: &str) -> String {
    ident.chars().filter(char::is_ascii_digit).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_profile_is_empty() {
        let user = UserProfile::default();
        assert!(user.is_empty());
        assert_eq!(user.display_name(), "");
        assert!(user.school_code().is_none());
    }

    #[test]
    fn numeric_id_strips_letters() {
        assert_eq!(numeric_id("AB123XY"), "123");
        assert_eq!(numeric_id("S9876543Z"), "9876543");
        assert_eq!(numeric_id(""), "");
    }

    #[test]
    fn display_name_skips_missing_parts() {
        let user = UserProfile {
            name: Some("Mario".into()),
            surname: None,
            ..UserProfile::default()
        };
        assert_eq!(user.display_name(), "Mario");
    }
}
