//! Macro for implementing Display and FromStr for code enums
//!
//! The portal identifies regions and user kinds by short codes ("IT", "S").
//! This macro maps enum variants to those codes in both directions.
//!
//! # Example
//!
//! ```rust
//! use classeviva_domain::impl_code_conversions;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! pub enum Region {
//!     North,
//!     South,
//! }
//!
//! impl_code_conversions!(Region {
//!     North => "N",
//!     South => "S",
//! });
//!
//! assert_eq!(Region::North.to_string(), "N");
//! assert_eq!("s".parse::<Region>().unwrap(), Region::South);
//! ```

/// Implements Display, FromStr and a `code()` accessor for code enums
///
/// - Display writes the code exactly as declared
/// - FromStr accepts the code in any letter case
#[macro_export]
macro_rules! impl_code_conversions {
    ($enum_name:ident { $($variant:ident => $code:expr),+ $(,)? }) => {
        impl $enum_name {
            /// Wire code for this variant.
            #[must_use]
            pub const fn code(&self) -> &'static str {
                match self {
                    $(Self::$variant => $code,)+
                }
            }
        }

        impl std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.code())
            }
        }

        impl std::str::FromStr for $enum_name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                $(
                    if s.eq_ignore_ascii_case($code) {
                        return Ok(Self::$variant);
                    }
                )+
                Err(format!("Invalid {}: {}", stringify!($enum_name), s))
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum TestCode {
        Alpha,
        Beta,
    }

    impl_code_conversions!(TestCode {
        Alpha => "AL",
        Beta => "BE",
    });

    #[test]
    fn test_display_conversion() {
        assert_eq!(TestCode::Alpha.to_string(), "AL");
        assert_eq!(TestCode::Beta.code(), "BE");
    }

    #[test]
    fn test_fromstr_any_case() {
        assert_eq!(TestCode::from_str("AL").unwrap(), TestCode::Alpha);
        assert_eq!(TestCode::from_str("be").unwrap(), TestCode::Beta);
        assert_eq!(TestCode::from_str("Be").unwrap(), TestCode::Beta);
    }

    #[test]
    fn test_fromstr_invalid() {
        let err = TestCode::from_str("zz").unwrap_err();
        assert!(err.contains("TestCode"));
        assert!(err.contains("zz"));
    }
}
