//! Static enumerations of the portal: regions, app identities and user kinds

use serde::{Deserialize, Serialize};

use crate::impl_code_conversions;

/// Region the account belongs to. Each region is served by its own host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum State {
    #[default]
    #[serde(rename = "IT", alias = "it")]
    Italy,
    #[serde(rename = "SM", alias = "sm")]
    SanMarino,
    #[serde(rename = "AR", alias = "ar")]
    Argentina,
}

impl_code_conversions!(State {
    Italy => "IT",
    SanMarino => "SM",
    Argentina => "AR",
});

impl State {
    /// Host name serving this region.
    #[must_use]
    pub const fn host(&self) -> &'static str {
        match self {
            Self::Italy => "web.spaggiari.eu",
            Self::SanMarino => "web.spaggiari.sm",
            Self::Argentina => "ar.spaggiari.eu",
        }
    }

    /// Base URL (scheme + host, trailing slash) for this region.
    #[must_use]
    pub fn base_url(&self) -> String {
        format!("https://{}/", self.host())
    }
}

/// Known application identities, sent as the user agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum App {
    #[default]
    Students,
    Family,
    Aant,
    Teachers,
    Inalpi,
}

impl App {
    pub const ALL: [Self; 5] =
        [Self::Students, Self::Family, Self::Aant, Self::Teachers, Self::Inalpi];

    /// Identifier string the backend expects in `User-Agent`.
    #[must_use]
    pub const fn identifier(&self) -> &'static str {
        match self {
            Self::Students => "CVVS/studente/4.1.8",
            Self::Family => "CVVS/famiglia/4.1.8",
            Self::Aant => "CVVS/aant/2.1.2",
            Self::Teachers => "CVVS/docente/2.1.4",
            Self::Inalpi => "CVVS/inapli/3.1.7",
        }
    }
}

impl std::fmt::Display for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.identifier())
    }
}

impl std::str::FromStr for App {
    type Err = String;

    /// Accepts either the short name (`students`) or the full identifier.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        Self::ALL
            .into_iter()
            .find(|app| {
                app.identifier() == name
                    || format!("{app:?}").eq_ignore_ascii_case(name)
            })
            .ok_or_else(|| format!("Invalid App: {s}"))
    }
}

/// Kind of account, as reported by the profile card (`usrType`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserType {
    Student,
    Parent,
    Teacher,
    Unknown,
}

impl_code_conversions!(UserType {
    Student => "S",
    Parent => "G",
    Teacher => "A",
    Unknown => "X",
});

impl UserType {
    /// Italian label used by the portal.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Student => "studente",
            Self::Parent => "genitore",
            Self::Teacher => "insegnante",
            Self::Unknown => "unknown",
        }
    }

    /// Maps a `usrType` code, defaulting to a student like the portal does.
    #[must_use]
    pub fn from_code_or_student(code: Option<&str>) -> Self {
        code.map_or(Self::Student, |c| c.parse().unwrap_or(Self::Unknown))
    }
}
