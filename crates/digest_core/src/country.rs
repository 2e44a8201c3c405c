use std::fmt;
use std::str::FromStr;

/// Country whose news digest is being generated. Sent with the upload and
/// echoed in the completion notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Country {
    #[default]
    Sweden,
    Finland,
    Poland,
}

impl Country {
    pub const ALL: [Country; 3] = [Country::Sweden, Country::Finland, Country::Poland];

    pub fn as_str(self) -> &'static str {
        match self {
            Country::Sweden => "Sweden",
            Country::Finland => "Finland",
            Country::Poland => "Poland",
        }
    }
}

impl fmt::Display for Country {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown country {0:?} (expected Sweden, Finland or Poland)")]
pub struct UnknownCountry(pub String);

impl FromStr for Country {
    type Err = UnknownCountry;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Country::ALL
            .into_iter()
            .find(|country| country.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnknownCountry(s.to_string()))
    }
}
