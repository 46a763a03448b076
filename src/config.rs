use std::{fmt::Display, str::FromStr};

/// Time-to-live of a DNS record, in seconds
pub type TTL = u32;

/// The only plugin protocol version understood by this crate
pub const API_VERSION: &str = "v1";

/// TTL applied to challenge records by providers that need an explicit value
pub const DEFAULT_CHALLENGE_TTL: TTL = 30;

/// An operation requested by the ACME client through the `COMMAND` variable
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Command {
    Create,
    Delete,
}

impl FromStr for Command {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CREATE" => Ok(Command::Create),
            "DELETE" => Ok(Command::Delete),
            _ => Err(format!("Unknown command '{}'", s)),
        }
    }
}

impl Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Command::Create => write!(f, "CREATE"),
            Command::Delete => write!(f, "DELETE"),
        }
    }
}

/// A single DNS-01 challenge TXT record
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChallengeRecord {
    /// The domain being validated, used to find the parent zone
    pub domain: String,
    /// Fully qualified name of the TXT record, usually `_acme-challenge.<domain>`
    pub fqdn: String,
    /// Content of the TXT record
    pub token: String,
}

impl Display for ChallengeRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} TXT {}", self.fqdn, self.token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_parse_known_commands() {
        assert_eq!("CREATE".parse::<Command>(), Ok(Command::Create));
        assert_eq!("DELETE".parse::<Command>(), Ok(Command::Delete));
    }

    #[test]
    fn should_reject_unknown_commands() {
        assert!("create".parse::<Command>().is_err());
        assert!("".parse::<Command>().is_err());
        assert!("UPDATE".parse::<Command>().is_err());
    }

    #[test]
    fn should_display_record_like_a_zone_file_line() {
        let rec = ChallengeRecord {
            domain: "example.com".to_string(),
            fqdn: "_acme-challenge.example.com.".to_string(),
            token: "abc".to_string(),
        };
        assert_eq!(rec.to_string(), "_acme-challenge.example.com. TXT abc");
    }
}
