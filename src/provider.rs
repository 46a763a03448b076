//! DNS providers that challenge records can be written to.
//! Each provider implements the [`Provider`] trait.
//!
//! The following providers are currently available:
//! - [`CloudflareProvider`]: Cloudflare API v4
//! - [`GoogleDnsProvider`]: Google Cloud DNS
//! - [`Route53Provider`]: AWS Route53
//! - [`NoopProvider`]: Prints the record instead of creating it, useful for manual setups and testing

mod cloudflare;
mod googledns;
mod noop;
mod route53;

use thiserror::Error;

// Re-exports for convenience
pub use self::cloudflare::{CloudflareConfig, CloudflareProvider};
pub use self::googledns::{GoogleDnsConfig, GoogleDnsProvider};
pub use self::noop::{NoopConfig, NoopProvider};
pub use self::route53::{Route53Config, Route53Provider, Route53ProviderConfig};

use crate::config::ChallengeRecord;

/// A provider is any DNS service provider, such as Cloudflare, Route53, etc...
/// It only needs to know how to add and remove a single challenge TXT record
#[cfg_attr(test, mockall::automock)]
pub trait Provider {
    /// Create the TXT record for a challenge, or update it if a provider only allows one record per name
    fn create_txt_record(&self, record: &ChallengeRecord) -> Result<(), ProviderError>;
    /// Remove the TXT record for a challenge
    fn delete_txt_record(&self, record: &ChallengeRecord) -> Result<(), ProviderError>;
}

/// Generic error returned by a provider action
#[derive(Error, Debug, Clone, PartialEq, Eq, Hash)]
pub enum ProviderError {
    #[error("No zone found for host '{0}'")]
    ZoneNotFound(String),
    #[error("More than one records returned for type TXT and name {0}")]
    AmbiguousRecord(String),
    /// The provider client could not be created or authenticated
    #[error("{0}")]
    Setup(String),
    /// The remote API rejected the request
    #[error("{0}")]
    Api(String),
    #[error("{0}")]
    Internal(String),
}

impl ProviderError {
    /// Prefix the error message with the step that failed
    pub fn context(self, step: &str) -> Self {
        match self {
            ProviderError::Setup(msg) => ProviderError::Setup(format!("{}: {}", step, msg)),
            ProviderError::Api(msg) => ProviderError::Api(format!("{}: {}", step, msg)),
            ProviderError::Internal(msg) => ProviderError::Internal(format!("{}: {}", step, msg)),
            other => other,
        }
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(e: reqwest::Error) -> Self {
        ProviderError::Internal(e.to_string())
    }
}

/// Strip the trailing dot from a domain name, if any
pub fn relative_name(name: &str) -> &str {
    name.strip_suffix('.').unwrap_or(name)
}

/// Return the domain name with a trailing dot, as used in zone files
pub fn absolute_name(name: &str) -> String {
    format!("{}.", relative_name(name))
}

/// Find the zone that a domain belongs to.
///
/// A zone matches if its name equals the domain or is a parent of it on a label boundary,
/// so `example.com` matches `www.example.com` but not `myexample.com`.
/// Comparison ignores case and trailing dots. If several zones match, the longest one wins.
pub fn find_zone<'a, Z>(domain: &str, zones: &'a [Z], name_of: impl Fn(&Z) -> &str) -> Option<&'a Z> {
    let domain = relative_name(domain).to_ascii_lowercase();

    zones
        .iter()
        .filter(|z| {
            let zone = relative_name(name_of(*z)).to_ascii_lowercase();
            !zone.is_empty()
                && (domain == zone
                    || domain
                        .strip_suffix(zone.as_str())
                        .is_some_and(|prefix| prefix.ends_with('.')))
        })
        .max_by_key(|z| relative_name(name_of(*z)).len())
}

/// Collect all items of a paginated listing.
///
/// `fetch` gets the token of the page to request, `None` for the first page, and returns the items of
/// that page along with the token of the next one. Listing ends on a missing or empty next token.
pub fn collect_pages<T, F>(mut fetch: F) -> Result<Vec<T>, ProviderError>
where
    F: FnMut(Option<&str>) -> Result<(Vec<T>, Option<String>), ProviderError>,
{
    let mut items = Vec::new();
    let mut token: Option<String> = None;

    loop {
        let (page, next) = fetch(token.as_deref())?;
        items.extend(page);

        match next {
            Some(next) if !next.is_empty() => token = Some(next),
            _ => break,
        }
    }
    Ok(items)
}
