use std::{cell::RefCell, io::Write};

use log::debug;
use serde::Deserialize;

use super::{Provider, ProviderError};
use crate::config::ChallengeRecord;

/// Configuration read from stdin by the no-op plugin. Accepted for compatibility and otherwise ignored
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Deserialize)]
pub struct NoopConfig {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
}

/// A [`Provider`] that does not talk to any DNS service.
///
/// Creating a record prints it as a zone file line, so that it can be added by hand.
/// Deleting a record does nothing.
pub struct NoopProvider {
    out: RefCell<Box<dyn Write>>,
}

impl NoopProvider {
    pub fn from_config(_config: &NoopConfig) -> Result<Box<dyn Provider>, ProviderError> {
        Ok(Box::new(NoopProvider::new(Box::new(std::io::stdout()))))
    }

    /// Create a provider that writes records to the given output
    pub fn new(out: Box<dyn Write>) -> Self {
        NoopProvider {
            out: RefCell::new(out),
        }
    }
}

impl Provider for NoopProvider {
    fn create_txt_record(&self, record: &ChallengeRecord) -> Result<(), ProviderError> {
        let mut out = self.out.borrow_mut();
        writeln!(out, "{}", record)
            .and_then(|_| out.flush())
            .map_err(|e| ProviderError::Internal(e.to_string()))
    }

    fn delete_txt_record(&self, record: &ChallengeRecord) -> Result<(), ProviderError> {
        debug!("Nothing to delete for {}", record.fqdn);
        Ok(())
    }
}
