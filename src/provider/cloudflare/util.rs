use cloudflare::framework::response::{ApiError, ApiFailure};
use itertools::Itertools;
use serde::Deserialize;

use crate::provider::ProviderError;

impl From<ApiFailure> for ProviderError {
    fn from(f: ApiFailure) -> Self {
        match f {
            ApiFailure::Error(s, errs) => {
                let errors = errs.errors.iter().map(ChainedError::from).collect_vec();
                if errors.is_empty() {
                    ProviderError::Api(format!("Cloudflare API returned status {}", s))
                } else {
                    ProviderError::Api(describe(&errors))
                }
            }
            ApiFailure::Invalid(e) => ProviderError::Internal(e.to_string()),
        }
    }
}

/// A Cloudflare API error along with the errors that caused it
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub(super) struct ChainedError {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub error_chain: Vec<ChainedError>,
}

impl From<&ApiError> for ChainedError {
    fn from(e: &ApiError) -> Self {
        let error_chain = e
            .other
            .get("error_chain")
            .and_then(|chain| serde_json::from_value(chain.to_owned()).ok())
            .unwrap_or_default();
        ChainedError {
            code: e.code.into(),
            message: e.message.to_owned(),
            error_chain,
        }
    }
}

/// Render errors as `message (Code n)`, separated by commas.
/// Each error is followed by its own chain of causes, separated by a colon.
pub(super) fn describe(errors: &[ChainedError]) -> String {
    errors
        .iter()
        .map(|e| {
            let msg = format!("{} (Code {})", e.message, e.code);
            if e.error_chain.is_empty() {
                msg
            } else {
                format!("{}: {}", msg, describe(&e.error_chain))
            }
        })
        .join(", ")
}
