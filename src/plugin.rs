//! The DNS-01 plugin protocol.
//!
//! A plugin is started once per challenge operation. It checks the protocol version, reads its provider
//! credentials as JSON from stdin, performs the requested [`Command`] and reports the outcome through its
//! exit status. Any error message is written verbatim to stderr for the ACME client to show.

use std::{
    io::{self, Read, Write},
    process::ExitCode,
};

use log::{debug, info, warn};
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::{
    cli::PluginArgs,
    config::{ChallengeRecord, Command, API_VERSION},
    provider::{Provider, ProviderError},
};

/// Exit statuses understood by the ACME client
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ExitStatus {
    Success = 0,
    Failure = 1,
    InvalidConfig = 2,
    UnsupportedApiVersion = 3,
}

impl From<ExitStatus> for ExitCode {
    fn from(s: ExitStatus) -> Self {
        ExitCode::from(s as u8)
    }
}

#[derive(Error, Debug)]
pub enum PluginError {
    #[error("Unsupported plugin API version {0:?}")]
    UnsupportedApiVersion(Option<String>),
    #[error("{0}")]
    Input(#[from] io::Error),
    #[error("{0}")]
    Config(#[from] serde_json::Error),
    #[error("{0}")]
    Provider(#[from] ProviderError),
}

impl PluginError {
    pub fn exit_status(&self) -> ExitStatus {
        match self {
            PluginError::UnsupportedApiVersion(_) => ExitStatus::UnsupportedApiVersion,
            PluginError::Input(_) => ExitStatus::Failure,
            PluginError::Config(_) => ExitStatus::InvalidConfig,
            PluginError::Provider(_) => ExitStatus::Failure,
        }
    }
}

/// Run a single plugin invocation and return the exit status for the process.
///
/// `connect` receives the parsed provider configuration along with the raw stdin contents
/// and returns the provider to use. It is only called once a valid command was requested.
pub fn run<C, F>(args: &PluginArgs, input: &mut dyn Read, stderr: &mut dyn Write, connect: F) -> ExitStatus
where
    C: DeserializeOwned,
    F: FnOnce(C, &[u8]) -> Result<Box<dyn Provider>, ProviderError>,
{
    match try_run(args, input, connect) {
        Ok(()) => ExitStatus::Success,
        Err(e) => {
            debug!("Plugin invocation failed: {:?}", e);
            if !matches!(e, PluginError::UnsupportedApiVersion(_)) {
                // Nothing sensible left to do if stderr is gone as well
                let _ = write!(stderr, "{}", e);
            }
            e.exit_status()
        }
    }
}

fn try_run<C, F>(args: &PluginArgs, input: &mut dyn Read, connect: F) -> Result<(), PluginError>
where
    C: DeserializeOwned,
    F: FnOnce(C, &[u8]) -> Result<Box<dyn Provider>, ProviderError>,
{
    if args.api_version.as_deref() != Some(API_VERSION) {
        return Err(PluginError::UnsupportedApiVersion(args.api_version.clone()));
    }

    let mut data = Vec::new();
    input.read_to_end(&mut data)?;
    let config: C = serde_json::from_slice(&data)?;
    debug!("Read {} bytes of provider configuration", data.len());

    let command = match args.command.as_deref().map(str::parse::<Command>) {
        Some(Ok(c)) => c,
        Some(Err(e)) => {
            warn!("{}, nothing to do", e);
            return Ok(());
        }
        None => {
            warn!("No command given, nothing to do");
            return Ok(());
        }
    };

    let provider = connect(config, &data)?;
    let record = ChallengeRecord {
        domain: args.domain.to_owned(),
        fqdn: args.fqdn.to_owned(),
        token: args.token.to_owned(),
    };
    execute(provider.as_ref(), command, &record)?;
    Ok(())
}

/// Perform a single command against a provider
pub fn execute(
    provider: &dyn Provider,
    command: Command,
    record: &ChallengeRecord,
) -> Result<(), ProviderError> {
    info!("Running {} for {}", command, record);
    match command {
        Command::Create => provider.create_txt_record(record)?,
        Command::Delete => provider.delete_txt_record(record)?,
    }
    info!("{} for {} completed", command, record.fqdn);
    Ok(())
}
