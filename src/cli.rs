//! Argument parsing shared by all plugin binaries.
//!
//! The ACME client passes everything through environment variables, so every argument here is read
//! from the environment first. The long flags exist for running a plugin by hand.

use clap::{error::ErrorKind, Args, Parser, ValueEnum};
use log::LevelFilter;

use crate::{config::API_VERSION, plugin::ExitStatus};

/// Environment variable that carries the plugin protocol version
pub const API_VERSION_ENV: &str = "APIVERSION";

macro_rules! env_prefix {
    () => {
        "DNS01_"
    };
}

/// Parameters of a single plugin invocation
#[derive(Debug, Clone, PartialEq, Eq, Hash, Args)]
pub struct PluginArgs {
    /// Plugin protocol version requested by the caller. Only `v1` is supported
    #[arg(long, value_name = "VERSION", env = API_VERSION_ENV)]
    pub api_version: Option<String>,

    /// Operation to perform, either CREATE or DELETE
    #[arg(long, value_name = "COMMAND", env = "COMMAND")]
    pub command: Option<String>,

    /// Domain being validated. Used to find the zone that holds the challenge record
    #[arg(long, value_name = "DOMAIN", env = "DOMAIN", default_value = "")]
    pub domain: String,

    /// Fully qualified name of the challenge TXT record
    #[arg(long, value_name = "FQDN", env = "FQDN", default_value = "")]
    pub fqdn: String,

    /// Content of the challenge TXT record
    #[arg(long, value_name = "TOKEN", env = "TOKEN", default_value = "")]
    pub token: String,

    /// Set the loglevel of the plugin. Logs are written to stderr
    #[arg(
        value_enum,
        short = 'l',
        long,
        default_value_t = Loglevel::Warn,
        value_name = "LEVEL",
        env = concat!(env_prefix!(), "LOGLEVEL")
    )]
    pub loglevel: Loglevel,
}

/// Used to set the applications loglevel
// This is essentially a re-creation of log:Level. However, that enum doesn't derive ValueEnum, so we have to do it manually here
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, ValueEnum)]
pub enum Loglevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}
impl From<Loglevel> for LevelFilter {
    fn from(ll: Loglevel) -> Self {
        match ll {
            Loglevel::Error => LevelFilter::Error,
            Loglevel::Warn => LevelFilter::Warn,
            Loglevel::Info => LevelFilter::Info,
            Loglevel::Debug => LevelFilter::Debug,
            Loglevel::Trace => LevelFilter::Trace,
        }
    }
}

/// Parse the arguments of a plugin binary.
///
/// A caller speaking another protocol version must still see exit status 3, even if it also passes
/// arguments this plugin does not understand. Parse errors are only printed for `v1` callers.
pub fn parse_args<A: Parser>() -> Result<A, ExitStatus> {
    A::try_parse().map_err(|e| {
        let api_version = std::env::var(API_VERSION_ENV).ok();
        let status = arg_error_status(e.kind(), api_version.as_deref());
        if status != ExitStatus::UnsupportedApiVersion {
            // Help and version output go to stdout, real errors to stderr
            let _ = e.print();
        }
        status
    })
}

/// Exit status for arguments that failed to parse
pub fn arg_error_status(kind: ErrorKind, api_version: Option<&str>) -> ExitStatus {
    match kind {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitStatus::Success,
        _ if api_version != Some(API_VERSION) => ExitStatus::UnsupportedApiVersion,
        _ => ExitStatus::Failure,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Parser)]
    struct TestCli {
        #[command(flatten)]
        plugin: PluginArgs,
    }

    #[test]
    fn should_default_to_empty_record_fields() {
        let cli = TestCli::try_parse_from(["plugin", "--api-version", "v1"]).unwrap();
        assert_eq!(cli.plugin.api_version.as_deref(), Some("v1"));
        assert_eq!(cli.plugin.command, None);
        assert_eq!(cli.plugin.domain, "");
        assert_eq!(cli.plugin.fqdn, "");
        assert_eq!(cli.plugin.token, "");
        assert_eq!(cli.plugin.loglevel, Loglevel::Warn);
    }

    #[test]
    fn should_parse_all_flags() {
        let cli = TestCli::try_parse_from([
            "plugin",
            "--api-version",
            "v1",
            "--command",
            "CREATE",
            "--domain",
            "example.com",
            "--fqdn",
            "_acme-challenge.example.com.",
            "--token",
            "abc",
            "-l",
            "debug",
        ])
        .unwrap();
        assert_eq!(cli.plugin.command.as_deref(), Some("CREATE"));
        assert_eq!(cli.plugin.domain, "example.com");
        assert_eq!(cli.plugin.fqdn, "_acme-challenge.example.com.");
        assert_eq!(cli.plugin.token, "abc");
        assert_eq!(LevelFilter::from(cli.plugin.loglevel), LevelFilter::Debug);
    }

    #[test]
    fn should_gate_bad_arguments_on_api_version() {
        let err = TestCli::try_parse_from(["plugin", "-l", "verbose"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidValue);
        assert_eq!(
            arg_error_status(err.kind(), Some("v2")),
            ExitStatus::UnsupportedApiVersion
        );
        assert_eq!(
            arg_error_status(err.kind(), None),
            ExitStatus::UnsupportedApiVersion
        );
        assert_eq!(arg_error_status(err.kind(), Some("v1")), ExitStatus::Failure);

        let err = TestCli::try_parse_from(["plugin", "extra-arg"]).unwrap_err();
        assert_eq!(
            arg_error_status(err.kind(), Some("v2")),
            ExitStatus::UnsupportedApiVersion
        );
        assert_eq!(arg_error_status(err.kind(), Some("v1")), ExitStatus::Failure);
    }

    #[test]
    fn should_not_fail_on_help() {
        let err = TestCli::try_parse_from(["plugin", "--help"]).unwrap_err();
        assert_eq!(arg_error_status(err.kind(), None), ExitStatus::Success);
    }
}
