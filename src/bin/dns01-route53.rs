use std::{io, process::ExitCode};

use clap::Parser;
use env_logger::Builder;

use dns01_providers::{
    cli::{self, PluginArgs},
    plugin,
    provider::{Route53Config, Route53Provider, Route53ProviderConfig},
};

/// DNS-01 plugin for AWS Route53
#[derive(Debug, Clone, PartialEq, Eq, Hash, Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(flatten)]
    plugin: PluginArgs,

    /// Hosted zone to write records to. Looked up from the domain if unset
    #[arg(long, value_name = "ID", env = "ZONEID")]
    zone_id: Option<String>,

    /// Access key id, used if the config on stdin has no credentials
    #[arg(long, value_name = "KEY", env = "AWS_ACCESS_KEY_ID", hide_env_values = true)]
    aws_access_key_id: Option<String>,

    #[arg(long, value_name = "SECRET", env = "AWS_SECRET_ACCESS_KEY", hide_env_values = true)]
    aws_secret_access_key: Option<String>,

    #[arg(long, value_name = "TOKEN", env = "AWS_SESSION_TOKEN", hide_env_values = true)]
    aws_session_token: Option<String>,
}

impl From<&Args> for Route53ProviderConfig {
    fn from(args: &Args) -> Self {
        Route53ProviderConfig {
            zone_id: args.zone_id.to_owned(),
            access_key_id: args.aws_access_key_id.to_owned(),
            secret_access_key: args.aws_secret_access_key.to_owned(),
            session_token: args.aws_session_token.to_owned(),
        }
    }
}

fn main() -> ExitCode {
    let args: Args = match cli::parse_args() {
        Ok(args) => args,
        Err(status) => return status.into(),
    };

    Builder::new().filter_level(args.plugin.loglevel.into()).init();

    let env = Route53ProviderConfig::from(&args);
    plugin::run(
        &args.plugin,
        &mut io::stdin().lock(),
        &mut io::stderr(),
        |config: Route53Config, _| Route53Provider::from_config(&config, &env),
    )
    .into()
}
