use std::{io, process::ExitCode};

use clap::Parser;
use env_logger::Builder;

use dns01_providers::{
    cli::{self, PluginArgs},
    plugin,
    provider::{NoopConfig, NoopProvider},
};

/// DNS-01 plugin that prints the challenge record instead of creating it
#[derive(Debug, Clone, PartialEq, Eq, Hash, Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(flatten)]
    plugin: PluginArgs,
}

fn main() -> ExitCode {
    let args: Args = match cli::parse_args() {
        Ok(args) => args,
        Err(status) => return status.into(),
    };

    Builder::new().filter_level(args.plugin.loglevel.into()).init();

    plugin::run(
        &args.plugin,
        &mut io::stdin().lock(),
        &mut io::stderr(),
        // A `null` config is accepted like an empty one
        |config: Option<NoopConfig>, _| NoopProvider::from_config(&config.unwrap_or_default()),
    )
    .into()
}
