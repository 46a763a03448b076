use std::{io, process::ExitCode};

use clap::Parser;
use env_logger::Builder;

use dns01_providers::{
    cli::{self, PluginArgs},
    plugin,
    provider::{CloudflareConfig, CloudflareProvider},
};

/// DNS-01 plugin for the Cloudflare API
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
        |config: CloudflareConfig, _| CloudflareProvider::from_config(&config),
    )
    .into()
}
