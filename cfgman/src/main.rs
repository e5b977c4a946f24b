use std::io;

use clap::Parser;
use log::LevelFilter;

use cfgman::Cli;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(if cli.verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Warn
        })
        .parse_default_env()
        .init();

    let opts = cli.startup_options();
    let mut stdout = io::stdout().lock();
    cfgman::run(&cli.app, &opts, cli.command, &mut stdout)
}
