//! Roadcast CLI - Command line tool for road weather forecasts.

use clap::Parser;

#[derive(Parser)]
#[command(
    name = "roadcast-cli",
    version,
    about = "Road surface condition forecast toolkit"
)]
struct Cli {
    #[command(subcommand)]
    command: roadcast_cmd::Command,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();
    if let Err(e) = roadcast_cmd::run(cli.command) {
        log::error!("{:#}", e);
        std::process::exit(1);
    }
}
