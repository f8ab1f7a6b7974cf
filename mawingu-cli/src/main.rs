//! ## mawingu-cli
//! **Live LAN traffic monitor**
//!
//! `mawingu <INTERFACE>` captures on an interface and prints a traffic report
//! on a fixed interval until interrupted. `--read FILE` replays a pcap file
//! instead. Run without arguments to list capture-capable interfaces.

use std::process::ExitCode;

use clap::Parser;

mod commands;

use commands::Cli;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match commands::run(cli).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %format!("{e:#}"), "mawingu exited with an error");
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
