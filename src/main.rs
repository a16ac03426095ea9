// CLI binary entry point for flacmeta

use clap::Parser;
use std::process;

mod cli;

fn main() {
    let config = cli::Config::parse();
    cli::init_logging(&config);

    if let Err(e) = cli::run(&config) {
        eprintln!("✗ {:#}", e);
        process::exit(1);
    }
}
