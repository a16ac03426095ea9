// CLI module for flacmeta
//
// Reads files from disk and hands the bytes to the library; all parsing
// happens in the `flacmeta` crate.

pub mod commands;
pub mod config;
pub mod output;

pub use config::{Commands, Config};
pub use output::OutputFormatter;

use tracing_subscriber::EnvFilter;

/// Install the stderr log subscriber. `RUST_LOG` takes precedence over the
/// verbosity flags.
pub fn init_logging(config: &Config) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config.log_level()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Dispatch the parsed command line.
pub fn run(config: &Config) -> anyhow::Result<()> {
    let options = config.parse_options()?;
    let formatter = OutputFormatter::new(config.format, config.quiet);

    match &config.command {
        Commands::Read {
            files,
            output,
            include_picture_data,
            offset,
            keep_going,
        } => commands::command_read(
            files,
            output.as_deref(),
            *include_picture_data,
            *offset,
            *keep_going,
            &options,
            &formatter,
        ),
        Commands::Detect { files } => commands::command_detect(files, &formatter),
        Commands::ExportCover {
            file,
            output,
            index,
            offset,
        } => commands::command_export_cover(file, output, *index, *offset, &options, &formatter),
        Commands::Info {
            files,
            detailed,
            offset,
        } => commands::command_info(files, *detailed, *offset, &options),
    }
}
