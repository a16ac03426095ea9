// CLI configuration
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use flacmeta::{CommentPolicy, ParseOptions, TextEncoding};

/// flacmeta - FLAC metadata inspection tool
#[derive(Parser, Debug)]
#[command(name = "flacmeta")]
#[command(about = "Parse and print the metadata blocks of FLAC files", long_about = None)]
#[command(version)]
pub struct Config {
    /// Output format
    #[arg(short, long, value_enum, default_value = "pretty", global = true)]
    pub format: OutputFormat,

    /// Quiet mode (only errors are logged)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose mode (log every metadata block)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// JSON file with parser options
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Fail a block whose decoder does not consume exactly its declared length
    #[arg(long, global = true)]
    pub strict: bool,

    /// Decode comment text one byte per character instead of UTF-8
    #[arg(long, global = true)]
    pub latin1: bool,

    /// Fail the whole comment block on an entry without '='
    #[arg(long, global = true)]
    pub abort_on_bad_comment: bool,

    /// Subcommand
    #[command(subcommand)]
    pub command: Commands,
}

/// Output format for metadata
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Pretty-printed JSON
    #[default]
    Pretty,
    /// Compact JSON
    Json,
    /// Flattened key-value pairs
    KeyValue,
    /// Table format
    Table,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Read metadata from FLAC file(s)
    Read {
        /// File paths or glob patterns
        #[arg(value_name = "FILE", required = true)]
        files: Vec<String>,

        /// Output to file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Include picture bytes as base64
        #[arg(long)]
        include_picture_data: bool,

        /// Byte offset of the fLaC marker
        #[arg(long, default_value_t = 0)]
        offset: usize,

        /// Keep going after a file fails to parse
        #[arg(short, long)]
        keep_going: bool,
    },

    /// Detect whether files carry the FLAC stream marker
    Detect {
        #[arg(value_name = "FILE", required = true)]
        files: Vec<String>,
    },

    /// Export embedded pictures
    ExportCover {
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Output directory for cover images
        #[arg(short, long)]
        output: PathBuf,

        /// Picture index (all pictures when omitted)
        #[arg(short, long)]
        index: Option<usize>,

        /// Byte offset of the fLaC marker
        #[arg(long, default_value_t = 0)]
        offset: usize,
    },

    /// Show file information
    Info {
        #[arg(value_name = "FILE", required = true)]
        files: Vec<String>,

        /// Show detailed technical information
        #[arg(short, long)]
        detailed: bool,

        /// Byte offset of the fLaC marker
        #[arg(long, default_value_t = 0)]
        offset: usize,
    },
}

impl Config {
    /// Parser options from `--config`, with command-line flags applied on top.
    pub fn parse_options(&self) -> anyhow::Result<ParseOptions> {
        let mut options = match &self.config {
            Some(path) => load_options(path)?,
            None => ParseOptions::default(),
        };
        if self.strict {
            options.strict = true;
        }
        if self.latin1 {
            options.text_encoding = TextEncoding::Latin1;
        }
        if self.abort_on_bad_comment {
            options.comment_policy = CommentPolicy::Abort;
        }
        Ok(options)
    }

    /// Default log filter for the verbosity flags.
    pub fn log_level(&self) -> &'static str {
        if self.quiet {
            "error"
        } else if self.verbose {
            "debug"
        } else {
            "warn"
        }
    }
}

pub fn load_options(path: &Path) -> anyhow::Result<ParseOptions> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn flags_override_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"text_encoding": "latin1", "comment_policy": "skip"}}"#).unwrap();

        let path = file.path().to_str().unwrap().to_string();
        let config = Config::parse_from([
            "flacmeta",
            "--config",
            path.as_str(),
            "--abort-on-bad-comment",
            "read",
            "a.flac",
        ]);
        let options = config.parse_options().unwrap();
        assert_eq!(options.text_encoding, TextEncoding::Latin1);
        assert_eq!(options.comment_policy, CommentPolicy::Abort);
        assert!(!options.strict);
    }

    #[test]
    fn bad_config_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        assert!(load_options(file.path()).is_err());
    }

    #[test]
    fn offset_applies_to_every_parsing_command() {
        let config = Config::parse_from(["flacmeta", "info", "a.flac", "--offset", "128"]);
        assert!(matches!(config.command, Commands::Info { offset: 128, .. }));
        let config = Config::parse_from(["flacmeta", "export-cover", "a.flac", "-o", "out", "--offset", "7"]);
        assert!(matches!(config.command, Commands::ExportCover { offset: 7, .. }));
    }

    #[test]
    fn verbosity() {
        let config = Config::parse_from(["flacmeta", "-v", "detect", "x.flac"]);
        assert_eq!(config.log_level(), "debug");
        let config = Config::parse_from(["flacmeta", "detect", "x.flac", "--quiet"]);
        assert_eq!(config.log_level(), "error");
    }
}
