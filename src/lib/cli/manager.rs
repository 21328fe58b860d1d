use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use clap::{Parser, ValueEnum};

use crate::{dump::DumpFormat, report::OutputFormat};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum FormatArg {
    /// Detect the format from the document shape
    #[default]
    Auto,
    /// rtcstats dump: `peerConnections` with event lists
    EventLog,
    /// webrtc-internals dump: `PeerConnections` with sparse stats
    SparseLog,
}

impl From<FormatArg> for Option<DumpFormat> {
    fn from(format: FormatArg) -> Self {
        match format {
            FormatArg::Auto => None,
            FormatArg::EventLog => Some(DumpFormat::EventLog),
            FormatArg::SparseLog => Some(DumpFormat::SparseLog),
        }
    }
}

#[derive(Debug, Parser)]
#[command(
    version = env!("CARGO_PKG_VERSION"),
    author = env!("CARGO_PKG_AUTHORS"),
    about = env!("CARGO_PKG_DESCRIPTION"),
)]
pub struct Args {
    /// Statistics dump to analyze, plain or gzip-compressed JSON
    #[arg(value_name = "DUMP")]
    pub dump: PathBuf,

    /// Dump format
    #[arg(long, value_enum, default_value_t = FormatArg::Auto)]
    pub format: FormatArg,

    /// Report output
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    pub output: OutputFormat,

    /// Settings file, defaults to settings.json in the user configuration folder
    #[arg(long, value_name = "PATH")]
    pub settings: Option<PathBuf>,

    /// Turn all log categories up to Debug, for more information check RUST_LOG env variable.
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Debug)]
struct Manager {
    clap_matches: Args,
}

lazy_static! {
    static ref MANAGER: Arc<Manager> = Arc::new(Manager::new());
}

impl Manager {
    fn new() -> Self {
        Self {
            clap_matches: Args::parse(),
        }
    }
}

// Construct our manager, should be done inside main
pub fn init() {
    MANAGER.as_ref();
}

// Check if the verbosity parameter was used
pub fn is_verbose() -> bool {
    MANAGER.clap_matches.verbose
}

pub fn dump_path() -> &'static Path {
    &MANAGER.clap_matches.dump
}

pub fn dump_format() -> Option<DumpFormat> {
    MANAGER.clap_matches.format.into()
}

pub fn output_format() -> OutputFormat {
    MANAGER.clap_matches.output
}

pub fn settings_path() -> Option<&'static Path> {
    MANAGER.clap_matches.settings.as_deref()
}

// Return the command line used to start this application
pub fn command_line_string() -> String {
    std::env::args().collect::<Vec<String>>().join(" ")
}

// Return the parsed arguments, for debugging
pub fn command_line() -> String {
    format!("{:?}", MANAGER.clap_matches)
}
