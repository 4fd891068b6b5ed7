use clap::{Parser, Subcommand};

/// Builds YAML document trees and resolves anchors, aliases and merge keys
#[derive(Parser)]
#[command(author, about, long_about=None, disable_version_flag(true))]
pub struct Args {
    /// force color mode (defaults to check tty)
    #[arg(long)]
    pub color: bool,

    /// force no-color mode (defaults to check tty)
    #[arg(long)]
    pub no_color: bool,

    /// display version and quit
    #[arg(short = 'V', long = "version")]
    pub version: bool,

    /// prepend time to each log line
    #[arg(long)]
    pub log_time: bool,

    /// Turn general verbose logging
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Configure component wise logging (COMPONENT[=LEVEL])
    #[arg(long, short, action = clap::ArgAction::Append)]
    pub log: Option<Vec<String>>,

    /// quiet parse errors
    #[arg(short, long)]
    pub quiet: bool,

    /// Overwrite scalar buffers once they are no longer needed
    #[arg(long)]
    pub secure_erase: bool,

    #[command(subcommand)]
    pub action: Option<Actions>,
}

#[derive(Subcommand)]
pub enum Actions {
    Dump {
        /// Print resolved documents as block YAML

        /// Input files ('-' or none for stdin)
        #[clap(name = "FILE")]
        files: Vec<String>,

        /// Skip alias and merge-key resolution
        #[arg(long)]
        raw: bool,
    },
    Check {
        /// Parse and resolve documents, reporting the first error

        /// Input files ('-' or none for stdin)
        #[clap(name = "FILE")]
        files: Vec<String>,
    },
    Anchors {
        /// List anchored nodes with their share counts

        /// Input files ('-' or none for stdin)
        #[clap(name = "FILE")]
        files: Vec<String>,

        /// Report counts of the unresolved tree
        #[arg(long)]
        raw: bool,
    },
}
