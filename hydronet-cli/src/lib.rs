//! Standard command line tools, used by the hydronet binary.

use clap::Parser;
use clap_verbosity_flag::{InfoLevel, Verbosity};
use hydronet_core::model::{LoadError, ValidationError};
use hydronet_core::ops::OperationError;
use thiserror::Error;

pub mod apply;
pub mod describe;
pub mod network_io;
pub mod validate;

/// CLI arguments.
#[derive(Parser, Debug)]
#[clap(version, long_about = None)]
#[clap(about = "Hydronet CLI tools.")]
#[group(id = "hydronet")]
#[non_exhaustive]
pub enum CliArgs {
    /// Validate a network document.
    Validate(validate::ValArgs),
    /// Summarize the contents of a network document.
    Describe(describe::DescribeArgs),
    /// Apply an edit script to a network document.
    Apply(apply::ApplyArgs),
}

impl CliArgs {
    /// The verbosity requested for the subcommand.
    #[must_use]
    pub fn verbosity(&self) -> &Verbosity<InfoLevel> {
        match self {
            CliArgs::Validate(args) => &args.input_args.verbose,
            CliArgs::Describe(args) => &args.input_args.verbose,
            CliArgs::Apply(args) => &args.input_args.verbose,
        }
    }
}

/// Error type for the CLI.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CliError {
    /// Error reading input.
    #[error("Error reading from path: {0}")]
    InputFile(#[from] std::io::Error),
    /// Error parsing input.
    #[error("Error parsing input: {0}")]
    Parse(#[from] serde_json::Error),
    /// The network document could not be loaded.
    #[error("Error loading network: {0}")]
    Load(#[from] LoadError),
    /// The network breaks a model invariant.
    #[error("Invalid network: {0}")]
    Invalid(#[from] ValidationError),
    /// An operation of an edit script failed.
    #[error("Operation {index} failed: {source}")]
    Operation {
        /// Position of the operation in the script.
        index: usize,
        /// The failure.
        source: OperationError,
    },
}
