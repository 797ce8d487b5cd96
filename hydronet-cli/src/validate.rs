//! The `validate` subcommand.

use anyhow::Result;
use clap::Parser;
use std::io::Read;
use tracing::info;

use crate::network_io::NetworkInputArgs;

/// Validate a network document.
#[derive(Parser, Debug)]
#[clap(version, long_about = None)]
#[clap(about = "Validate a network document.")]
#[group(id = "hydronet")]
#[non_exhaustive]
pub struct ValArgs {
    /// Network input.
    #[command(flatten)]
    pub input_args: NetworkInputArgs,
}

/// String to print when validation is successful.
pub const VALID_PRINT: &str = "Network valid!";

impl ValArgs {
    /// Load the network and check the model invariants, including the active
    /// topology.
    ///
    /// # Arguments
    ///
    /// * `input_override` - Optional reader to use instead of the CLI input argument.
    pub fn run_with_input<R: Read>(&mut self, input_override: Option<R>) -> Result<()> {
        let model = self.input_args.get_model_from_reader(input_override)?;
        model
            .validate_active_topology()
            .map_err(crate::CliError::from)?;
        info!(
            nodes = model.nodes().count(),
            links = model.links().count(),
            "{VALID_PRINT}"
        );
        Ok(())
    }

    /// Load and validate the network.
    pub fn run(&mut self) -> Result<()> {
        self.run_with_input(None::<&[u8]>)
    }
}
