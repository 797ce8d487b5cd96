//! Input arguments shared by the subcommands.

use clap_verbosity_flag::{InfoLevel, Verbosity};
use clio::Input;
use hydronet_core::{HydraulicModel, ModelConfig};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::PathBuf;

use crate::CliError;

/// Arguments for reading a network document.
#[derive(Debug, clap::Args)]
pub struct NetworkInputArgs {
    /// Input file. Defaults to `-` for stdin.
    #[arg(value_parser, default_value = "-", help_heading = "Input")]
    pub input: Input,

    /// Model configuration: units and defaults for new assets.
    #[arg(
        short,
        long,
        help_heading = "Input",
        help = "Path to a JSON model configuration."
    )]
    pub config: Option<PathBuf>,

    /// Verbosity.
    #[command(flatten)]
    pub verbose: Verbosity<InfoLevel>,
}

impl NetworkInputArgs {
    /// Read the network document from the input.
    pub fn get_model(&mut self) -> Result<HydraulicModel, CliError> {
        self.get_model_from_reader(None::<&[u8]>)
    }

    /// Read the network document from `reader`, or from the input if none is
    /// given.
    pub fn get_model_from_reader<R: Read>(
        &mut self,
        reader: Option<R>,
    ) -> Result<HydraulicModel, CliError> {
        let model = match reader {
            Some(reader) => HydraulicModel::load(BufReader::new(reader))?,
            None => HydraulicModel::load(BufReader::new(&mut self.input))?,
        };
        Ok(model)
    }

    /// Read the model configuration, defaulting every field when no file is
    /// given.
    pub fn get_config(&self) -> Result<ModelConfig, CliError> {
        let Some(path) = &self.config else {
            return Ok(ModelConfig::default());
        };
        let file = File::open(path)?;
        Ok(ModelConfig::from_reader(BufReader::new(file))?)
    }
}
