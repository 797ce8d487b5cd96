//! The `apply` subcommand.

use anyhow::Result;
use clap::Parser;
use clio::{Input, Output};
use hydronet_core::ops::Operation;
use hydronet_core::{Editor, HydraulicModel};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::PathBuf;
use tracing::{debug, info};

use crate::CliError;
use crate::network_io::NetworkInputArgs;

/// Apply an edit script to a network.
#[derive(Parser, Debug)]
#[clap(version, long_about = None)]
#[clap(about = "Apply an edit script to a network document.")]
#[group(id = "hydronet")]
#[non_exhaustive]
pub struct ApplyArgs {
    /// Network input.
    #[command(flatten)]
    pub input_args: NetworkInputArgs,

    /// JSON array of operations, applied in order.
    #[arg(short, long, value_parser, help_heading = "Script")]
    pub script: Input,

    /// Number of trailing operations to undo after the script ran.
    #[arg(long, default_value = "0", help_heading = "Script")]
    pub undo: usize,

    /// Write the moment log to this file.
    #[arg(long, help_heading = "Output")]
    pub log: Option<PathBuf>,

    /// Output file for the edited network. Use '-' for stdout.
    #[clap(short, long, value_parser, default_value = "-")]
    pub output: Output,
}

impl ApplyArgs {
    /// Run the script against the network.
    ///
    /// The whole script is rejected on the first failing operation, and
    /// nothing is written in that case.
    ///
    /// # Arguments
    ///
    /// * `input_override` - Optional reader to use instead of the CLI input argument.
    /// * `output_override` - Optional writer to use instead of the CLI output argument.
    pub fn run_apply_with_io<R: Read, W: Write>(
        &mut self,
        input_override: Option<R>,
        output_override: Option<W>,
    ) -> Result<()> {
        let config = self.input_args.get_config()?;
        let model = self.input_args.get_model_from_reader(input_override)?;
        let script: Vec<Operation> =
            serde_json::from_reader(BufReader::new(&mut self.script)).map_err(CliError::from)?;

        let mut editor = Editor::with_model(model, config);
        for (index, op) in script.into_iter().enumerate() {
            let state_id = editor
                .transact(op)
                .map_err(|source| CliError::Operation { index, source })?;
            debug!(index, %state_id, note = editor.log().last().map(|m| m.note()), "applied");
        }
        for _ in 0..self.undo {
            if !editor.undo() {
                break;
            }
        }
        editor.model().validate().map_err(CliError::from)?;
        info!(
            steps = editor.log().pointer() + 1,
            version = editor.version(),
            "script applied"
        );

        if let Some(path) = &self.log {
            let file = File::create(path).map_err(CliError::from)?;
            serde_json::to_writer_pretty(BufWriter::new(file), editor.log())?;
        }
        match output_override {
            Some(writer) => write_model(editor.model(), writer),
            None => write_model(editor.model(), &mut self.output),
        }
    }

    /// Run the script.
    pub fn run_apply(&mut self) -> Result<()> {
        self.run_apply_with_io(None::<&[u8]>, None::<Vec<u8>>)
    }
}

fn write_model<W: Write>(model: &HydraulicModel, mut writer: W) -> Result<()> {
    model.store(&mut writer)?;
    writeln!(writer)?;
    Ok(())
}
