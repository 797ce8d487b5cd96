//! Describe the contents of network documents.
use crate::network_io::NetworkInputArgs;
use anyhow::Result;
use clap::Parser;
use clio::Output;
use hydronet_core::HydraulicModel;
use hydronet_core::asset::AssetType;
use serde::Serialize;
use std::io::{Read, Write};

/// Summarize a network document.
#[derive(Parser, Debug)]
#[clap(version, long_about = None)]
#[clap(about = "Describe the contents of a network document.")]
#[group(id = "hydronet")]
#[non_exhaustive]
pub struct DescribeArgs {
    /// Network input.
    #[command(flatten)]
    pub input_args: NetworkInputArgs,

    #[arg(long, default_value = "false", help_heading = "JSON")]
    /// Output in json format
    pub json: bool,

    /// Output file. Use '-' for stdout.
    #[clap(short, long, value_parser, default_value = "-")]
    pub output: Output,
}

/// Counts and totals of a network.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NetworkSummary {
    /// Length unit of the network.
    pub length_unit: String,
    /// Number of assets of each type, in a fixed order.
    pub assets: Vec<(AssetType, usize)>,
    /// Number of inactive assets.
    pub inactive: usize,
    /// Number of customer points.
    pub customer_points: usize,
    /// Number of connected customer points.
    pub connected_customer_points: usize,
    /// Number of curves.
    pub curves: usize,
    /// Junction and customer demand.
    pub total_demand: f64,
}

impl From<&HydraulicModel> for NetworkSummary {
    fn from(model: &HydraulicModel) -> Self {
        let assets = [
            AssetType::Junction,
            AssetType::Reservoir,
            AssetType::Tank,
            AssetType::Pipe,
            AssetType::Pump,
            AssetType::Valve,
        ]
        .into_iter()
        .map(|ty| (ty, model.assets().filter(|a| a.asset_type() == ty).count()))
        .collect();
        Self {
            length_unit: model.units().length.to_string(),
            assets,
            inactive: model.assets().filter(|a| !a.is_active()).count(),
            customer_points: model.customer_points().count(),
            connected_customer_points: model
                .customer_points()
                .filter(|cp| cp.is_connected())
                .count(),
            curves: model.curves().count(),
            total_demand: model.total_demand(),
        }
    }
}

impl DescribeArgs {
    /// Load and describe the network with optional input/output overrides.
    ///
    /// # Arguments
    ///
    /// * `input_override` - Optional reader to use instead of the CLI input argument.
    /// * `output_override` - Optional writer to use instead of the CLI output argument.
    pub fn run_describe_with_io<R: Read, W: Write>(
        &mut self,
        input_override: Option<R>,
        mut output_override: Option<W>,
    ) -> Result<()> {
        let model = self.input_args.get_model_from_reader(input_override)?;
        let summary = NetworkSummary::from(&model);

        let writer: &mut dyn Write = if let Some(ref mut w) = output_override {
            w
        } else {
            &mut self.output
        };

        if self.json {
            serde_json::to_writer_pretty(&mut *writer, &summary)?;
            writeln!(writer)?;
        } else {
            print_summary(&summary, writer)?;
        }
        Ok(())
    }

    /// Load and describe the network.
    pub fn run_describe(&mut self) -> Result<()> {
        self.run_describe_with_io(None::<&[u8]>, None::<Vec<u8>>)
    }
}

/// Print a human-readable summary.
fn print_summary<W: Write + ?Sized>(summary: &NetworkSummary, writer: &mut W) -> Result<()> {
    let n_assets: usize = summary.assets.iter().map(|(_, n)| n).sum();
    let asset_str = if n_assets == 1 { "asset" } else { "assets" };
    writeln!(
        writer,
        "Network contains {n_assets} {asset_str} ({} inactive), lengths in {}",
        summary.inactive, summary.length_unit
    )?;
    for (asset_type, count) in summary.assets.iter().filter(|(_, n)| *n > 0) {
        writeln!(writer, "  {asset_type:<10} {count}")?;
    }
    writeln!(
        writer,
        "Customer points: {} ({} connected)",
        summary.customer_points, summary.connected_customer_points
    )?;
    writeln!(writer, "Curves: {}", summary.curves)?;
    writeln!(writer, "Total demand: {}", summary.total_demand)?;
    Ok(())
}
