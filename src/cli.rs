use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde_json::{Number, Value};
use woodsim::{MeasurementRequest, Operation, PlotRequest, PropertyRequest, Tool};

/// Command line front end for the wood measurement workbench.
#[derive(Debug, Parser)]
#[command(version, about)]
pub struct Cli {
    /// JSON configuration file.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Operation to run.
    #[command(subcommand)]
    pub command: Commands,
}

/// Operations available from the command line.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// List the catalogued materials.
    Materials,
    /// Read one tool on one material.
    Measure {
        /// Material name, for example `Pine`.
        #[arg(long)]
        wood: String,
        /// Tool identifier.
        #[arg(long, value_parser = tool_ids())]
        tool: String,
    },
    /// Derive mechanical properties from measured values.
    Calculate {
        /// Material name, for example `MDF`.
        #[arg(long)]
        wood: String,
        /// Measured density in kg/m³.
        #[arg(long)]
        density: String,
        /// Measured porosity fraction.
        #[arg(long)]
        porosity: String,
        /// Measured moisture fraction.
        #[arg(long)]
        moisture: String,
    },
    /// Render charts from a plot request file, or `-` for standard input.
    Plot {
        /// Path of a JSON plot request.
        request: PathBuf,
    },
}

/// Tool identifiers offered as values of `--tool`.
fn tool_ids() -> Vec<&'static str> {
    Tool::ALL.into_iter().map(Tool::id).collect()
}

/// Command line values stay strings so the workbench coerces them exactly as it
/// would coerce a JSON request; plain numbers are passed on as JSON numbers.
fn loose_value(raw: &str) -> Value {
    raw.parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map_or_else(|| Value::String(raw.to_string()), Value::Number)
}

impl Commands {
    /// Translate the command into a workbench operation, if it is one.
    ///
    /// # Errors
    ///
    /// Returns an error when a plot request cannot be read or parsed.
    pub fn operation(&self) -> Result<Option<Operation>, Box<dyn std::error::Error>> {
        let operation = match self {
            Commands::Materials => None,
            Commands::Measure { wood, tool } => Some(Operation::Measure(MeasurementRequest {
                wood_type: wood.clone(),
                tool_id: tool.clone(),
            })),
            Commands::Calculate {
                wood,
                density,
                porosity,
                moisture,
            } => Some(Operation::Calculate(PropertyRequest {
                wood_type: wood.clone(),
                density: Some(loose_value(density)),
                porosity: Some(loose_value(porosity)),
                moisture: Some(loose_value(moisture)),
            })),
            Commands::Plot { request } => {
                let json = if request.as_os_str() == "-" {
                    let mut buffer = String::new();
                    io::stdin().read_to_string(&mut buffer)?;
                    buffer
                } else {
                    fs::read_to_string(request)?
                };
                let request: PlotRequest = serde_json::from_str(&json)?;
                Some(Operation::UpdatePlot(request))
            }
        };
        Ok(operation)
    }
}
