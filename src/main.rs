mod cli;
mod report;

use std::error::Error;
use std::process::ExitCode;

use clap::Parser;
use cli::Cli;
use report::{render_catalog, render_reply};
use woodsim::{EngineConfig, Workbench};

fn main() -> Result<ExitCode, Box<dyn Error>> {
    env_logger::init();
    let cli = Cli::parse();

    // Without a configuration file the built-in catalog is used and charts go
    // to ./static_simulation.
    let config = match &cli.config {
        Some(path) => EngineConfig::from_path(path)?,
        None => EngineConfig::default(),
    };
    let workbench = Workbench::from_config(&config)?;

    let Some(operation) = cli.command.operation()? else {
        print!("{}", render_catalog(workbench.catalog()));
        return Ok(ExitCode::SUCCESS);
    };

    // Rejected requests still produce a JSON body; the exit status tells
    // scripts whether it is a response or an error payload.
    let reply = workbench.handle(&operation);
    println!("{}", render_reply(&reply));
    Ok(if reply.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
