use clap::Parser;
use gaterouter::cli::{run_cli, Cli};
use gaterouter::logging::{init_logging, LogConfig};
use std::process::ExitCode;

fn main() -> anyhow::Result<ExitCode> {
    init_logging(&LogConfig::from_env())?;
    let cli = Cli::parse();
    let code = run_cli(cli, &mut std::io::stdout().lock())?;
    Ok(ExitCode::from(code))
}
