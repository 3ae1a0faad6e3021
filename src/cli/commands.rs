use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use http::Method;
use std::io::Write;
use std::path::PathBuf;

use crate::dispatcher::Dispatch;
use crate::manifest::load_manifest;
use crate::runtime_config::RuntimeConfig;
use crate::server::{RequestContext, RequestEnv, ResponseBuffer};

/// Exit status when no route matched
pub const EXIT_NOT_FOUND: u8 = 2;

/// Command-line interface for gaterouter
#[derive(Parser, Debug)]
#[command(name = "gaterouter")]
#[command(about = "Inspect route manifests and resolve requests against them", long_about = None)]
#[command(version)]
pub struct Cli {
    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the route table built from a manifest
    Routes {
        /// Path to the route manifest (YAML or TOML)
        #[arg(short, long, env = "GATEROUTER_MANIFEST")]
        manifest: PathBuf,
    },
    /// Dispatch one request against a manifest and print the response
    Match {
        /// Path to the route manifest (YAML or TOML)
        #[arg(short, long, env = "GATEROUTER_MANIFEST")]
        manifest: PathBuf,

        /// HTTP method
        #[arg(short = 'X', long, default_value = "GET")]
        method: String,

        /// Request target, optionally with a query string
        #[arg(short, long)]
        path: String,

        /// Request header as `Name: value` (repeatable)
        #[arg(short = 'H', long = "header")]
        headers: Vec<String>,

        /// Request body
        #[arg(short, long)]
        body: Option<String>,
    },
}

/// Run a parsed command, writing its output to `out`.
///
/// Returns the process exit status: `0`, or [`EXIT_NOT_FOUND`] when
/// `match` found no route.
pub fn run_cli(cli: Cli, out: &mut dyn Write) -> Result<u8> {
    match cli.command {
        Commands::Routes { manifest } => {
            let app = load_manifest(&manifest)?.into_app_with_config(RuntimeConfig::from_env())?;
            write!(out, "{}", app.table().dump())?;
            Ok(0)
        }
        Commands::Match {
            manifest,
            method,
            path,
            headers,
            body,
        } => {
            let app = load_manifest(&manifest)?.into_app_with_config(RuntimeConfig::from_env())?;
            let req = build_request(&method, &path, &headers, body)?;
            let env = RequestEnv::from_request(req);

            let mut sink = ResponseBuffer::new();
            let outcome = app.dispatch(&env, &mut sink);
            match &outcome {
                Dispatch::NotFound => {
                    writeln!(out, "404 Not Found: {} {}", env.method(), env.path())?;
                    return Ok(EXIT_NOT_FOUND);
                }
                Dispatch::Handled { index, name }
                | Dispatch::Declined { index, name }
                | Dispatch::Withheld { index, name } => {
                    writeln!(out, "[dispatch] {} #{index} {name}", outcome.as_str())?;
                }
            }
            if outcome.is_handled() {
                sink.write_to(&mut *out)?;
                writeln!(out)?;
            }
            Ok(0)
        }
    }
}

fn build_request(
    method: &str,
    target: &str,
    headers: &[String],
    body: Option<String>,
) -> Result<http::Request<Vec<u8>>> {
    let method = Method::from_bytes(method.trim().to_ascii_uppercase().as_bytes())
        .map_err(|_| anyhow!("invalid method `{method}`"))?;
    let mut builder = http::Request::builder().method(method).uri(target);
    for header in headers {
        let (name, value) = header
            .split_once(':')
            .ok_or_else(|| anyhow!("invalid header `{header}`, expected `Name: value`"))?;
        builder = builder.header(name.trim(), value.trim());
    }
    builder
        .body(body.map(String::into_bytes).unwrap_or_default())
        .context("Failed to build request")
}
