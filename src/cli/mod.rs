//! # CLI Module
//!
//! Command-line access to route manifests.
//!
//! ## Commands
//!
//! ### `routes`
//!
//! Print the route table a manifest produces, in priority order:
//!
//! ```bash
//! gaterouter routes --manifest routes.yaml
//! ```
//!
//! ### `match`
//!
//! Resolve one request against a manifest and print the rendered HTTP
//! response. Manifest routes use the echo handler, so the body shows the
//! arguments a real handler would receive:
//!
//! ```bash
//! gaterouter match --manifest routes.yaml -X POST --path '/lead?src=web' \
//!     -H 'X-Request-Id: 01ARZ3NDEKTSV4RRFFQ69G5FAV' --body '{"a":1}'
//! ```
//!
//! Exits with status 2 when no route matches.
//!
//! ## Usage from Code
//!
//! ```rust,ignore
//! use gaterouter::cli::{Cli, run_cli};
//! use clap::Parser;
//!
//! let code = run_cli(Cli::parse(), &mut std::io::stdout())?;
//! ```

mod commands;


pub use commands::{run_cli, Cli, Commands, EXIT_NOT_FOUND};
