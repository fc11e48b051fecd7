//! CLI domain: parse, route and output only.
//! Publishing and verification live in the library; the route table wires
//! configured collaborators to them.

mod output;
mod parse;
mod route;

pub use output::{format_batch_report, format_verification, map_error};
pub use parse::{Cli, Commands, ConfigCommands};
pub use route::{CommandOutput, RunContext};
