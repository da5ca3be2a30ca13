use anyhow::Result;
use clap::Parser;

mod apply_cmd;
mod check_cmd;
mod cli;
mod confirm;
mod export_cmd;
mod path_guard;

use cli::{Cli, Command};

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Apply(args) => apply_cmd::run_apply(args),
        Command::Check(args) => check_cmd::run_check(args),
        Command::Export(args) => export_cmd::run_export(args),
    }
}
