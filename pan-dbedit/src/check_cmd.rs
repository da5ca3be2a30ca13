use anyhow::{bail, Context, Result};
use chrono::Local;
use pan_dbedit::builder::BuildOptions;
use pan_dbedit::changeset::{read_changeset, ParseReport};
use pan_dbedit::logging::{self, LogOptions};
use pan_dbedit::report::render_parse_report;
use serde::Serialize;

use crate::cli::{CheckArgs, OutputFormat};

#[derive(Serialize)]
struct PlannedOperation {
    location: String,
    action: String,
    #[serde(rename = "type")]
    key: String,
    name: String,
}

#[derive(Serialize)]
struct CheckReport {
    parse: ParseReport,
    operations: Vec<PlannedOperation>,
}

pub fn run_check(args: CheckArgs) -> Result<()> {
    let _guard = logging::init(&LogOptions {
        verbose: args.verbose,
        quiet: args.quiet,
        file: None,
    })
    .context("failed to initialize logging")?;

    let options = BuildOptions {
        checks: !args.no_checks,
    };
    let (changeset, parse) = read_changeset(&args.changes, options, Local::now().date_naive())?;
    let operations: Vec<PlannedOperation> = changeset
        .iter()
        .map(|(location, key, operation)| PlannedOperation {
            location: location.to_string(),
            action: operation.action().to_string(),
            key: key.to_string(),
            name: operation.name(),
        })
        .collect();
    let skipped = parse.skipped.len();

    match args.format {
        OutputFormat::Text => {
            println!("{}", render_parse_report(&parse));
            for op in &operations {
                println!(
                    "OP location={} action={} type={} name={}",
                    op.location, op.action, op.key, op.name
                );
            }
        }
        OutputFormat::Json => {
            let report = CheckReport { parse, operations };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    if args.strict && skipped > 0 {
        bail!("check failed in strict mode: {skipped} row(s) skipped");
    }
    Ok(())
}
