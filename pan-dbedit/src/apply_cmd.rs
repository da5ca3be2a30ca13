use std::fs;

use anyhow::{bail, Context, Result};
use pan_dbedit::coordinator::{FinishOutcome, LockPolicy};
use pan_dbedit::device::{DeviceClient, XmlDevice};
use pan_dbedit::error::InfrastructureError;
use pan_dbedit::logging::{self, LogFile, LogOptions};
use pan_dbedit::report::render_run_summary;
use pan_dbedit::run::{self, RunOptions};
use pan_dbedit::settings::Settings;
use tracing::{error, info};

use crate::cli::{ApplyArgs, OutputFormat};
use crate::confirm::confirm;
use crate::path_guard;

pub fn run_apply(args: ApplyArgs) -> Result<()> {
    let settings = Settings::load(args.settings.as_deref())?;
    let file = (settings.logging.file && !args.no_log_file).then(|| LogFile {
        dir: settings.logging.dir.clone(),
        prefix: settings.logging.file_prefix.clone(),
    });
    let _guard = logging::init(&LogOptions {
        verbose: args.verbose,
        quiet: args.quiet,
        file,
    })
    .context("failed to initialize logging")?;

    for output in [&args.output, &args.summary_json].into_iter().flatten() {
        path_guard::ensure_output_not_same(output, &[&args.config, &args.changes])?;
    }

    let predefined = settings.predefined()?;
    let mut device = XmlDevice::open(&args.config, predefined)?;
    if let (true, Some(output)) = (args.commit, &args.output) {
        device = device.with_output(output);
    }

    let options = RunOptions {
        location: args.location.clone(),
        checks: !args.no_checks,
        locks: LockPolicy {
            test_mode: args.test,
            use_locks: !args.no_locks,
            commit: args.commit,
            release_attempts: settings.locks.release_attempts,
        },
    };
    if args.interactive {
        eprintln!("{}", run_banner(&args, &device));
        if !confirm("Confirm these details and continue?")? {
            info!("run cancelled at the confirmation prompt");
            eprintln!("aborted: no changes were made");
            return Ok(());
        }
    }

    let summary = run::execute(&mut device, &args.changes, &options).inspect_err(|err| {
        error!(error = %err, "run aborted");
    })?;

    if let Some(output) = &args.output {
        if matches!(
            summary.outcome,
            FinishOutcome::AwaitingCommit | FinishOutcome::HeldForInspection
        ) {
            device
                .save_candidate(output)
                .map_err(|source| InfrastructureError::Persist {
                    path: output.clone(),
                    source,
                })?;
        }
    }

    if let Some(path) = &args.summary_json {
        let json = serde_json::to_string_pretty(&summary)?;
        fs::write(path, json)
            .with_context(|| format!("failed to write summary file {}", path.display()))?;
    }

    match args.format {
        OutputFormat::Text => println!("{}", render_run_summary(&summary)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&summary)?),
    }

    if summary.outcome == FinishOutcome::CommitFailed {
        bail!("commit failed; config and commit locks are still held");
    }
    if !summary.succeeded() {
        bail!(
            "{} object(s) failed to update: {}",
            summary.failures.len(),
            summary.failures.join(", ")
        );
    }
    Ok(())
}

fn run_banner(args: &ApplyArgs, device: &XmlDevice) -> String {
    let info = device.info();
    let mode = match (args.test, args.commit) {
        (true, _) => "test (no changes)",
        (false, true) => "commit",
        (false, false) => "candidate only",
    };
    let on_off = |enabled: bool| if enabled { "on" } else { "off" };
    [
        format!("host:     {} ({})", info.hostname, info.platform),
        format!("config:   {}", args.config.display()),
        format!("changes:  {}", args.changes.display()),
        format!("location: {}", args.location.as_deref().unwrap_or("default")),
        format!("mode:     {mode}"),
        format!("checks:   {}", on_off(!args.no_checks)),
        format!("locks:    {}", on_off(!args.no_locks)),
    ]
    .join("\n")
}
