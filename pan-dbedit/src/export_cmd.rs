use anyhow::{Context, Result};
use pan_dbedit::device::{DeviceClient, XmlDevice};
use pan_dbedit::export::export_to_path;
use pan_dbedit::logging::{self, LogOptions};
use pan_dbedit::run::select_scopes;
use pan_dbedit::settings::Settings;

use crate::cli::ExportArgs;
use crate::path_guard;

pub fn run_export(args: ExportArgs) -> Result<()> {
    let _guard = logging::init(&LogOptions {
        verbose: args.verbose,
        quiet: args.quiet,
        file: None,
    })
    .context("failed to initialize logging")?;
    path_guard::ensure_output_not_same(&args.output, &[&args.config])?;

    let settings = Settings::load(args.settings.as_deref())?;
    let device = XmlDevice::open(&args.config, settings.predefined()?)?;
    let scopes = select_scopes(&device, args.location.as_deref())?;
    let rows = export_to_path(&device, &scopes, &args.output)?;

    println!(
        "exported {rows} objects from {} to {}",
        device.info().hostname,
        args.output.display()
    );
    Ok(())
}
