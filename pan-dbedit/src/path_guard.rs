use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

/// Refuse an output path that names one of the input files.
pub fn ensure_output_not_same(output: &Path, inputs: &[&Path]) -> Result<()> {
    let target = comparable(output)
        .with_context(|| format!("failed to resolve output path {}", output.display()))?;
    for input in inputs {
        let source = comparable(input)
            .with_context(|| format!("failed to resolve input path {}", input.display()))?;
        if source == target {
            bail!(
                "refusing to overwrite input {} with output {}",
                input.display(),
                output.display()
            );
        }
    }
    Ok(())
}

/// Canonical path for comparison. A file that does not exist yet is resolved
/// through its parent directory.
fn comparable(path: &Path) -> Result<PathBuf> {
    if path.exists() {
        return Ok(path.canonicalize()?);
    }
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let parent = if parent.exists() {
        parent.canonicalize()?
    } else {
        std::env::current_dir()?.join(parent)
    };
    Ok(match path.file_name() {
        Some(name) => parent.join(name),
        None => parent,
    })
}
