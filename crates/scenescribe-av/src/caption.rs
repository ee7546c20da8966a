//! Closed-caption decoding with ccextractor.

use crate::tools::{run, Toolchain};
use crate::{Error, Result};
use std::ffi::OsString;
use std::path::Path;
use std::process::Command;

/// Build the ccextractor arguments that write captions of `input` to `output`.
pub fn ccextractor_args(input: &Path, output: &Path) -> Vec<OsString> {
    vec![
        input.as_os_str().to_owned(),
        "-o".into(),
        output.as_os_str().to_owned(),
    ]
}

/// Decode closed captions of `input` into the SRT file `output`.
///
/// Returns `Ok(false)` when ccextractor ran but produced no captions (missing
/// or empty output file).
pub fn extract_captions(tools: &Toolchain, input: &Path, output: &Path) -> Result<bool> {
    if !input.exists() {
        return Err(Error::file_not_found(input));
    }

    run(
        "ccextractor",
        Command::new(&tools.ccextractor).args(ccextractor_args(input, output)),
    )?;

    let produced = std::fs::metadata(output)
        .map(|m| m.len() > 0)
        .unwrap_or(false);

    if !produced && output.exists() {
        std::fs::remove_file(output)?;
    }

    Ok(produced)
}
