//! Text recognition with the tesseract CLI.

use crate::tools::{run, Toolchain};
use crate::{Error, Result};
use std::ffi::OsString;
use std::path::Path;
use std::process::Command;

/// Build the tesseract arguments that print the text of `image` on stdout.
pub fn tesseract_args(image: &Path, language: &str) -> Vec<OsString> {
    vec![
        image.as_os_str().to_owned(),
        "stdout".into(),
        "-l".into(),
        language.into(),
    ]
}

/// Recognize the text in `image`. The result is returned untrimmed.
pub fn recognize_text(tools: &Toolchain, image: &Path, language: &str) -> Result<String> {
    if !image.exists() {
        return Err(Error::file_not_found(image));
    }

    let output = run(
        "tesseract",
        Command::new(&tools.tesseract).args(tesseract_args(image, language)),
    )?;

    String::from_utf8(output.stdout)
        .map_err(|e| Error::parse_error("tesseract", format!("Invalid UTF-8: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args() {
        let args: Vec<String> = tesseract_args(Path::new("/tmp/r.png"), "eng")
            .into_iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        assert_eq!(args, vec!["/tmp/r.png", "stdout", "-l", "eng"]);
    }

    #[test]
    fn test_missing_image() {
        let err = recognize_text(&Toolchain::default(), Path::new("/nonexistent.png"), "eng")
            .unwrap_err();
        assert!(matches!(err, Error::FileNotFound { .. }));
    }
}
