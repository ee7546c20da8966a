//! External tool detection and invocation.

use crate::{Error, Result};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

/// Information about an external tool.
#[derive(Debug, Clone)]
pub struct ToolInfo {
    /// Name of the tool.
    pub name: String,
    /// Whether the tool is available.
    pub available: bool,
    /// Version string if available.
    pub version: Option<String>,
    /// Path to the tool executable.
    pub path: Option<PathBuf>,
}

/// Programs used by the subtitle cascade.
///
/// Each field is either a bare program name, resolved through `PATH` when the
/// command runs, or an explicit path from configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toolchain {
    pub ffmpeg: PathBuf,
    pub ffprobe: PathBuf,
    pub ccextractor: PathBuf,
    pub tesseract: PathBuf,
}

impl Default for Toolchain {
    fn default() -> Self {
        Self {
            ffmpeg: PathBuf::from("ffmpeg"),
            ffprobe: PathBuf::from("ffprobe"),
            ccextractor: PathBuf::from("ccextractor"),
            tesseract: PathBuf::from("tesseract"),
        }
    }
}

impl Toolchain {
    /// Report availability of every tool in the chain.
    pub fn check(&self) -> Vec<ToolInfo> {
        vec![
            check_tool_with_arg(&self.ffmpeg, "-version"),
            check_tool_with_arg(&self.ffprobe, "-version"),
            check_tool_with_arg(&self.ccextractor, "--version"),
            check_tool_with_arg(&self.tesseract, "--version"),
        ]
    }
}

/// Check if a tool is available and get its information.
///
/// # Example
///
/// ```no_run
/// use scenescribe_av::check_tool;
///
/// let info = check_tool("tesseract");
/// if info.available {
///     println!("tesseract version: {:?}", info.version);
/// }
/// ```
pub fn check_tool(name: &str) -> ToolInfo {
    check_tool_with_arg(Path::new(name), "--version")
}

/// Check if a tool is available using a custom version argument.
///
/// Some tools print their version on stderr, so both streams are consulted.
pub fn check_tool_with_arg(program: &Path, version_arg: &str) -> ToolInfo {
    let name = program
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| program.to_string_lossy().into_owned());

    match Command::new(program).arg(version_arg).output() {
        Ok(output) if output.status.success() => {
            let first_line = |bytes: &[u8]| {
                String::from_utf8_lossy(bytes)
                    .lines()
                    .find(|l| !l.trim().is_empty())
                    .map(|s| s.trim().to_string())
            };
            let version = first_line(&output.stdout).or_else(|| first_line(&output.stderr));

            let path = if program.components().count() > 1 {
                Some(program.to_path_buf())
            } else {
                which::which(program).ok()
            };

            ToolInfo {
                name,
                available: true,
                version,
                path,
            }
        }
        _ => ToolInfo {
            name,
            available: false,
            version: None,
            path: None,
        },
    }
}

/// Check the default toolchain.
///
/// Returns information about ffmpeg, ffprobe, ccextractor, and tesseract.
pub fn check_tools() -> Vec<ToolInfo> {
    Toolchain::default().check()
}

/// Require that a tool is available, returning its path.
///
/// # Errors
///
/// Returns an error if the tool is not found.
pub fn require_tool(name: &str) -> Result<PathBuf> {
    which::which(name).map_err(|_| Error::tool_not_found(name))
}

/// Get the path to a tool, preferring a configured path over PATH lookup.
pub fn get_tool_path(name: &str, config_path: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = config_path {
        if path.exists() {
            return Ok(path.to_path_buf());
        }
    }

    require_tool(name)
}

/// Run `command`, mapping spawn failures and non-zero exits to [`Error`].
pub(crate) fn run(tool: &str, command: &mut Command) -> Result<Output> {
    #[cfg(feature = "tracing")]
    tracing::debug!(tool, command = ?command, "Running external tool");

    let output = command.output().map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Error::tool_not_found(tool)
        } else {
            Error::Io(e)
        }
    })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let tail: Vec<&str> = stderr.lines().rev().take(3).collect();
        let message = if tail.is_empty() {
            output.status.to_string()
        } else {
            tail.into_iter().rev().collect::<Vec<_>>().join(" | ")
        };
        return Err(Error::tool_failed(tool, message));
    }

    Ok(output)
}
