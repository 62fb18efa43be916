//! Status reporting for scans and exports.
//!
//! Every resolved action produces one status line. Human lines go to stdout
//! (warnings and failures to stderr); JSON mode emits one object per line on
//! stdout so the output stays parseable for scripts.

use std::io::Write;
use std::path::PathBuf;

use serde::Serialize;

/// A single resolved action or notice.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum StatusEvent {
    ScanStarted { root: PathBuf },
    /// File not managed; only shown in verbose mode.
    Skipped { path: PathBuf },
    Substituted { path: PathBuf, cached: PathBuf },
    Fetching { path: PathBuf, cached: PathBuf, url: String },
    DirectoryCreated { path: PathBuf },
    Downloaded { path: PathBuf, url: String, bytes: u64 },
    /// Export target already present; a notice, not an error.
    AlreadyExists { path: PathBuf },
    DescriptorWritten { path: PathBuf },
    /// Sidecar already present; only shown in verbose mode.
    DescriptorKept { path: PathBuf },
    /// The server answered with a non-success status and the body was kept anyway.
    HttpStatusIgnored { url: String, status: u16 },
    Failed { path: Option<PathBuf>, error: String },
}

/// Sink for [`StatusEvent`]s.
pub trait StatusReporter {
    fn report(&self, event: StatusEvent);
}

/// Human-readable lines.
pub struct HumanStatus {
    pub verbose: bool,
}

impl HumanStatus {
    fn line(&self, event: &StatusEvent) -> Option<(String, bool)> {
        let out = match event {
            StatusEvent::ScanStarted { root } => {
                (format!("Starting finder at: {}", root.display()), false)
            }
            StatusEvent::Skipped { path } => {
                if !self.verbose {
                    return None;
                }
                (format!("Not managed, skipping: {}", path.display()), false)
            }
            StatusEvent::Substituted { cached, .. } => (
                format!("Getting file from local repository: {}", cached.display()),
                false,
            ),
            StatusEvent::Fetching { cached, url, .. } => (
                format!("Getting file from web: {} ({})", cached.display(), url),
                false,
            ),
            StatusEvent::DirectoryCreated { path } => {
                (format!("{} not found, created", path.display()), false)
            }
            StatusEvent::Downloaded { path, bytes, .. } => (
                format!("Downloaded {} ({} bytes)", path.display(), bytes),
                false,
            ),
            StatusEvent::AlreadyExists { path } => (
                format!("{} already exists, not downloading", path.display()),
                false,
            ),
            StatusEvent::DescriptorWritten { path } => {
                (format!("Wrote descriptor {}", path.display()), false)
            }
            StatusEvent::DescriptorKept { path } => {
                if !self.verbose {
                    return None;
                }
                (format!("Descriptor {} already present", path.display()), false)
            }
            StatusEvent::HttpStatusIgnored { url, status } => (
                format!("Warning: {} answered HTTP {}, keeping body as-is", url, status),
                true,
            ),
            StatusEvent::Failed { path, error } => match path {
                Some(p) => (format!("Error: {}: {}", p.display(), error), true),
                None => (format!("Error: {}", error), true),
            },
        };
        Some(out)
    }
}

impl StatusReporter for HumanStatus {
    fn report(&self, event: StatusEvent) {
        if let Some((line, to_stderr)) = self.line(&event) {
            if to_stderr {
                let _ = writeln!(std::io::stderr().lock(), "{}", line);
            } else {
                let _ = writeln!(std::io::stdout().lock(), "{}", line);
            }
        }
    }
}

/// Machine-readable status: one JSON object per line on stdout.
pub struct JsonStatus;

impl StatusReporter for JsonStatus {
    fn report(&self, event: StatusEvent) {
        if let Ok(line) = serde_json::to_string(&event) {
            let mut out = std::io::stdout().lock();
            let _ = writeln!(out, "{}", line);
            let _ = out.flush();
        }
    }
}

/// Only failures, on stderr.
pub struct QuietStatus;

impl StatusReporter for QuietStatus {
    fn report(&self, event: StatusEvent) {
        if let StatusEvent::Failed { .. } = event {
            HumanStatus { verbose: false }.report(event);
        }
    }
}

/// Status mode selected on the command line.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum StatusMode {
    Quiet,
    Human { verbose: bool },
    Json,
}

impl StatusMode {
    /// `--quiet` overrides `--verbose`; `--json` overrides both.
    pub fn from_flags(quiet: bool, verbose: bool, json: bool) -> Self {
        if json {
            StatusMode::Json
        } else if quiet {
            StatusMode::Quiet
        } else {
            StatusMode::Human { verbose }
        }
    }

    pub fn is_verbose(&self) -> bool {
        matches!(self, StatusMode::Human { verbose: true })
    }

    pub fn reporter(&self) -> Box<dyn StatusReporter> {
        match *self {
            StatusMode::Quiet => Box::new(QuietStatus),
            StatusMode::Human { verbose } => Box::new(HumanStatus { verbose }),
            StatusMode::Json => Box::new(JsonStatus),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quiet_overrides_verbose() {
        assert_eq!(StatusMode::from_flags(true, true, false), StatusMode::Quiet);
        assert_eq!(StatusMode::from_flags(true, true, true), StatusMode::Json);
        assert!(StatusMode::from_flags(false, true, false).is_verbose());
    }

    #[test]
    fn skipped_hidden_unless_verbose() {
        let event = StatusEvent::Skipped {
            path: PathBuf::from("a.js"),
        };
        assert!(HumanStatus { verbose: false }.line(&event).is_none());
        assert!(HumanStatus { verbose: true }.line(&event).is_some());
    }

    #[test]
    fn failures_go_to_stderr() {
        let event = StatusEvent::Failed {
            path: Some(PathBuf::from("a.js")),
            error: "boom".into(),
        };
        let (line, to_stderr) = HumanStatus { verbose: false }.line(&event).unwrap();
        assert!(to_stderr);
        assert_eq!(line, "Error: a.js: boom");
    }

    #[test]
    fn json_shape_is_tagged() {
        let event = StatusEvent::Downloaded {
            path: PathBuf::from("w.js"),
            url: "http://x/w.js".into(),
            bytes: 3,
        };
        let v = serde_json::to_value(&event).unwrap();
        assert_eq!(v["event"], "downloaded");
        assert_eq!(v["bytes"], 3);
    }
}
