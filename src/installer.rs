//! One-shot installer: copies the bundled widget, form partial and locale into
//! an application and wires the filter trait into its account controller.
//!
//! Every step runs on its own; a declined overwrite or a missing controller is
//! recorded in the [`InstallReport`] and the remaining steps still run.

use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::errors::{FilterError, Result};

/// A file bundled into the binary and its destination relative to the app root.
#[derive(Debug, Clone, Copy)]
pub struct Asset {
    pub name: &'static str,
    pub destination: &'static str,
    pub contents: &'static str,
}

pub const ASSETS: &[Asset] = &[
    Asset {
        name: "table_filters_controller.js",
        destination: "assets/js/controllers/table_filters_controller.js",
        contents: include_str!("../assets/table_filters_controller.js"),
    },
    Asset {
        name: "_search_form.html",
        destination: "templates/account/table_filters/_search_form.html",
        contents: include_str!("../assets/_search_form.html"),
    },
    Asset {
        name: "table_filters.en.yml",
        destination: "locales/en/table_filters.en.yml",
        contents: include_str!("../assets/table_filters.en.yml"),
    },
];

/// Asks before an existing file is overwritten.
pub trait Confirm {
    fn confirm(&mut self, question: &str) -> bool;
}

/// Interactive `(y/n)` prompt on a reader/writer pair, normally stdin/stdout.
pub struct PromptConfirm<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> PromptConfirm<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

impl<R: BufRead, W: Write> Confirm for PromptConfirm<R, W> {
    fn confirm(&mut self, question: &str) -> bool {
        let prompted = write!(self.output, "{question} (y/n): ")
            .and_then(|()| self.output.flush());
        if let Err(e) = prompted {
            warn!(error = %e, "could not show confirmation prompt, treating as no");
            return false;
        }
        let mut answer = String::new();
        match self.input.read_line(&mut answer) {
            Ok(_) => answer.trim().eq_ignore_ascii_case("y"),
            Err(_) => false,
        }
    }
}

/// Fixed answer, for `--yes` and non-interactive runs.
pub struct AutoConfirm(pub bool);

impl Confirm for AutoConfirm {
    fn confirm(&mut self, _question: &str) -> bool {
        self.0
    }
}

/// Where and how the account controller gets patched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InstallConfig {
    pub controller_path: PathBuf,
    /// First line containing this text locates the insertion point.
    pub anchor: String,
    pub include_line: String,
    /// Lines after the anchor line at which `include_line` is inserted.
    pub insert_offset: usize,
}

impl Default for InstallConfig {
    fn default() -> Self {
        Self {
            controller_path: PathBuf::from("src/controllers/account/mod.rs"),
            anchor: "pub struct AccountController".to_string(),
            include_line: "pub use table_filters::FilterableResource;".to_string(),
            insert_offset: 2,
        }
    }
}

impl InstallConfig {
    pub fn from_path(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| FilterError::io(path, e))?;
        Ok(serde_json::from_str(&raw)?)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    Copied(PathBuf),
    Declined(PathBuf),
    Patched(PathBuf),
    AlreadyPatched(PathBuf),
    /// Reported and skipped; the other steps still ran.
    Failed(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallReport {
    pub steps: Vec<(String, StepOutcome)>,
}

impl InstallReport {
    pub fn failures(&self) -> impl Iterator<Item = (&str, &str)> {
        self.steps.iter().filter_map(|(step, outcome)| match outcome {
            StepOutcome::Failed(msg) => Some((step.as_str(), msg.as_str())),
            _ => None,
        })
    }
}

pub struct Installer<C> {
    app_root: PathBuf,
    config: InstallConfig,
    confirm: C,
}

impl<C: Confirm> Installer<C> {
    pub fn new(app_root: impl Into<PathBuf>, confirm: C) -> Self {
        Self {
            app_root: app_root.into(),
            config: InstallConfig::default(),
            confirm,
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: InstallConfig) -> Self {
        self.config = config;
        self
    }

    pub fn install(&mut self) -> InstallReport {
        info!(app_root = %self.app_root.display(), "installing table filters");
        let mut report = InstallReport::default();
        for asset in ASSETS {
            let outcome = self
                .copy_asset(asset)
                .unwrap_or_else(|e| StepOutcome::Failed(e.to_string()));
            report.steps.push((asset.name.to_string(), outcome));
        }
        let outcome = self
            .patch_controller()
            .unwrap_or_else(|e| StepOutcome::Failed(e.to_string()));
        report.steps.push(("account controller".to_string(), outcome));
        report
    }

    fn copy_asset(&mut self, asset: &Asset) -> Result<StepOutcome> {
        let destination = self.app_root.join(asset.destination);
        if destination.exists() {
            warn!(path = %destination.display(), "destination already exists");
            let question = format!("{} already exists. Overwrite it?", destination.display());
            if !self.confirm.confirm(&question) {
                info!(path = %destination.display(), "skipping copy to avoid overwriting");
                return Ok(StepOutcome::Declined(destination));
            }
        }
        if let Some(parent) = destination.parent() {
            std::fs::create_dir_all(parent).map_err(|e| FilterError::io(parent, e))?;
        }
        std::fs::write(&destination, asset.contents).map_err(|e| FilterError::io(&destination, e))?;
        info!(asset = asset.name, path = %destination.display(), "copied");
        Ok(StepOutcome::Copied(destination))
    }

    fn patch_controller(&self) -> Result<StepOutcome> {
        let path = self.app_root.join(&self.config.controller_path);
        let include = self.config.include_line.trim();
        if !path.exists() {
            let msg = format!(
                "could not find the account controller at {}; add `{include}` manually",
                path.display()
            );
            warn!("{msg}");
            return Ok(StepOutcome::Failed(msg));
        }

        let code = std::fs::read_to_string(&path).map_err(|e| FilterError::io(&path, e))?;
        if code.lines().any(|line| line.trim() == include) {
            info!(path = %path.display(), "account controller already patched");
            return Ok(StepOutcome::AlreadyPatched(path));
        }

        let mut lines: Vec<&str> = code.lines().collect();
        let Some(anchor) = lines.iter().position(|l| l.contains(&self.config.anchor)) else {
            let msg = format!(
                "could not find `{}` in {}; add `{include}` manually",
                self.config.anchor,
                path.display()
            );
            warn!("{msg}");
            return Ok(StepOutcome::Failed(msg));
        };
        let at = (anchor + self.config.insert_offset).min(lines.len());
        lines.insert(at, &self.config.include_line);

        let newline = if code.contains("\r\n") { "\r\n" } else { "\n" };
        let mut patched = lines.join(newline);
        if code.ends_with('\n') {
            patched.push_str(newline);
        }
        std::fs::write(&path, patched).map_err(|e| FilterError::io(&path, e))?;
        info!(path = %path.display(), "patched account controller");
        Ok(StepOutcome::Patched(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const CONTROLLER: &str = "use crate::prelude::*;\n\npub struct AccountController;\n\nimpl AccountController {}\n";

    fn app_with_controller() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("src/controllers/account");
        std::fs::create_dir_all(&path).unwrap();
        std::fs::write(path.join("mod.rs"), CONTROLLER).unwrap();
        dir
    }

    #[test]
    fn fresh_install_copies_and_patches() {
        let app = app_with_controller();
        let report = Installer::new(app.path(), AutoConfirm(false)).install();

        assert_eq!(report.steps.len(), 4);
        assert!(report.failures().next().is_none());
        assert!(app.path().join("locales/en/table_filters.en.yml").exists());

        let patched =
            std::fs::read_to_string(app.path().join("src/controllers/account/mod.rs")).unwrap();
        assert_eq!(
            patched,
            "use crate::prelude::*;\n\npub struct AccountController;\n\npub use table_filters::FilterableResource;\nimpl AccountController {}\n"
        );

        let again = Installer::new(app.path(), AutoConfirm(false)).install();
        assert!(matches!(again.steps[3].1, StepOutcome::AlreadyPatched(_)));
    }

    #[test]
    fn declined_overwrite_skips_only_that_file() {
        let app = app_with_controller();
        let existing = app.path().join(ASSETS[0].destination);
        std::fs::create_dir_all(existing.parent().unwrap()).unwrap();
        std::fs::write(&existing, "custom").unwrap();

        let prompt = PromptConfirm::new(&b"n\n"[..], Vec::new());
        let report = Installer::new(app.path(), prompt).install();

        assert_eq!(report.steps[0].1, StepOutcome::Declined(existing.clone()));
        assert_eq!(std::fs::read_to_string(&existing).unwrap(), "custom");
        assert!(matches!(report.steps[1].1, StepOutcome::Copied(_)));
        assert!(matches!(report.steps[3].1, StepOutcome::Patched(_)));
    }

    #[test]
    fn confirmed_overwrite_replaces_file() {
        let app = app_with_controller();
        let existing = app.path().join(ASSETS[2].destination);
        std::fs::create_dir_all(existing.parent().unwrap()).unwrap();
        std::fs::write(&existing, "old").unwrap();

        let mut out = Vec::new();
        let report = Installer::new(app.path(), PromptConfirm::new(&b"Y\n"[..], &mut out)).install();
        assert_eq!(report.steps[2].1, StepOutcome::Copied(existing.clone()));
        assert_eq!(std::fs::read_to_string(&existing).unwrap(), ASSETS[2].contents);
        assert!(String::from_utf8(out).unwrap().ends_with("Overwrite it? (y/n): "));
    }

    #[test]
    fn unwritable_prompt_declines() {
        struct ClosedPipe;

        impl Write for ClosedPipe {
            fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
                Err(std::io::ErrorKind::BrokenPipe.into())
            }

            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }

        let mut prompt = PromptConfirm::new(&b"y\n"[..], ClosedPipe);
        assert!(!prompt.confirm("Overwrite it?"));
    }

    #[test]
    fn patching_keeps_crlf_line_endings() {
        let app = tempfile::tempdir().unwrap();
        let dir = app.path().join("src/controllers/account");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("mod.rs"), CONTROLLER.replace('\n', "\r\n")).unwrap();

        let report = Installer::new(app.path(), AutoConfirm(true)).install();
        assert!(matches!(report.steps[3].1, StepOutcome::Patched(_)));
        let patched = std::fs::read_to_string(dir.join("mod.rs")).unwrap();
        assert_eq!(
            patched,
            "use crate::prelude::*;\r\n\r\npub struct AccountController;\r\n\r\npub use table_filters::FilterableResource;\r\nimpl AccountController {}\r\n"
        );
    }

    #[test]
    fn missing_controller_does_not_abort_copies() {
        let app = tempfile::tempdir().unwrap();
        let report = Installer::new(app.path(), AutoConfirm(true)).install();
        let failures: Vec<_> = report.failures().map(|(step, _)| step).collect();
        assert_eq!(failures, vec!["account controller"]);
        assert!(app.path().join(ASSETS[1].destination).exists());
    }

    #[test]
    fn missing_anchor_is_reported() {
        let app = app_with_controller();
        let config = InstallConfig {
            anchor: "struct Nope".into(),
            ..InstallConfig::default()
        };
        let report = Installer::new(app.path(), AutoConfirm(true))
            .with_config(config)
            .install();
        assert!(report.failures().any(|(_, msg)| msg.contains("struct Nope")));
    }
}
