//! Workspace helper for BDD integration tests.
//!
//! A `Workspace` is a temporary directory holding one or more ebook source
//! trees; `run_check*` invokes the real `booklint` binary against them.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use assert_cmd::cargo;
use booklint_testkit::EbookBuilder;
use booklint_types::RunReport;
use tempfile::TempDir;

pub fn booklint_cmd() -> Command {
    Command::new(cargo::cargo_bin!("booklint"))
}

pub struct Workspace {
    pub dir: TempDir,
}

impl Workspace {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("failed to create temp dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Writes `book` into `<workspace>/<name>` and returns the target path.
    pub fn add_book(&self, name: &str, book: &EbookBuilder) -> PathBuf {
        let target = self.path().join(name);
        book.write_to(&target).expect("write ebook");
        target
    }

    /// Overwrites one file of an existing target.
    pub fn write_file(&self, target: &str, relative_path: &str, content: &str) {
        let full = self.path().join(target).join(relative_path);
        if let Some(parent) = full.parent() {
            std::fs::create_dir_all(parent).expect("create parent dirs");
        }
        std::fs::write(full, content).expect("write file");
    }

    /// Runs `booklint check <extra_args> <targets>` from the workspace root.
    pub fn run_check(&self, targets: &[&str], extra_args: &[&str]) -> CheckResult {
        let output = booklint_cmd()
            .current_dir(self.path())
            .arg("check")
            .args(extra_args)
            .args(targets)
            .output()
            .expect("run booklint");

        CheckResult {
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        }
    }

    /// Runs with `--json` and parses the run report.
    pub fn run_check_json(
        &self,
        targets: &[&str],
        extra_args: &[&str],
    ) -> (CheckResult, RunReport) {
        let mut args = vec!["--json"];
        args.extend_from_slice(extra_args);
        let result = self.run_check(targets, &args);
        let report: RunReport = serde_json::from_str(&result.stdout).unwrap_or_else(|err| {
            panic!("stdout is not a run report: {err}\nstdout: {}", result.stdout)
        });
        (result, report)
    }
}

pub struct CheckResult {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CheckResult {
    pub fn assert_exit_code(&self, expected: i32) -> &Self {
        assert_eq!(
            self.exit_code, expected,
            "Expected exit code {} but got {}.\nstderr: {}\nstdout: {}",
            expected, self.exit_code, self.stderr, self.stdout
        );
        self
    }

    pub fn assert_stdout_contains(&self, needle: &str) -> &Self {
        assert!(
            self.stdout.contains(needle),
            "Expected stdout to contain '{needle}'.\nstdout: {}",
            self.stdout
        );
        self
    }

    pub fn assert_stdout_not_contains(&self, needle: &str) -> &Self {
        assert!(
            !self.stdout.contains(needle),
            "Expected stdout not to contain '{needle}'.\nstdout: {}",
            self.stdout
        );
        self
    }

    pub fn assert_stderr_contains(&self, needle: &str) -> &Self {
        assert!(
            self.stderr.contains(needle),
            "Expected stderr to contain '{needle}'.\nstderr: {}",
            self.stderr
        );
        self
    }
}

/// Codes of the findings reported for one target.
pub fn codes(report: &RunReport, index: usize) -> Vec<&str> {
    report.targets[index]
        .findings
        .iter()
        .map(|f| f.code.as_str())
        .collect()
}
