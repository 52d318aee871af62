//! Optional git versioning of appended partition files.

use crate::formatter::commit_summary;
use crate::{Error, Result, WorkoutRecord};
use std::path::Path;
use std::process::Command;

/// Records a just-appended file in version control
pub trait Versioner {
    fn commit(&self, path: &Path, record: &WorkoutRecord) -> Result<()>;
}

/// Leaves the store untouched
#[derive(Clone, Copy, Debug, Default)]
pub struct NoVersioning;

impl Versioner for NoVersioning {
    fn commit(&self, _path: &Path, _record: &WorkoutRecord) -> Result<()> {
        Ok(())
    }
}

/// Shells out to `git` in the directory containing the partition file
#[derive(Clone, Copy, Debug, Default)]
pub struct GitVersioner {
    push: bool,
}

impl GitVersioner {
    pub fn new(push: bool) -> Self {
        Self { push }
    }

    fn run(dir: &Path, args: &[&str]) -> Result<()> {
        let output = Command::new("git")
            .args(args)
            .current_dir(dir)
            .output()
            .map_err(|e| Error::Versioning(format!("run git {}: {e}", args[0])))?;

        if !output.status.success() {
            return Err(Error::Versioning(format!(
                "git {} failed: {}",
                args[0],
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(())
    }
}

impl Versioner for GitVersioner {
    fn commit(&self, path: &Path, record: &WorkoutRecord) -> Result<()> {
        let dir = path
            .parent()
            .ok_or_else(|| Error::Versioning(format!("{:?} has no parent directory", path)))?;
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| Error::Versioning(format!("{:?} has no file name", path)))?;

        let message = commit_summary(record);
        Self::run(dir, &["add", file_name])?;
        Self::run(dir, &["commit", "-m", &message])?;
        tracing::info!("Committed {:?}: {}", path, message);

        if self.push {
            Self::run(dir, &["push"])?;
            tracing::info!("Pushed commit for {:?}", path);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Entry, PartitionKey};
    use chrono::DateTime;

    fn note() -> WorkoutRecord {
        WorkoutRecord {
            timestamp: DateTime::parse_from_rfc3339("2026-02-16T10:30:00-08:00").unwrap(),
            entry: Entry::Note,
            rpe: None,
            notes: Some("rest day".into()),
            source: "cli".into(),
            raw: "/note rest day".into(),
        }
    }

    #[test]
    fn test_no_versioning_is_noop() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("16.jsonl");
        NoVersioning.commit(&path, &note()).unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn test_git_outside_repository_fails() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir
            .path()
            .join(PartitionKey::from_datetime(&note().timestamp).relative_path());
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "{}\n").unwrap();

        let err = GitVersioner::new(false).commit(&path, &note()).unwrap_err();
        assert!(matches!(err, Error::Versioning(_)));
    }
}
