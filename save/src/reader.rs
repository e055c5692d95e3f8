//! Bridge to the external save reader executable.
//!
//! Decoding the raw save is delegated to a separate program that prints one
//! JSON snapshot on stdout. This module runs it and decodes the output.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use thiserror::Error;
use tokio::process::Command;

use crate::snapshot::Snapshot;

#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("failed to launch save reader: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("save reader exited with {status}: {stderr}")]
    Reader { status: String, stderr: String },

    #[error("save reader produced malformed output: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Runs the external reader against a save file and decodes its snapshot.
pub struct SnapshotReader {
    program: String,
    args: Vec<String>,
    save_path: PathBuf,
}

impl SnapshotReader {
    pub fn new(
        program: impl Into<String>,
        args: Vec<String>,
        save_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            program: program.into(),
            args,
            save_path: save_path.into(),
        }
    }

    /// Reader hosted as a .NET project, invoked through `dotnet run`.
    pub fn dotnet(project_dir: impl AsRef<Path>, save_path: impl Into<PathBuf>) -> Self {
        let project = project_dir.as_ref().display().to_string();
        Self::new(
            "dotnet",
            vec![
                "run".to_string(),
                "--project".to_string(),
                project,
                "--".to_string(),
            ],
            save_path,
        )
    }

    pub fn save_path(&self) -> &Path {
        &self.save_path
    }

    /// Run the reader once and decode the snapshot it prints.
    pub async fn snapshot(&self) -> Result<Snapshot, SnapshotError> {
        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(&self.save_path)
            .stdin(Stdio::null())
            .output()
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            tracing::warn!(
                status = %output.status,
                stderr = %stderr,
                "save reader failed"
            );
            return Err(SnapshotError::Reader {
                status: output.status.to_string(),
                stderr,
            });
        }

        let snapshot = serde_json::from_slice(&output.stdout)?;
        Ok(snapshot)
    }
}
