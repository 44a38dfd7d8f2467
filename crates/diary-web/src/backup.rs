use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use diary_core::backup::{todays_backup_file_name, DATABASE_PATH_ENV};

/// Result of one backup run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackupOutcome {
    /// The process exited 0; the file it wrote
    Succeeded { file_name: String },
    /// Nonzero exit, killed by a signal, or the process never started
    Failed,
}

/// The external backup process: an explicit argv, never a shell line
#[derive(Debug, Clone)]
pub struct BackupRunner {
    program: String,
    args: Vec<String>,
    database_path: Option<PathBuf>,
}

impl BackupRunner {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            database_path: None,
        }
    }

    /// Point the process at the database the server has open
    #[must_use]
    pub fn with_database_path(mut self, path: Option<&Path>) -> Self {
        self.database_path = path.map(Path::to_path_buf);
        self
    }

    /// Build from a `[program, args...]` vector; `None` when it is empty
    pub fn from_argv(argv: &[String]) -> Option<Self> {
        let (program, args) = argv.split_first()?;
        Some(Self::new(program.clone(), args.to_vec()))
    }

    /// Spawn the process and wait for it on a blocking thread
    pub async fn run(&self) -> BackupOutcome {
        let runner = self.clone();
        match tokio::task::spawn_blocking(move || runner.run_blocking()).await {
            Ok(outcome) => outcome,
            Err(error) => {
                tracing::error!("Backup task panicked: {error}");
                BackupOutcome::Failed
            }
        }
    }

    fn run_blocking(&self) -> BackupOutcome {
        // The name is fixed before the run so it matches the day the backup started
        let file_name = todays_backup_file_name();

        let mut command = Command::new(&self.program);
        command.args(&self.args).stdin(Stdio::null());
        if let Some(path) = &self.database_path {
            command.env(DATABASE_PATH_ENV, path);
        }
        let status = command.status();

        match status {
            Ok(status) if status.success() => {
                tracing::info!(program = %self.program, file = %file_name, "Backup finished");
                BackupOutcome::Succeeded { file_name }
            }
            Ok(status) => {
                tracing::warn!(
                    program = %self.program,
                    code = ?status.code(),
                    "Backup process exited unsuccessfully"
                );
                BackupOutcome::Failed
            }
            Err(error) => {
                tracing::error!(
                    program = %self.program,
                    "Backup process could not be started: {error}"
                );
                BackupOutcome::Failed
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_argv_splits_program_and_args() {
        let argv = vec!["diary".to_string(), "backup".to_string()];
        let runner = BackupRunner::from_argv(&argv).unwrap();
        assert_eq!(runner.program, "diary");
        assert_eq!(runner.args, vec!["backup"]);
        assert!(BackupRunner::from_argv(&[]).is_none());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn zero_exit_reports_todays_file() {
        let outcome = BackupRunner::new("true", Vec::new()).run().await;
        assert_eq!(
            outcome,
            BackupOutcome::Succeeded {
                file_name: todays_backup_file_name()
            }
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn nonzero_exit_is_failure() {
        let outcome = BackupRunner::new("false", Vec::new()).run().await;
        assert_eq!(outcome, BackupOutcome::Failed);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn process_sees_the_server_database_path() {
        let check = format!("test \"${DATABASE_PATH_ENV}\" = /srv/diary/live.db");
        let runner = BackupRunner::new("sh", vec!["-c".to_string(), check])
            .with_database_path(Some(Path::new("/srv/diary/live.db")));
        assert!(matches!(runner.run().await, BackupOutcome::Succeeded { .. }));

        let elsewhere = runner.with_database_path(Some(Path::new("/tmp/other.db")));
        assert_eq!(elsewhere.run().await, BackupOutcome::Failed);
    }

    #[tokio::test]
    async fn missing_program_is_failure() {
        let outcome = BackupRunner::new("diary-backup-program-that-does-not-exist", Vec::new())
            .run()
            .await;
        assert_eq!(outcome, BackupOutcome::Failed);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn arguments_are_not_shell_interpreted() {
        // With a shell, `; false` would run a second command
        let outcome = BackupRunner::new("echo", vec!["ok; false".to_string()])
            .run()
            .await;
        assert!(matches!(outcome, BackupOutcome::Succeeded { .. }));
    }
}
