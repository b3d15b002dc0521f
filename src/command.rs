//! # External Command Runner
//!
//! Questo modulo isola il confine di processo verso i tool esterni
//! (jpegoptim, optipng, pngquant, cwebp).
//!
//! ## Responsabilità:
//! - Definisce il trait `CommandRunner`, unico punto da cui il core lancia processi
//! - Cattura exit status, stdout e stderr di ogni invocazione
//! - Applica il timeout configurato e termina il processo figlio alla scadenza
//! - Non fallisce mai: tool mancanti, errori di spawn e timeout diventano un
//!   `CommandOutput` non riuscito che il chiamante deve ispezionare
//!
//! ## Esempio:
//! ```rust,ignore
//! let runner = SystemCommandRunner::new(ToolPathResolver::new(None), Some(Duration::from_secs(120)));
//! let output = runner.run("jpegoptim", &args!["-q", "photo.jpg"]).await;
//! if let Err(e) = output.check() {
//!     warn!("{}", e);
//! }
//! ```

use crate::error::{OptimizeError, Result};
use crate::tool_resolver::ToolPathResolver;
use async_trait::async_trait;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command;
use tracing::debug;

/// Why a command never produced an exit status
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LaunchFailure {
    /// The program could not be resolved
    NotFound,
    /// The OS refused to start the process
    Spawn(String),
    /// The process was killed after the timeout
    TimedOut(Duration),
}

/// Result of one external command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub program: String,
    /// Exit code, `None` when the process did not exit normally
    pub status: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    pub elapsed: Duration,
    pub failure: Option<LaunchFailure>,
}

impl CommandOutput {
    /// A process that ran to completion
    pub fn exited(program: &str, status: Option<i32>, stdout: String, stderr: String, elapsed: Duration) -> Self {
        Self {
            program: program.to_string(),
            status,
            stdout,
            stderr,
            elapsed,
            failure: None,
        }
    }

    /// A process that never produced an exit status
    pub fn launch_failed(program: &str, failure: LaunchFailure, elapsed: Duration) -> Self {
        let stderr = match &failure {
            LaunchFailure::NotFound => format!("{} not found", program),
            LaunchFailure::Spawn(reason) => format!("failed to start {}: {}", program, reason),
            LaunchFailure::TimedOut(limit) => format!("{} timed out after {:?}", program, limit),
        };
        Self {
            program: program.to_string(),
            status: None,
            stdout: String::new(),
            stderr,
            elapsed,
            failure: Some(failure),
        }
    }

    pub fn success(&self) -> bool {
        self.failure.is_none() && self.status == Some(0)
    }

    /// Combined stdout/stderr, trimmed, for diagnostics
    pub fn captured(&self) -> String {
        [self.stdout.trim(), self.stderr.trim()]
            .iter()
            .filter(|part| !part.is_empty())
            .cloned()
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Turns a non-successful run into the matching error
    pub fn check(&self) -> Result<()> {
        match &self.failure {
            Some(LaunchFailure::NotFound) => {
                return Err(OptimizeError::MissingDependency(self.program.clone()))
            }
            Some(LaunchFailure::TimedOut(limit)) => {
                return Err(OptimizeError::Timeout {
                    program: self.program.clone(),
                    seconds: limit.as_secs(),
                })
            }
            Some(LaunchFailure::Spawn(_)) | None => {}
        }

        if self.success() {
            return Ok(());
        }

        Err(OptimizeError::Tool {
            program: self.program.clone(),
            status: match self.status {
                Some(code) => format!("exit status {}", code),
                None if self.failure.is_some() => "no exit status".to_string(),
                None => "termination by signal".to_string(),
            },
            output: self.captured(),
        })
    }
}

/// Capability to run external programs.
///
/// Implementations never return errors; callers inspect the output.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, program: &str, args: &[String]) -> CommandOutput;

    fn is_available(&self, program: &str) -> bool;
}

/// Runs tools as child processes, resolved through `ToolPathResolver`
pub struct SystemCommandRunner {
    resolver: ToolPathResolver,
    timeout: Option<Duration>,
}

impl SystemCommandRunner {
    pub fn new(resolver: ToolPathResolver, timeout: Option<Duration>) -> Self {
        Self { resolver, timeout }
    }
}

#[async_trait]
impl CommandRunner for SystemCommandRunner {
    async fn run(&self, program: &str, args: &[String]) -> CommandOutput {
        let start_time = Instant::now();

        let Some(tool_path) = self.resolver.resolve_tool(program) else {
            return CommandOutput::launch_failed(program, LaunchFailure::NotFound, start_time.elapsed());
        };

        debug!("Running {:?} {:?}", tool_path, args);

        let child = Command::new(&tool_path)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn();

        let child = match child {
            Ok(child) => child,
            Err(e) => {
                return CommandOutput::launch_failed(
                    program,
                    LaunchFailure::Spawn(e.to_string()),
                    start_time.elapsed(),
                )
            }
        };

        // Dropping the future on timeout drops the child, which kills it
        let waited = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, child.wait_with_output()).await {
                Ok(waited) => waited,
                Err(_) => {
                    return CommandOutput::launch_failed(
                        program,
                        LaunchFailure::TimedOut(limit),
                        start_time.elapsed(),
                    )
                }
            },
            None => child.wait_with_output().await,
        };

        let elapsed = start_time.elapsed();
        match waited {
            Ok(output) => {
                debug!("{} finished with {:?} in {:?}", program, output.status.code(), elapsed);
                CommandOutput::exited(
                    program,
                    output.status.code(),
                    String::from_utf8_lossy(&output.stdout).into_owned(),
                    String::from_utf8_lossy(&output.stderr).into_owned(),
                    elapsed,
                )
            }
            Err(e) => CommandOutput::launch_failed(program, LaunchFailure::Spawn(e.to_string()), elapsed),
        }
    }

    fn is_available(&self, program: &str) -> bool {
        self.resolver.is_tool_available(program)
    }
}
