//! Compiler subprocess execution
//!
//! Runs the external EJScript compiler over a list of source files and
//! turns its output into [`Diagnostic`] records. Both standard streams
//! are read on dedicated threads while the parent polls the child, so a
//! chatty compiler can never deadlock on a full pipe. The poll loop
//! honors an optional timeout and a cancellation token; on either the
//! child is killed and whatever output was captured is still echoed.
//!
//! Every captured line is echoed to the console verbatim, stdout first,
//! then stderr. Lines that match the diagnostic grammar are additionally
//! returned as structured records; a non-zero exit is annotated on the
//! console but does not discard diagnostics.

use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::config::defaults::PROCESS_POLL_INTERVAL_MS;
use crate::core::cancel::CancelToken;
use crate::core::diagnostic::{Diagnostic, Severity};
use crate::core::options::CompilerOptions;
use crate::error::CompilerError;
use crate::infra::console::Console;

/// Result of one compiler invocation
#[derive(Debug, Clone)]
pub struct CompileOutcome {
    /// Structured diagnostics in output order, stdout before stderr
    pub diagnostics: Vec<Diagnostic>,
    /// Process exit code; `None` when killed by a signal
    pub exit_code: Option<i32>,
}

impl CompileOutcome {
    /// Whether the compiler exited with status zero
    #[must_use]
    pub fn succeeded(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// Whether any diagnostic carries error severity
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity() == Severity::Error)
    }
}

/// Runs the external compiler
#[derive(Debug, Clone)]
pub struct CompilerRunner {
    executable: PathBuf,
    timeout: Option<Duration>,
    cancel: CancelToken,
}

/// How the poll loop ended
enum WaitOutcome {
    Exited(ExitStatus),
    TimedOut(u64),
    Cancelled,
    Failed(String),
}

impl CompilerRunner {
    /// Create a runner for the given executable
    #[must_use]
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
            timeout: None,
            cancel: CancelToken::new(),
        }
    }

    /// Set or clear the subprocess timeout
    #[must_use]
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Attach a cancellation token polled while waiting
    #[must_use]
    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// The configured executable path
    #[must_use]
    pub fn executable(&self) -> &Path {
        &self.executable
    }

    /// Compile a list of source files
    ///
    /// The invocation is `executable [options…] [files…]` with the
    /// working directory set to the first file's parent. Files are
    /// expected as absolute paths.
    ///
    /// # Errors
    ///
    /// Returns an error if the executable is missing, the process cannot
    /// be spawned or reaped, a stream reader fails, the timeout expires,
    /// or the invocation is cancelled.
    pub fn compile(
        &self,
        files: &[PathBuf],
        options: &CompilerOptions,
        console: &mut dyn Console,
    ) -> Result<CompileOutcome, CompilerError> {
        // Bare executable names go through PATH at spawn time; only a
        // path with directory components can be pre-checked.
        let is_pathy = self
            .executable
            .parent()
            .is_some_and(|p| !p.as_os_str().is_empty());
        if is_pathy && !self.executable.exists() {
            console.println(&format!(
                "Compiler not found: {}",
                self.executable.display()
            ));
            return Err(CompilerError::MissingExecutable {
                path: self.executable.clone(),
            });
        }

        let mut command = Command::new(&self.executable);
        command
            .args(options.to_args())
            .args(files)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        if let Some(dir) = files
            .first()
            .and_then(|f| f.parent())
            .filter(|d| !d.as_os_str().is_empty())
        {
            command.current_dir(dir);
        }

        tracing::debug!(
            "Invoking {} with {} file(s), options '{}'",
            self.executable.display(),
            files.len(),
            options.to_command_string()
        );

        let mut child = command.spawn().map_err(|e| CompilerError::Launch {
            program: self.executable.display().to_string(),
            error: e.to_string(),
        })?;

        let stdout = child.stdout.take().ok_or(CompilerError::StreamCapture {
            stream: "stdout",
        })?;
        let stderr = child.stderr.take().ok_or(CompilerError::StreamCapture {
            stream: "stderr",
        })?;

        let stdout_reader = spawn_line_reader(stdout);
        let stderr_reader = spawn_line_reader(stderr);

        let wait = self.wait_for_exit(&mut child);

        // Readers see EOF once the child is gone, killed or not; echo
        // whatever was captured even when the wait ended badly.
        let stdout_lines = collect_lines(stdout_reader, "stdout")?;
        let stderr_lines = collect_lines(stderr_reader, "stderr")?;
        for line in stdout_lines.iter().chain(stderr_lines.iter()) {
            console.println(line);
        }

        let status = match wait {
            WaitOutcome::Exited(status) => status,
            WaitOutcome::TimedOut(seconds) => {
                return Err(CompilerError::Timeout { seconds });
            }
            WaitOutcome::Cancelled => return Err(CompilerError::Cancelled),
            WaitOutcome::Failed(error) => return Err(CompilerError::Io { error }),
        };

        match status.code() {
            Some(0) => {}
            Some(code) => {
                console.println(&format!(
                    "{}: exited with value: {} (0x{:X})",
                    self.executable.display(),
                    code,
                    code
                ));
            }
            None => {
                console.println(&format!(
                    "{}: terminated by signal",
                    self.executable.display()
                ));
            }
        }

        let diagnostics: Vec<Diagnostic> = stdout_lines
            .iter()
            .chain(stderr_lines.iter())
            .filter_map(|line| Diagnostic::parse(line))
            .collect();

        tracing::debug!(
            "Compiler exited with {:?}, {} diagnostic(s)",
            status.code(),
            diagnostics.len()
        );

        Ok(CompileOutcome {
            diagnostics,
            exit_code: status.code(),
        })
    }

    /// Poll the child until exit, timeout, or cancellation
    ///
    /// The child is killed and reaped on the timeout and cancellation
    /// paths, so the stream readers always reach EOF.
    fn wait_for_exit(&self, child: &mut Child) -> WaitOutcome {
        let deadline = self.timeout.map(|t| Instant::now() + t);
        let poll_interval = Duration::from_millis(PROCESS_POLL_INTERVAL_MS);

        loop {
            if self.cancel.is_cancelled() {
                kill_and_reap(child);
                return WaitOutcome::Cancelled;
            }
            if let Some(deadline) = deadline {
                if Instant::now() >= deadline {
                    kill_and_reap(child);
                    let seconds = self.timeout.map_or(0, |t| t.as_secs().max(1));
                    return WaitOutcome::TimedOut(seconds);
                }
            }

            match child.try_wait() {
                Ok(Some(status)) => return WaitOutcome::Exited(status),
                Ok(None) => thread::sleep(poll_interval),
                Err(e) => {
                    kill_and_reap(child);
                    return WaitOutcome::Failed(e.to_string());
                }
            }
        }
    }
}

fn spawn_line_reader<R: Read + Send + 'static>(stream: R) -> JoinHandle<Vec<String>> {
    thread::spawn(move || {
        BufReader::new(stream)
            .lines()
            .map_while(Result::ok)
            .collect()
    })
}

fn collect_lines(
    reader: JoinHandle<Vec<String>>,
    stream: &'static str,
) -> Result<Vec<String>, CompilerError> {
    reader
        .join()
        .map_err(|_| CompilerError::StreamCapture { stream })
}

fn kill_and_reap(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}
