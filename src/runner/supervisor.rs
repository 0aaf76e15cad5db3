use crate::archive::command::CommandLine;
use crate::error::{Result, SevenRunError};
use crate::runner::classifier::{LineClassifier, LineKind};
use crate::runner::report::RunOutcome;
use std::io::{self, BufRead, BufReader};
use std::process::{Child, Command, Stdio};
use tracing::debug;

/// Platform specific spawn behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LaunchOptions {
    /// Do not open a console window for the tool (Windows only).
    pub hide_console: bool,
}

impl Default for LaunchOptions {
    fn default() -> Self {
        Self { hide_console: true }
    }
}

impl LaunchOptions {
    fn configure(&self, command: &mut Command) {
        #[cfg(windows)]
        {
            use std::os::windows::process::CommandExt;
            const CREATE_NO_WINDOW: u32 = 0x0800_0000;
            if self.hide_console {
                command.creation_flags(CREATE_NO_WINDOW);
            }
        }
        #[cfg(not(windows))]
        let _ = (self, command);
    }
}

/// What was read from the tool's standard output.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamOutcome {
    pub error_text: String,
    pub last_line: String,
    pub lines_read: usize,
}

/// Reads `reader` line by line, handing every recognised line to `on_line`.
///
/// Stops at the first error line: that line plus everything still left in
/// the stream becomes `error_text`. Errors returned by `on_line` abort the
/// read and are passed through.
pub fn consume_output<R, F>(
    mut reader: R,
    classifier: &LineClassifier,
    mut on_line: F,
) -> Result<StreamOutcome>
where
    R: BufRead,
    F: FnMut(LineKind) -> Result<()>,
{
    let mut outcome = StreamOutcome::default();
    let mut buffer = Vec::new();

    loop {
        buffer.clear();
        if reader.read_until(b'\n', &mut buffer)? == 0 {
            break;
        }
        outcome.lines_read += 1;

        let line = String::from_utf8_lossy(&buffer);
        if !line.trim().is_empty() {
            outcome.last_line = line.trim_end_matches(['\r', '\n']).to_string();
        }

        match classifier.classify(&line) {
            LineKind::Error => {
                let mut rest = Vec::new();
                reader.read_to_end(&mut rest)?;
                outcome.error_text = format!("{}{}", line, String::from_utf8_lossy(&rest));
                break;
            }
            LineKind::Ignored => {}
            kind => on_line(kind)?,
        }
    }

    Ok(outcome)
}

/// Exit code and complete standard output of a run that was not classified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedOutput {
    pub return_code: Option<i32>,
    pub output: String,
}

/// Owns the archive tool process for the length of one run.
#[derive(Debug, Clone, Default)]
pub struct ProcessSupervisor {
    launch: LaunchOptions,
}

impl ProcessSupervisor {
    pub fn new(launch: LaunchOptions) -> Self {
        Self { launch }
    }

    /// Spawns `command`, classifies its output as it arrives and waits for it
    /// to exit. Blocks until the process is gone; there is no timeout.
    ///
    /// The returned outcome may describe a failed run; see
    /// [`RunOutcome::into_result`].
    pub fn run<F>(
        &self,
        command: &CommandLine,
        classifier: &LineClassifier,
        on_line: F,
    ) -> Result<RunOutcome>
    where
        F: FnMut(LineKind) -> Result<()>,
    {
        debug!(operation = %classifier.operation(), "running {}", command);

        let mut child = self.spawn(command)?;
        let stdin = child.stdin.take();
        let stdout = child.stdout.take().ok_or_else(|| {
            SevenRunError::Io(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "archive tool stdout was not captured",
            ))
        })?;

        let streamed = match consume_output(BufReader::new(stdout), classifier, on_line) {
            Ok(streamed) => streamed,
            Err(e) => {
                child.kill().ok();
                child.wait().ok();
                return Err(e);
            }
        };

        let status = child.wait()?;
        drop(stdin);
        debug!(
            return_code = ?status.code(),
            lines = streamed.lines_read,
            "{} exited",
            command.program()
        );

        Ok(RunOutcome {
            return_code: status.code(),
            error_text: streamed.error_text,
            last_line: streamed.last_line,
        })
    }

    /// Spawns `command` and waits for it, collecting everything it writes to
    /// standard output. Nothing is classified and the exit code is not judged.
    pub fn run_to_end(&self, command: &CommandLine) -> Result<CapturedOutput> {
        debug!("running {}", command);

        let output = self.spawn(command)?.wait_with_output()?;
        debug!(
            return_code = ?output.status.code(),
            bytes = output.stdout.len(),
            "{} exited",
            command.program()
        );

        Ok(CapturedOutput {
            return_code: output.status.code(),
            output: String::from_utf8_lossy(&output.stdout).into_owned(),
        })
    }

    fn spawn(&self, command: &CommandLine) -> Result<Child> {
        let mut process = Command::new(command.program());
        process
            .args(command.arguments())
            // Some 7z subcommands read stdin even though nothing is ever written.
            .stdin(Stdio::piped())
            .stdout(Stdio::piped());
        self.launch.configure(&mut process);

        process.spawn().map_err(|source| SevenRunError::ToolLaunch {
            tool: command.program().to_string(),
            source,
        })
    }
}
