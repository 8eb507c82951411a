//! Launching the external decode tool.

use crate::error::InvokeError;
use std::ffi::OsString;
use std::io::{self, Read};
use std::path::Path;
use std::process::{Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

/// How long to keep draining the pipe once the tool has exited
const DRAIN_GRACE: Duration = Duration::from_millis(250);

/// Captured outcome of one decode tool run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeResult {
    /// Combined stdout and stderr, in the order the tool wrote them
    pub output: String,
    /// Exit code, or `None` when the tool was terminated by a signal
    pub exit_code: Option<i32>,
    /// Wall-clock time from spawn to exit
    pub elapsed: Duration,
}

impl DecodeResult {
    pub fn from_status(output: String, status: ExitStatus, elapsed: Duration) -> Self {
        Self {
            output,
            exit_code: status.code(),
            elapsed,
        }
    }

    /// Whether the tool exited with status zero
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Runs the decode tool for one capture.
///
/// The batch loop only talks to this trait, so tests can substitute a
/// scripted invoker for the real process.
pub trait DecodeInvoker {
    /// Run `program` with `args` from `working_dir` and block until it exits.
    ///
    /// A non-zero exit status is not an error here; it is reported through
    /// [`DecodeResult::exit_code`].
    fn invoke(
        &self,
        program: &str,
        working_dir: &Path,
        args: &[OsString],
    ) -> Result<DecodeResult, InvokeError>;
}

/// Invoker backed by a real child process.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessInvoker;

impl ProcessInvoker {
    pub fn new() -> Self {
        Self
    }
}

impl DecodeInvoker for ProcessInvoker {
    fn invoke(
        &self,
        program: &str,
        working_dir: &Path,
        args: &[OsString],
    ) -> Result<DecodeResult, InvokeError> {
        let capture_error = |source| InvokeError::CaptureFailed {
            program: program.to_string(),
            source,
        };

        // stdout and stderr share one pipe so their output keeps its interleaving
        let (reader, writer) = io::pipe().map_err(capture_error)?;
        let stderr_writer = writer.try_clone().map_err(capture_error)?;
        let chunks = spawn_reader(reader).map_err(capture_error)?;

        let mut command = Command::new(program);
        command
            .args(args)
            .current_dir(working_dir)
            .stdin(Stdio::null())
            .stdout(writer)
            .stderr(stderr_writer);
        hide_window(&mut command);

        tracing::debug!("Spawning {} in {:?}", program, working_dir);
        let start_time = Instant::now();
        let mut child = command
            .spawn()
            .map_err(|source| spawn_error(program, working_dir, source))?;

        // The command still owns the write ends; the reader would never hit EOF
        drop(command);

        let status = child.wait().map_err(capture_error)?;
        let elapsed = start_time.elapsed();
        let raw = drain(&chunks, program).map_err(capture_error)?;

        let result = DecodeResult::from_status(
            String::from_utf8_lossy(&raw).into_owned(),
            status,
            elapsed,
        );
        tracing::debug!(
            "{} exited with {:?} after {:?}",
            program,
            result.exit_code,
            result.elapsed
        );
        Ok(result)
    }
}

/// Forward everything written to the pipe as chunks until EOF.
fn spawn_reader(mut reader: io::PipeReader) -> io::Result<Receiver<io::Result<Vec<u8>>>> {
    let (tx, rx) = mpsc::channel();
    thread::Builder::new()
        .name("decode-output".to_string())
        .spawn(move || {
            let mut buf = [0u8; 8192];
            loop {
                match reader.read(&mut buf) {
                    Ok(0) => break,
                    Ok(n) => {
                        if tx.send(Ok(buf[..n].to_vec())).is_err() {
                            break;
                        }
                    }
                    Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                    Err(e) => {
                        let _ = tx.send(Err(e));
                        break;
                    }
                }
            }
        })?;
    Ok(rx)
}

/// Collect the tool's output after it has exited.
///
/// Background processes the tool started may inherit the pipe and hold it
/// open. Whatever is still unread after [`DRAIN_GRACE`] is left to the reader
/// thread, which exits once they close it.
fn drain(chunks: &Receiver<io::Result<Vec<u8>>>, program: &str) -> io::Result<Vec<u8>> {
    let mut raw = Vec::new();
    let deadline = Instant::now() + DRAIN_GRACE;
    loop {
        match chunks.recv_timeout(deadline.saturating_duration_since(Instant::now())) {
            Ok(chunk) => raw.extend_from_slice(&chunk?),
            Err(RecvTimeoutError::Disconnected) => return Ok(raw),
            Err(RecvTimeoutError::Timeout) => {
                tracing::warn!(
                    "{} exited but its output is still held open, not waiting for it",
                    program
                );
                return Ok(raw);
            }
        }
    }
}

fn spawn_error(program: &str, working_dir: &Path, source: io::Error) -> InvokeError {
    // A missing working directory also surfaces as NotFound
    if source.kind() == io::ErrorKind::NotFound && working_dir.is_dir() {
        InvokeError::NotFound {
            program: program.to_string(),
        }
    } else {
        InvokeError::SpawnFailed {
            program: program.to_string(),
            source,
        }
    }
}

#[cfg(windows)]
fn hide_window(command: &mut Command) {
    use std::os::windows::process::CommandExt;
    const CREATE_NO_WINDOW: u32 = 0x0800_0000;
    command.creation_flags(CREATE_NO_WINDOW);
}

#[cfg(not(windows))]
fn hide_window(_command: &mut Command) {}
