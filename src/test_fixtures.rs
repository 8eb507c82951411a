//! Test fixtures for exercising the batch loop without the real decode tool
//!
//! [`ScriptedInvoker`] answers each invocation from a script keyed by the
//! capture's base name and records every call, so tests can check exactly
//! what would have been launched.

use crate::config::AppConfig;
use crate::error::InvokeError;
use crate::invoker::{DecodeInvoker, DecodeResult};
use std::cell::RefCell;
use std::collections::HashMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;

/// Scripted reply for one capture
#[derive(Debug, Clone)]
pub enum ScriptedResponse {
    /// The tool "runs" and exits with `code`, printing `output`
    Exit { code: i32, output: String },
    /// The tool cannot be found
    NotFound,
}

/// One recorded invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub program: String,
    pub working_dir: PathBuf,
    pub args: Vec<String>,
}

impl RecordedCall {
    /// Base name of the input path (the last argument)
    pub fn input_base_name(&self) -> Option<String> {
        let input = Path::new(self.args.last()?);
        Some(input.file_stem()?.to_string_lossy().into_owned())
    }
}

/// Fake [`DecodeInvoker`] driven by a per-capture script.
///
/// Captures without a script entry exit 0 printing `Decoded <file name>`.
#[derive(Debug, Clone, Default)]
pub struct ScriptedInvoker {
    script: HashMap<String, ScriptedResponse>,
    calls: RefCell<Vec<RecordedCall>>,
}

impl ScriptedInvoker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the capture with this base name exit with `code`
    pub fn exit_with(mut self, base_name: &str, code: i32, output: &str) -> Self {
        self.script.insert(
            base_name.to_string(),
            ScriptedResponse::Exit {
                code,
                output: output.to_string(),
            },
        );
        self
    }

    /// Make the capture with this base name fail to launch
    pub fn fail_launch(mut self, base_name: &str) -> Self {
        self.script
            .insert(base_name.to_string(), ScriptedResponse::NotFound);
        self
    }

    /// Calls made so far, in order
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.borrow().clone()
    }
}

impl DecodeInvoker for ScriptedInvoker {
    fn invoke(
        &self,
        program: &str,
        working_dir: &Path,
        args: &[OsString],
    ) -> Result<DecodeResult, InvokeError> {
        let call = RecordedCall {
            program: program.to_string(),
            working_dir: working_dir.to_path_buf(),
            args: args
                .iter()
                .map(|arg| arg.to_string_lossy().into_owned())
                .collect(),
        };
        let base_name = call.input_base_name().unwrap_or_default();
        let file_name = args
            .last()
            .and_then(|input| Path::new(input).file_name())
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.calls.borrow_mut().push(call);

        match self.script.get(&base_name) {
            Some(ScriptedResponse::NotFound) => Err(InvokeError::NotFound {
                program: program.to_string(),
            }),
            Some(ScriptedResponse::Exit { code, output }) => Ok(DecodeResult {
                output: output.clone(),
                exit_code: Some(*code),
                elapsed: Duration::from_millis(5),
            }),
            None => Ok(DecodeResult {
                output: format!("Decoded {file_name}"),
                exit_code: Some(0),
                elapsed: Duration::from_millis(5),
            }),
        }
    }
}

/// Temporary input directory holding empty files with the given names
pub fn create_capture_dir(names: &[&str]) -> TempDir {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    for name in names {
        std::fs::write(dir.path().join(name), b"RIFF").expect("Failed to create capture");
    }
    dir
}

/// Default config with input and working directory pointed at `dir`
pub fn config_for(dir: &Path) -> AppConfig {
    let mut config = AppConfig::default();
    config.paths.input_dir = dir.to_path_buf();
    config.paths.working_dir = dir.to_path_buf();
    config
}
