use crate::config::{AppConfig, ExitStatusPolicy};
use crate::error::{BatchError, InvokeError};
use crate::flags::DecodeOptions;
use crate::invoker::{DecodeInvoker, DecodeResult, ProcessInvoker};
use crate::job::{DecodeJob, InputFile};
use crate::metrics::BatchMetrics;
use crate::satellite::Satellite;
use std::fs;
use std::io::Write;
use std::path::PathBuf;

/// Rule printed above and below each capture's progress header
pub const LINE_SEPARATOR: &str = "= = = = = = = = = = = = = = = =\n";

/// How one capture's decode ended.
#[derive(Debug)]
pub enum JobOutcome {
    /// The tool ran and its exit status counts as success
    Completed(DecodeResult),
    /// The tool ran but exited unsuccessfully
    Failed(DecodeResult),
    /// The tool could not be started
    LaunchFailed(InvokeError),
}

impl JobOutcome {
    pub fn result(&self) -> Option<&DecodeResult> {
        match self {
            JobOutcome::Completed(result) | JobOutcome::Failed(result) => Some(result),
            JobOutcome::LaunchFailed(_) => None,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, JobOutcome::Completed(_))
    }
}

/// Per-capture entry of a [`BatchReport`].
#[derive(Debug)]
pub struct JobReport {
    pub input: PathBuf,
    pub output_path: PathBuf,
    pub satellite: Satellite,
    /// Arguments as a single line, see [`DecodeJob::command_line`]
    pub command_line: String,
    pub outcome: JobOutcome,
}

/// Outcomes of a batch run, in discovery order.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub jobs: Vec<JobReport>,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.jobs.len()
    }

    pub fn completed(&self) -> usize {
        self.count(|outcome| matches!(outcome, JobOutcome::Completed(_)))
    }

    pub fn failed(&self) -> usize {
        self.count(|outcome| matches!(outcome, JobOutcome::Failed(_)))
    }

    pub fn launch_failed(&self) -> usize {
        self.count(|outcome| matches!(outcome, JobOutcome::LaunchFailed(_)))
    }

    /// True when every capture completed (vacuously true for an empty batch)
    pub fn all_succeeded(&self) -> bool {
        self.jobs.iter().all(|job| job.outcome.is_completed())
    }

    pub fn summary_line(&self) -> String {
        format!(
            "Decoded {} of {} capture(s): {} failed, {} could not be launched",
            self.completed(),
            self.total(),
            self.failed(),
            self.launch_failed()
        )
    }

    fn count(&self, pred: impl Fn(&JobOutcome) -> bool) -> usize {
        self.jobs.iter().filter(|job| pred(&job.outcome)).count()
    }
}

/// Drives discovery, job construction and decoding for one input directory.
pub struct BatchOrchestrator<I = ProcessInvoker> {
    config: AppConfig,
    invoker: I,
}

impl BatchOrchestrator<ProcessInvoker> {
    /// Orchestrator that launches the real decode tool
    pub fn new(config: AppConfig) -> Self {
        Self::with_invoker(config, ProcessInvoker::new())
    }
}

impl<I: DecodeInvoker> BatchOrchestrator<I> {
    pub fn with_invoker(config: AppConfig, invoker: I) -> Self {
        Self { config, invoker }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn invoker(&self) -> &I {
        &self.invoker
    }

    /// Create the image directory if it is missing. Safe to call repeatedly.
    pub fn ensure_output_dir(&self) -> Result<PathBuf, BatchError> {
        let output_dir = self.config.paths.output_dir();
        fs::create_dir_all(&output_dir).map_err(|source| BatchError::CreateOutputDir {
            path: output_dir.clone(),
            source,
        })?;
        Ok(output_dir)
    }

    /// Files directly inside the input directory whose name matches the
    /// input pattern, in directory listing order.
    pub fn discover_inputs(&self) -> Result<Vec<InputFile>, BatchError> {
        let input_dir = &self.config.paths.input_dir;
        let pattern = glob::Pattern::new(&self.config.decoder.input_pattern).map_err(|source| {
            BatchError::InvalidPattern {
                pattern: self.config.decoder.input_pattern.clone(),
                source,
            }
        })?;
        let list_error = |source| BatchError::ListInputDir {
            path: input_dir.clone(),
            source,
        };

        let mut inputs = Vec::new();
        for entry in fs::read_dir(input_dir).map_err(list_error)? {
            let path = entry.map_err(list_error)?.path();
            if !path.is_file() {
                continue;
            }

            let matches = path
                .file_name()
                .is_some_and(|name| pattern.matches(&name.to_string_lossy()));
            if !matches {
                tracing::trace!("Skipping {:?}", path);
                continue;
            }

            if let Some(input) = InputFile::new(path) {
                inputs.push(input);
            }
        }

        Ok(inputs)
    }

    /// Run the decode tool for one job and classify the result.
    pub fn run_job(&self, job: &DecodeJob) -> JobOutcome {
        tracing::debug!(
            "{} {}",
            self.config.decoder.program,
            job.command_line()
        );

        match self.invoker.invoke(
            &self.config.decoder.program,
            &self.config.paths.working_dir,
            &job.args(),
        ) {
            Ok(result) => self.classify(job, result),
            Err(e) => {
                tracing::error!("Failed to decode {:?}: {}", job.input.path(), e);
                JobOutcome::LaunchFailed(e)
            }
        }
    }

    fn classify(&self, job: &DecodeJob, result: DecodeResult) -> JobOutcome {
        match self.config.report.exit_status {
            ExitStatusPolicy::Report if !result.success() => {
                tracing::warn!(
                    "Decode tool exited with {:?} for {:?}",
                    result.exit_code,
                    job.input.path()
                );
                JobOutcome::Failed(result)
            }
            _ => {
                tracing::info!("Decoded {:?} -> {:?}", job.input.path(), job.output_path);
                JobOutcome::Completed(result)
            }
        }
    }

    /// Decode every capture in the input directory.
    ///
    /// Progress headers and the tool's captured output are written to `out`
    /// as each capture is processed. A capture that fails never stops the
    /// batch; only setup failures and write failures on `out` are returned
    /// as errors.
    pub fn run<W: Write>(
        &self,
        options: DecodeOptions,
        out: &mut W,
    ) -> Result<BatchReport, BatchError> {
        tracing::info!("Starting batch decode");
        tracing::info!("Input directory: {:?}", self.config.paths.input_dir);
        tracing::info!("Options: {:?}", options);

        let output_dir = self.ensure_output_dir()?;
        tracing::info!("Output directory: {:?}", output_dir);

        let inputs = self.discover_inputs()?;
        if inputs.is_empty() {
            tracing::warn!(
                "No files matching {} in {:?}",
                self.config.decoder.input_pattern,
                self.config.paths.input_dir
            );
        } else {
            tracing::info!("Found {} capture(s) to decode", inputs.len());
        }

        let mut metrics = BatchMetrics::new(&self.config.metrics);
        let mut report = BatchReport::default();

        for input in inputs {
            let job = DecodeJob::new(input, &output_dir, options);
            tracing::info!("Processing {:?} as {}", job.input.path(), job.satellite);

            write_header(out, &job.input.file_name()).map_err(BatchError::Report)?;
            let outcome = self.run_job(&job);
            write_outcome(out, &job, &outcome).map_err(BatchError::Report)?;

            match &outcome {
                JobOutcome::LaunchFailed(_) => metrics.record_launch_failure(),
                JobOutcome::Completed(result) | JobOutcome::Failed(result) => {
                    metrics.record_decode(result.elapsed, outcome.is_completed())
                }
            }

            report.jobs.push(JobReport {
                command_line: job.command_line(),
                input: job.input.path().to_path_buf(),
                output_path: job.output_path,
                satellite: job.satellite,
                outcome,
            });
        }

        if self.config.report.print_summary {
            writeln!(out, "{}", report.summary_line()).map_err(BatchError::Report)?;
        }
        out.flush().map_err(BatchError::Report)?;

        if self.config.metrics.enabled {
            metrics.log_summary();
        }
        tracing::info!("Batch decode complete: {}", report.summary_line());

        Ok(report)
    }
}

fn write_header<W: Write>(out: &mut W, file_name: &str) -> std::io::Result<()> {
    out.write_all(progress_header(file_name).as_bytes())?;
    // Visible before the tool starts, which can take minutes
    out.flush()
}

fn write_outcome<W: Write>(
    out: &mut W,
    job: &DecodeJob,
    outcome: &JobOutcome,
) -> std::io::Result<()> {
    match outcome {
        JobOutcome::Completed(result) | JobOutcome::Failed(result) => {
            writeln!(out, "{}", result.output)
        }
        JobOutcome::LaunchFailed(e) => {
            writeln!(out, "error: {}: {e}", job.input.path().display())?;
            if let Some(hint) = e.recovery_hint() {
                writeln!(out, "hint: {hint}")?;
            }
            Ok(())
        }
    }
}

/// Header block printed before a capture's output
pub fn progress_header(file_name: &str) -> String {
    format!("{LINE_SEPARATOR}Processing {file_name}\n{LINE_SEPARATOR}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::{config_for, create_capture_dir, ScriptedInvoker};
    use std::path::Path;

    fn orchestrator(dir: &Path, invoker: ScriptedInvoker) -> BatchOrchestrator<ScriptedInvoker> {
        BatchOrchestrator::with_invoker(config_for(dir), invoker)
    }

    #[test]
    fn test_header_format() {
        let mut out = Vec::new();
        write_header(&mut out, "pass.wav").unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "= = = = = = = = = = = = = = = =\nProcessing pass.wav\n= = = = = = = = = = = = = = = =\n"
        );
        assert_eq!(
            progress_header("pass.wav"),
            "= = = = = = = = = = = = = = = =\nProcessing pass.wav\n= = = = = = = = = = = = = = = =\n"
        );
    }

    #[test]
    fn test_launch_failure_names_the_capture() {
        let input = InputFile::new(PathBuf::from("/in/noaa_18_pass.wav")).unwrap();
        let job = DecodeJob::new(input, Path::new("/in/noaaAptOut"), DecodeOptions::default());
        let outcome = JobOutcome::LaunchFailed(InvokeError::NotFound {
            program: "noaa-apt".to_string(),
        });

        let mut out = Vec::new();
        write_outcome(&mut out, &job, &outcome).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text.lines().next(),
            Some("error: /in/noaa_18_pass.wav: Decode tool 'noaa-apt' was not found")
        );
    }

    #[test]
    fn test_discover_filters_by_pattern() {
        let dir = create_capture_dir(&["a.wav", "b.WAV", "notes.txt", "c.wav.bak", "d.wav"]);
        fs::create_dir(dir.path().join("nested.wav")).unwrap();
        fs::write(dir.path().join("nested.wav").join("inner.wav"), b"").unwrap();

        let orchestrator = orchestrator(dir.path(), ScriptedInvoker::new());
        let mut names: Vec<String> = orchestrator
            .discover_inputs()
            .unwrap()
            .iter()
            .map(|input| input.file_name())
            .collect();
        names.sort();
        assert_eq!(names, ["a.wav", "d.wav"]);
    }

    #[test]
    fn test_discover_missing_input_dir() {
        let dir = tempfile::tempdir().unwrap();
        let orchestrator = orchestrator(&dir.path().join("missing"), ScriptedInvoker::new());
        let err = orchestrator.discover_inputs().unwrap_err();
        assert!(matches!(err, BatchError::ListInputDir { .. }));
    }

    #[test]
    fn test_ensure_output_dir_is_idempotent() {
        let dir = create_capture_dir(&[]);
        let orchestrator = orchestrator(dir.path(), ScriptedInvoker::new());

        let output_dir = orchestrator.ensure_output_dir().unwrap();
        fs::write(output_dir.join("old.png"), b"png").unwrap();
        assert_eq!(orchestrator.ensure_output_dir().unwrap(), output_dir);

        assert_eq!(fs::read(output_dir.join("old.png")).unwrap(), b"png");
    }

    #[test]
    fn test_exit_status_policy() {
        let dir = create_capture_dir(&["bad.wav"]);
        let invoker = ScriptedInvoker::new().exit_with("bad", 2, "Error: wrong sample rate");

        let mut config = config_for(dir.path());
        let report = BatchOrchestrator::with_invoker(config.clone(), invoker.clone())
            .run(DecodeOptions::default(), &mut Vec::new())
            .unwrap();
        assert_eq!(report.failed(), 1);
        assert!(!report.all_succeeded());

        config.report.exit_status = ExitStatusPolicy::Ignore;
        let report = BatchOrchestrator::with_invoker(config, invoker)
            .run(DecodeOptions::default(), &mut Vec::new())
            .unwrap();
        assert_eq!(report.completed(), 1);
        assert!(report.all_succeeded());
    }

    #[test]
    fn test_summary_line() {
        let dir = create_capture_dir(&["one.wav", "two.wav", "three.wav"]);
        let invoker = ScriptedInvoker::new()
            .exit_with("two", 1, "decode failed")
            .fail_launch("three");

        let mut out = Vec::new();
        let report = orchestrator(dir.path(), invoker)
            .run(DecodeOptions::default(), &mut out)
            .unwrap();

        let summary = "Decoded 1 of 3 capture(s): 1 failed, 1 could not be launched";
        assert_eq!(report.summary_line(), summary);
        assert!(String::from_utf8(out).unwrap().ends_with(&format!("{summary}\n")));
    }

    #[test]
    fn test_summary_can_be_disabled() {
        let dir = create_capture_dir(&["one.wav"]);
        let mut config = config_for(dir.path());
        config.report.print_summary = false;

        let mut out = Vec::new();
        BatchOrchestrator::with_invoker(config, ScriptedInvoker::new())
            .run(DecodeOptions::default(), &mut out)
            .unwrap();

        let text = String::from_utf8(out).unwrap();
        assert_eq!(text, format!("{}Decoded one.wav\n", progress_header("one.wav")));
    }

    #[test]
    fn test_empty_batch() {
        let dir = create_capture_dir(&["readme.md"]);
        let invoker = ScriptedInvoker::new();
        let orchestrator = orchestrator(dir.path(), invoker);

        let report = orchestrator
            .run(DecodeOptions::default(), &mut Vec::new())
            .unwrap();
        assert_eq!(report.total(), 0);
        assert!(report.all_succeeded());
        assert!(orchestrator.invoker().calls().is_empty());
        assert!(dir.path().join("noaaAptOut").is_dir());
    }
}
