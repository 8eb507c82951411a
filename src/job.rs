//! Captures awaiting decode and the per-capture unit of work.

use crate::flags::DecodeOptions;
use crate::satellite::Satellite;
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};

/// Extension of decoded images
pub const IMAGE_EXTENSION: &str = "png";

/// An audio capture found in the input directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputFile {
    path: PathBuf,
    stem: OsString,
    base_name: String,
}

impl InputFile {
    /// Wrap a discovered path. Returns `None` for paths without a file name.
    pub fn new(path: PathBuf) -> Option<Self> {
        let stem = path.file_stem()?.to_os_string();
        let base_name = stem.to_string_lossy().into_owned();
        Some(Self {
            path,
            stem,
            base_name,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File name without directory and extension, exactly as on disk
    pub fn stem(&self) -> &OsStr {
        &self.stem
    }

    /// Lossy UTF-8 form of [`InputFile::stem`], for matching and display
    pub fn base_name(&self) -> &str {
        &self.base_name
    }

    /// File name with extension, as shown in progress headers
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.base_name.clone())
    }
}

/// Everything needed to decode one capture.
#[derive(Debug, Clone)]
pub struct DecodeJob {
    pub input: InputFile,
    pub satellite: Satellite,
    pub output_path: PathBuf,
    pub options: DecodeOptions,
}

impl DecodeJob {
    /// Infer the satellite and resolve `<output_dir>/<base name>.png`.
    pub fn new(input: InputFile, output_dir: &Path, options: DecodeOptions) -> Self {
        let satellite = Satellite::infer(input.base_name());
        let mut image_name = input.stem().to_os_string();
        image_name.push(".");
        image_name.push(IMAGE_EXTENSION);
        let output_path = output_dir.join(image_name);
        Self {
            input,
            satellite,
            output_path,
            options,
        }
    }

    /// Argument vector for the decode tool.
    ///
    /// Paths stay single arguments even when they contain spaces.
    pub fn args(&self) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "-o".into(),
            self.output_path.clone().into(),
            "--sat".into(),
            self.satellite.id().into(),
            "--rotate".into(),
            "auto".into(),
        ];
        args.extend(self.options.args().map(OsString::from));
        args.push(self.input.path().into());
        args
    }

    /// The arguments rendered as one line, the way the tool is documented to be called.
    pub fn command_line(&self) -> String {
        format!(
            "-o {} --sat {} --rotate auto {} {}",
            self.output_path.display(),
            self.satellite,
            self.options.compose(),
            self.input.path().display()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(path: &str, options: DecodeOptions) -> DecodeJob {
        let input = InputFile::new(PathBuf::from(path)).expect("has a file name");
        DecodeJob::new(input, Path::new("/in/noaaAptOut"), options)
    }

    #[test]
    fn test_input_file_names() {
        let input = InputFile::new(PathBuf::from("/in/noaa_15_pass.wav")).unwrap();
        assert_eq!(input.base_name(), "noaa_15_pass");
        assert_eq!(input.file_name(), "noaa_15_pass.wav");
        assert!(InputFile::new(PathBuf::from("/")).is_none());
    }

    #[test]
    fn test_output_path_uses_base_name() {
        let job = job("/in/pass.2023.wav", DecodeOptions::default());
        assert_eq!(job.output_path, PathBuf::from("/in/noaaAptOut/pass.2023.png"));
    }

    #[cfg(unix)]
    #[test]
    fn test_output_path_keeps_raw_stem() {
        use std::os::unix::ffi::OsStrExt;

        let path = PathBuf::from(OsStr::from_bytes(b"/in/pass\xff.wav"));
        let input = InputFile::new(path).unwrap();
        let job = DecodeJob::new(input, Path::new("/in/noaaAptOut"), DecodeOptions::default());
        assert_eq!(
            job.output_path.as_os_str().as_bytes(),
            b"/in/noaaAptOut/pass\xff.png"
        );
        assert_eq!(job.input.base_name(), "pass\u{FFFD}");
    }

    #[test]
    fn test_command_line_with_overlay() {
        let options = DecodeOptions {
            false_color: false,
            overlay: true,
        };
        let job = job("/in/noaa_15_pass.wav", options);
        assert_eq!(
            job.command_line(),
            "-o /in/noaaAptOut/noaa_15_pass.png --sat noaa_15 --rotate auto  -m yes /in/noaa_15_pass.wav"
        );
    }

    #[test]
    fn test_command_line_without_flags_keeps_spacing() {
        let job = job("/in/capture1.wav", DecodeOptions::default());
        assert_eq!(
            job.command_line(),
            "-o /in/noaaAptOut/capture1.png --sat noaa_19 --rotate auto  /in/capture1.wav"
        );
    }

    #[test]
    fn test_args_structure() {
        let options = DecodeOptions {
            false_color: true,
            overlay: true,
        };
        let job = job("/in/my pass noaa_18.wav", options);
        let args: Vec<String> = job
            .args()
            .into_iter()
            .map(|arg| arg.to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            args,
            [
                "-o",
                "/in/noaaAptOut/my pass noaa_18.png",
                "--sat",
                "noaa_18",
                "--rotate",
                "auto",
                "-F",
                "--contrast",
                "telemetry",
                "-m",
                "yes",
                "/in/my pass noaa_18.wav",
            ]
        );
    }
}
