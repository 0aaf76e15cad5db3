pub mod archive;
pub mod cli;
pub mod config;
pub mod error;
pub mod runner;
pub mod ui;

// Public API re-exports
pub use cli::{Cli, Command, OutputFormat};
pub use config::{CliOverrides, Config, ProgressLabels};
pub use error::{Result, SevenRunError, UserFriendlyError};

// Core functionality re-exports
pub use archive::{
    ArchiveEntry, ArchiveFormat, ArchiveListing, ArchiveTool, CommandBuilder, CommandLine,
    CompressRequest,
};
pub use runner::{
    LaunchOptions, LineClassifier, LineKind, ListField, OperationKind, ProcessSupervisor,
    ProgressSink, RecordingProgress, RunOutcome,
};
pub use ui::{OutputFormatter, OutputMode, ProgressManager};

use archive::formats::readable_extensions;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::warn;

/// Main library interface: runs archive operations with progress display
pub struct SevenRun {
    config: Config,
    tool: ArchiveTool,
    output_formatter: OutputFormatter,
    progress_manager: ProgressManager,
}

/// What an extract run left behind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractSummary {
    /// Nested archives found in the output; already unpacked when `recursive`.
    pub nested: Vec<PathBuf>,
    pub recursive: bool,
}

impl SevenRun {
    /// Create a new SevenRun instance with the provided configuration
    pub fn new(config: Config, output_mode: OutputMode, verbose: u8, quiet: bool) -> Self {
        let output_formatter = OutputFormatter::new(output_mode, verbose, quiet);
        let progress_manager = ProgressManager::new(!quiet && output_mode == OutputMode::Human);
        let tool = ArchiveTool::from_config(&config);

        Self {
            config,
            tool,
            output_formatter,
            progress_manager,
        }
    }

    /// Create SevenRun instance from CLI arguments
    pub fn from_cli(cli_args: &Cli) -> Result<Self> {
        let config = cli_args.load_config()?;
        let output_mode = match cli_args.output_format {
            OutputFormat::Human => OutputMode::Human,
            OutputFormat::Json => OutputMode::Json,
            OutputFormat::Plain => OutputMode::Plain,
        };

        Ok(Self::new(
            config,
            output_mode,
            cli_args.verbosity_level(),
            cli_args.quiet,
        ))
    }

    /// Pack a directory, showing one progress step per file the tool reports
    pub fn compress(&self, request: &CompressRequest) -> Result<PathBuf> {
        self.output_formatter.start_operation(&format!(
            "Compressing {} into {}",
            request.src_dir.display(),
            request.archive_name
        ));

        let mut pb = self
            .progress_manager
            .create_archive_progress(&self.config.labels.compressing);
        let started = Instant::now();

        match self.tool.compress(request, Some(&mut pb)) {
            Ok(archive) => {
                ui::progress::finish_progress_with_summary(
                    &pb,
                    &archive.display().to_string(),
                    started.elapsed(),
                );
                Ok(archive)
            }
            Err(e) => {
                pb.abandon();
                Err(e)
            }
        }
    }

    /// Unpack an archive. The file count is fetched first so the progress bar
    /// has a length; a failed count only costs the length.
    pub fn extract(
        &self,
        archive: &Path,
        out_dir: &Path,
        recursive: bool,
        max_depth: usize,
    ) -> Result<ExtractSummary> {
        self.output_formatter.start_operation(&format!(
            "Extracting {} to {}",
            archive.display(),
            out_dir.display()
        ));

        let mut pb = self
            .progress_manager
            .create_archive_progress(&self.config.labels.extracting);
        match self.tool.count_files(archive, None, false) {
            Ok(total) => ProgressSink::set_total(&mut pb, total)?,
            Err(e) => {
                warn!("could not count files in {}: {}", archive.display(), e);
                self.progress_manager.suspend(|| {
                    self.output_formatter.warning(&format!(
                        "Could not count files in {}; progress has no total",
                        archive.display()
                    ))
                });
            }
        }
        let started = Instant::now();

        let result = if recursive {
            self.tool
                .extract_recursive(archive, out_dir, Some(&mut pb), max_depth)
        } else {
            let extensions = readable_extensions();
            self.tool.extract(
                archive,
                out_dir,
                Some(&mut pb),
                Some(extensions.as_slice()),
            )
        };

        match result {
            Ok(nested) => {
                ui::progress::finish_progress_with_summary(
                    &pb,
                    &out_dir.display().to_string(),
                    started.elapsed(),
                );
                Ok(ExtractSummary { nested, recursive })
            }
            Err(e) => {
                pb.abandon();
                Err(e)
            }
        }
    }

    pub fn list(&self, archive: &Path) -> Result<ArchiveListing> {
        let spinner = self
            .progress_manager
            .create_spinner(&format!("Listing {}", archive.display()));
        let result = self.tool.list_entries(archive);
        spinner.finish_and_clear();
        result
    }

    pub fn count(&self, archive: &Path, list_file: Option<&Path>, recurse: bool) -> Result<u64> {
        let spinner = self
            .progress_manager
            .create_spinner(&format!("Counting files in {}", archive.display()));
        let result = self.tool.count_files(archive, list_file, recurse);
        spinner.finish_and_clear();
        result
    }

    /// Run the tool with `args` as given and print everything it wrote. The
    /// output is printed even when the tool then exits with an error.
    pub fn exec(&self, args: &[String]) -> Result<()> {
        let error_message = format!(
            "{} {}: Command failed:",
            self.tool.builder().tool(),
            args.join(" ")
        );
        self.tool.run_raw(args.iter().cloned(), &error_message, |output| {
            self.output_formatter.print_tool_output(output)
        })
    }

    /// Command line a compress run would execute, without running it
    pub fn compress_command(&self, request: &CompressRequest) -> Result<CommandLine> {
        Ok(self.tool.builder().compress(request)?.command)
    }

    /// Command line an extract run would execute, without running it
    pub fn extract_command(&self, archive: &Path, out_dir: &Path) -> CommandLine {
        self.tool.builder().extract(archive, out_dir)
    }

    /// Generate sample configuration file
    pub fn generate_sample_config<P: AsRef<Path>>(output_path: P) -> Result<()> {
        let sample_config = Config::create_sample_config();
        std::fs::write(output_path.as_ref(), sample_config)?;
        Ok(())
    }

    /// Get configuration reference
    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn tool(&self) -> &ArchiveTool {
        &self.tool
    }

    /// Get output formatter reference
    pub fn output_formatter(&self) -> &OutputFormatter {
        &self.output_formatter
    }

    /// Get progress manager reference
    pub fn progress_manager(&self) -> &ProgressManager {
        &self.progress_manager
    }

    /// Handle error with user-friendly output
    pub fn handle_error(&self, error: &SevenRunError) {
        self.progress_manager.clear();
        self.output_formatter.print_user_friendly_error(error);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn quiet_instance(config: Config) -> SevenRun {
        SevenRun::new(config, OutputMode::Plain, 0, true)
    }

    #[test]
    fn test_sevenrun_creation() {
        let sevenrun = quiet_instance(Config::default());
        assert!(!sevenrun.progress_manager().is_enabled());
        assert_eq!(
            sevenrun.tool().builder().tool(),
            Config::default().tool.executable
        );
    }

    #[test]
    fn test_sample_config_generation() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("sample.toml");

        SevenRun::generate_sample_config(&config_path).unwrap();
        assert!(config_path.exists());

        let content = std::fs::read_to_string(&config_path).unwrap();
        assert!(content.contains("[tool]"));
        assert!(content.contains("[compression]"));
        assert!(content.contains("[labels]"));
    }

    #[test]
    fn test_extract_command_is_rendered() {
        let mut config = Config::default();
        config.tool.executable = "7z".to_string();
        let sevenrun = quiet_instance(config);

        let command = sevenrun.extract_command(Path::new("mod.7z"), Path::new("out"));
        assert_eq!(
            command.to_string(),
            "\"7z\" x \"mod.7z\" -y -bb1 -o\"out\" -scsUTF-8 -sccUTF-8"
        );
    }

    #[test]
    fn test_compress_command_uses_config() {
        let mut config = Config::default();
        config.tool.executable = "7z".to_string();
        config.compression.extra_arguments = "-mx=9".to_string();
        let sevenrun = quiet_instance(config);

        let request = CompressRequest {
            dest_dir: PathBuf::from("dist"),
            archive_name: "mod.7z".to_string(),
            src_dir: PathBuf::from("src"),
            solid: true,
            block_size: None,
        };
        let command = sevenrun.compress_command(&request).unwrap().to_string();
        assert!(command.starts_with("7z a "));
        assert!(command.contains("-t7z -ms=on -mx=9 -y -r"));
    }

    #[cfg(unix)]
    #[test]
    fn test_exec_reports_exit_code() {
        let mut config = Config::default();
        config.tool.executable = "sh".to_string();
        let sevenrun = quiet_instance(config);

        assert!(sevenrun.exec(&["-c".to_string(), "exit 0".to_string()]).is_ok());

        let err = sevenrun
            .exec(&["-c".to_string(), "exit 3".to_string()])
            .unwrap_err();
        assert_eq!(err.return_code(), Some(3));
        assert_eq!(
            err.to_string(),
            "sh -c exit 3: Command failed:\n7z return value: 3"
        );
    }

    #[test]
    fn test_missing_archive_errors() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("missing.7z");
        let sevenrun = quiet_instance(Config::default());

        assert!(matches!(
            sevenrun.extract(&missing, temp_dir.path(), false, 1),
            Err(SevenRunError::ArchiveNotFound { .. })
        ));
        assert!(matches!(
            sevenrun.count(&missing, None, false),
            Err(SevenRunError::ArchiveNotFound { .. })
        ));
        assert!(matches!(
            sevenrun.list(&missing),
            Err(SevenRunError::ArchiveNotFound { .. })
        ));
    }
}
