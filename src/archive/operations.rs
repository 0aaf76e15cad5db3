use crate::archive::command::{CommandBuilder, CommandLine, CompressRequest};
use crate::archive::formats::{has_extension_in, readable_extensions};
use crate::archive::listing::{ArchiveListing, ListingCollector};
use crate::archive::staging::StagedFile;
use crate::config::{Config, ProgressLabels};
use crate::error::{Result, SevenRunError};
use crate::runner::classifier::{LineClassifier, LineKind, ListField, OperationKind};
use crate::runner::progress::ProgressSink;
use crate::runner::report::describe_return_code;
use crate::runner::supervisor::{LaunchOptions, ProcessSupervisor};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use walkdir::WalkDir;

/// Default bound on how deep [`ArchiveTool::extract_recursive`] descends.
pub const DEFAULT_MAX_NESTING: usize = 8;

/// Compress, extract, count and list archives through the 7-Zip executable.
///
/// Every call spawns one tool process and blocks until it exits. Nothing is
/// shared between calls, so independent calls may run on different threads
/// as long as they do not write to the same destination.
#[derive(Debug, Clone)]
pub struct ArchiveTool {
    builder: CommandBuilder,
    supervisor: ProcessSupervisor,
    labels: ProgressLabels,
}

impl ArchiveTool {
    pub fn new(builder: CommandBuilder, launch: LaunchOptions, labels: ProgressLabels) -> Self {
        Self {
            builder,
            supervisor: ProcessSupervisor::new(launch),
            labels,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        let builder = CommandBuilder::new(config.tool.executable.clone())
            .with_extra_arguments(config.compression.extra_arguments.clone());
        let launch = LaunchOptions {
            hide_console: config.tool.hide_console,
        };
        Self::new(builder, launch, config.labels.clone())
    }

    pub fn builder(&self) -> &CommandBuilder {
        &self.builder
    }

    /// Packs `request.src_dir` into `request.dest_dir`, returning the final
    /// archive path. The archive is written under a temporary name and only
    /// renamed once the tool reports success; on failure it is removed.
    pub fn compress(
        &self,
        request: &CompressRequest,
        progress: Option<&mut (dyn ProgressSink + '_)>,
    ) -> Result<PathBuf> {
        if !request.src_dir.is_dir() {
            return Err(SevenRunError::InvalidPath {
                path: request.src_dir.display().to_string(),
            });
        }

        let plan = self.builder.compress(request)?;
        info!(
            archive = %plan.staged.target_path().display(),
            format = plan.settings.format.type_name(),
            "compressing {}",
            request.src_dir.display()
        );
        self.pack(
            &plan.command,
            plan.staged,
            &request.src_dir,
            &plan.settings.archive_name,
            progress,
        )
    }

    fn pack(
        &self,
        command: &CommandLine,
        staged: StagedFile,
        src_dir: &Path,
        archive_name: &str,
        mut progress: Option<&mut (dyn ProgressSink + '_)>,
    ) -> Result<PathBuf> {
        let header = format!("{}\n{}", archive_name, self.labels.compressing);
        if let Some(sink) = progress.as_deref_mut() {
            sink.set_total(1 + count_source_files(src_dir))?;
        }

        let classifier = LineClassifier::new(OperationKind::Compress);
        let mut index = 0;
        let result = self
            .supervisor
            .run(command, &classifier, |kind| {
                if let (LineKind::Compressing(path), Some(sink)) = (kind, progress.as_deref_mut()) {
                    sink.update(index, &format!("{}\n{}", header, path))?;
                    index += 1;
                }
                Ok(())
            })
            .and_then(|outcome| outcome.into_result(archive_name, OperationKind::Compress));

        match result.and_then(|_| staged.clone().commit()) {
            Ok(archive) => {
                info!("created {}", archive.display());
                Ok(archive)
            }
            Err(e) => {
                if let Err(cleanup) = staged.discard() {
                    warn!("could not remove {}: {}", staged.temp_path().display(), cleanup);
                }
                Err(e)
            }
        }
    }

    /// Unpacks `archive` into `out_dir`.
    ///
    /// Returns the extracted entries (as printed by the tool, relative to
    /// `out_dir`) whose extension is in `read_extensions`: nested archives a
    /// caller may want to unpack in turn.
    pub fn extract(
        &self,
        archive: &Path,
        out_dir: &Path,
        progress: Option<&mut (dyn ProgressSink + '_)>,
        read_extensions: Option<&[String]>,
    ) -> Result<Vec<PathBuf>> {
        ensure_archive(archive)?;
        info!("extracting {} to {}", archive.display(), out_dir.display());
        let command = self.builder.extract(archive, out_dir);
        self.unpack(
            &command,
            &archive.display().to_string(),
            progress,
            read_extensions,
        )
    }

    fn unpack(
        &self,
        command: &CommandLine,
        target: &str,
        mut progress: Option<&mut (dyn ProgressSink + '_)>,
        read_extensions: Option<&[String]>,
    ) -> Result<Vec<PathBuf>> {
        let header = format!("{}\n{}", target, self.labels.extracting);
        let classifier = LineClassifier::new(OperationKind::Extract);
        let mut sub_archives = Vec::new();
        let mut index = 0;

        let outcome = self.supervisor.run(command, &classifier, |kind| {
            if let LineKind::Extracting(path) = kind {
                let extracted = PathBuf::from(&path);
                if read_extensions.is_some_and(|exts| has_extension_in(&extracted, exts)) {
                    sub_archives.push(extracted);
                }
                if let Some(sink) = progress.as_deref_mut() {
                    sink.update(index, &format!("{}\n{}", header, path))?;
                    index += 1;
                }
            }
            Ok(())
        })?;
        outcome.into_result(target, OperationKind::Extract)?;

        Ok(sub_archives)
    }

    /// Extracts `archive`, then every nested archive found inside it into a
    /// directory next to it named after the nested archive's stem. Stops
    /// descending after `max_depth` levels.
    ///
    /// Returns the nested archives that were unpacked.
    pub fn extract_recursive(
        &self,
        archive: &Path,
        out_dir: &Path,
        mut progress: Option<&mut (dyn ProgressSink + '_)>,
        max_depth: usize,
    ) -> Result<Vec<PathBuf>> {
        let extensions = readable_extensions();
        let mut unpacked = Vec::new();
        let mut pending = VecDeque::from([(archive.to_path_buf(), out_dir.to_path_buf(), 0)]);

        while let Some((archive, out_dir, depth)) = pending.pop_front() {
            let nested = self.extract(
                &archive,
                &out_dir,
                progress.as_deref_mut(),
                Some(extensions.as_slice()),
            )?;
            if depth > 0 {
                unpacked.push(archive.clone());
            }

            if depth >= max_depth {
                if !nested.is_empty() {
                    warn!(
                        "not descending into {} nested archive(s) of {}: depth limit {} reached",
                        nested.len(),
                        archive.display(),
                        max_depth
                    );
                }
                continue;
            }

            for sub in nested {
                let sub_archive = out_dir.join(sub);
                let sub_out = nested_output_dir(&sub_archive);
                pending.push_back((sub_archive, sub_out, depth + 1));
            }
        }

        Ok(unpacked)
    }

    /// Number of files in `archive`, optionally restricted to the names in
    /// `list_file` and searched recursively.
    pub fn count_files(
        &self,
        archive: &Path,
        list_file: Option<&Path>,
        recurse: bool,
    ) -> Result<u64> {
        ensure_archive(archive)?;
        let command = self.builder.count(archive, list_file, recurse);
        let target = archive.display().to_string();
        let classifier = LineClassifier::new(OperationKind::Count);

        let outcome = self
            .supervisor
            .run(&command, &classifier, |_| Ok(()))?
            .into_result(&target, OperationKind::Count)?;
        outcome.file_count(&target)
    }

    /// Runs a detailed listing and forwards every recognised field, in output
    /// order. Grouping fields into entries is left to `on_field`; see
    /// [`ArchiveTool::list_entries`].
    pub fn list_archive<F>(&self, archive: &Path, mut on_field: F) -> Result<()>
    where
        F: FnMut(ListField, &str),
    {
        ensure_archive(archive)?;
        let command = self.builder.detailed_list(archive);
        let classifier = LineClassifier::new(OperationKind::List);

        self.supervisor
            .run(&command, &classifier, |kind| {
                if let LineKind::ListField { field, value } = kind {
                    on_field(field, &value);
                }
                Ok(())
            })?
            .into_result(&archive.display().to_string(), OperationKind::List)?;
        Ok(())
    }

    pub fn list_entries(&self, archive: &Path) -> Result<ArchiveListing> {
        let mut collector = ListingCollector::for_archive(archive.display().to_string());
        self.list_archive(archive, |field, value| collector.push(field, value))?;
        Ok(collector.finish())
    }

    /// Runs the tool with `arguments` passed through unchanged and hands its
    /// whole output to `on_output` once it has exited. A nonzero exit code is
    /// then reported as an operation failure headed by `error_message`.
    pub fn run_raw<I, F>(&self, arguments: I, error_message: &str, on_output: F) -> Result<()>
    where
        I: IntoIterator,
        I::Item: Into<String>,
        F: FnOnce(&str),
    {
        let command = CommandLine::from_args(self.builder.tool(), arguments);
        let captured = self.supervisor.run_to_end(&command)?;
        on_output(&captured.output);

        if captured.return_code == Some(0) {
            return Ok(());
        }
        let message = format!(
            "{}\n{}",
            error_message,
            describe_return_code(captured.return_code)
        );
        warn!("{}", message);
        Err(SevenRunError::operation(
            message,
            captured.return_code,
            captured.output,
        ))
    }
}

fn ensure_archive(archive: &Path) -> Result<()> {
    if archive.is_file() {
        Ok(())
    } else {
        Err(SevenRunError::ArchiveNotFound {
            path: archive.display().to_string(),
        })
    }
}

/// Files under `src_dir`, used as the progress total of a compress run.
fn count_source_files(src_dir: &Path) -> u64 {
    WalkDir::new(src_dir)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| !entry.file_type().is_dir())
        .count() as u64
}

fn nested_output_dir(sub_archive: &Path) -> PathBuf {
    let stem = sub_archive
        .file_stem()
        .map(|s| s.to_os_string())
        .unwrap_or_else(|| "nested".into());
    sub_archive.with_file_name(stem)
}
