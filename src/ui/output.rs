use crate::archive::command::CommandLine;
use crate::archive::listing::ArchiveListing;
use crate::error::{SevenRunError, UserFriendlyError};
use crate::ui::progress::format_duration;
use console::{style, Emoji, Term};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutputMode {
    Human,
    Json,
    Plain,
}

// Emojis with text fallbacks
static CHECKMARK: Emoji = Emoji("✅ ", "✓ ");
static CROSS: Emoji = Emoji("❌ ", "✗ ");
static INFO: Emoji = Emoji("ℹ️  ", "i ");
static WARNING: Emoji = Emoji("⚠️  ", "! ");
static ROCKET: Emoji = Emoji("🚀 ", "> ");
static PACKAGE: Emoji = Emoji("📦 ", "# ");

pub struct OutputFormatter {
    mode: OutputMode,
    use_colors: bool,
    verbose_level: u8,
    quiet: bool,
}

impl OutputFormatter {
    pub fn new(mode: OutputMode, verbose: u8, quiet: bool) -> Self {
        let use_colors = match mode {
            OutputMode::Human => Term::stdout().features().colors_supported() && !quiet,
            _ => false,
        };

        Self {
            mode,
            use_colors,
            verbose_level: if quiet { 0 } else { verbose },
            quiet,
        }
    }

    // Core messaging methods
    pub fn error(&self, message: &str) {
        match self.mode {
            OutputMode::Human => self.print_human_message(MessageType::Error, message),
            OutputMode::Json => self.print_json_message("error", message),
            OutputMode::Plain => eprintln!("ERROR: {}", message),
        }
    }

    /// Warnings go to stderr so they never mix with an operation's result.
    pub fn warning(&self, message: &str) {
        if self.should_show_message(0) {
            match self.mode {
                OutputMode::Human => self.print_human_message(MessageType::Warning, message),
                OutputMode::Json => self.print_json_message("warning", message),
                OutputMode::Plain => eprintln!("WARNING: {}", message),
            }
        }
    }

    pub fn start_operation(&self, operation: &str) {
        if self.should_show_message(1) {
            match self.mode {
                OutputMode::Human => {
                    if self.use_colors {
                        println!("{}{}", ROCKET, style(operation).bold());
                    } else {
                        println!("> {}", operation);
                    }
                }
                OutputMode::Json => self.print_json_message("operation_start", operation),
                OutputMode::Plain => println!("STARTING: {}", operation),
            }
        }
    }

    // User-friendly error handling
    pub fn print_user_friendly_error(&self, error: &SevenRunError) {
        let user_message = error.user_message();
        self.error(&user_message);

        if let Some(suggestion) = error.suggestion() {
            match self.mode {
                OutputMode::Human => {
                    eprintln!();
                    if self.use_colors {
                        eprintln!(
                            "{}{}",
                            INFO,
                            style(&format!("Suggestion: {}", suggestion)).cyan()
                        );
                    } else {
                        eprintln!("Suggestion: {}", suggestion);
                    }
                }
                OutputMode::Json => {
                    self.print_json_object(&serde_json::json!({
                        "type": "suggestion",
                        "message": suggestion
                    }));
                }
                OutputMode::Plain => {
                    eprintln!("SUGGESTION: {}", suggestion);
                }
            }
        }
    }

    // Operation results. These are the program's output and are printed in
    // quiet mode too.

    /// Rendered command line of a `--dry-run`.
    pub fn print_command(&self, operation: &str, command: &CommandLine) {
        match self.mode {
            OutputMode::Human | OutputMode::Plain => println!("{}", command),
            OutputMode::Json => self.print_json_object(&serde_json::json!({
                "type": "dry_run",
                "operation": operation,
                "command": command.to_string(),
                "program": command.program(),
                "arguments": command.arguments(),
            })),
        }
    }

    pub fn print_compress_result(&self, archive: &Path, duration: Duration) {
        match self.mode {
            OutputMode::Human => {
                if self.quiet {
                    println!("{}", archive.display());
                } else if self.use_colors {
                    println!(
                        "{}Created {} {}",
                        CHECKMARK,
                        style(archive.display()).cyan().bold(),
                        style(format!("({})", format_duration(duration))).dim()
                    );
                } else {
                    println!(
                        "✓ Created {} ({})",
                        archive.display(),
                        format_duration(duration)
                    );
                }
            }
            OutputMode::Json => self.print_json_object(&serde_json::json!({
                "type": "compress",
                "archive": archive.display().to_string(),
                "duration_ms": duration.as_millis() as u64,
                "timestamp": chrono::Utc::now().to_rfc3339()
            })),
            OutputMode::Plain => println!("{}", archive.display()),
        }
    }

    /// `nested` holds the archives found inside (and, when `recursive`, also
    /// unpacked from) the extracted archive.
    pub fn print_extract_result(
        &self,
        archive: &Path,
        out_dir: &Path,
        nested: &[PathBuf],
        recursive: bool,
        duration: Duration,
    ) {
        match self.mode {
            OutputMode::Human => {
                if !self.quiet {
                    let headline = format!(
                        "Extracted {} to {} ({})",
                        archive.display(),
                        out_dir.display(),
                        format_duration(duration)
                    );
                    if self.use_colors {
                        println!("{}{}", CHECKMARK, style(headline).green().bold());
                    } else {
                        println!("✓ {}", headline);
                    }
                    if !nested.is_empty() {
                        let verb = if recursive { "Unpacked" } else { "Found" };
                        println!("  {} {} nested archive(s):", verb, nested.len());
                    }
                }
                for path in nested {
                    if self.use_colors {
                        println!("  {}{}", PACKAGE, path.display());
                    } else {
                        println!("  {}", path.display());
                    }
                }
            }
            OutputMode::Json => self.print_json_object(&serde_json::json!({
                "type": "extract",
                "archive": archive.display().to_string(),
                "output_dir": out_dir.display().to_string(),
                "recursive": recursive,
                "nested_archives": nested
                    .iter()
                    .map(|p| p.display().to_string())
                    .collect::<Vec<_>>(),
                "duration_ms": duration.as_millis() as u64,
                "timestamp": chrono::Utc::now().to_rfc3339()
            })),
            OutputMode::Plain => {
                for path in nested {
                    println!("{}", path.display());
                }
            }
        }
    }

    pub fn print_listing(&self, archive: &Path, listing: &ArchiveListing) {
        match self.mode {
            OutputMode::Human => self.print_human_listing(archive, listing),
            OutputMode::Json => self.print_json_object(&serde_json::json!({
                "type": "list",
                "archive": archive.display().to_string(),
                "solid": listing.solid,
                "entries": listing.entries,
            })),
            OutputMode::Plain => {
                for entry in &listing.entries {
                    println!(
                        "{}\t{}\t{}\t{}\t{}",
                        entry.path,
                        entry.size.map(|s| s.to_string()).unwrap_or_default(),
                        entry.crc.as_deref().unwrap_or(""),
                        entry.attributes.as_deref().unwrap_or(""),
                        entry.method.as_deref().unwrap_or("")
                    );
                }
            }
        }
    }

    /// Unprocessed output of an `exec` run.
    pub fn print_tool_output(&self, output: &str) {
        match self.mode {
            OutputMode::Human | OutputMode::Plain => {
                print!("{}", output);
                io::stdout().flush().ok();
            }
            OutputMode::Json => self.print_json_object(&serde_json::json!({
                "type": "exec",
                "output": output,
            })),
        }
    }

    pub fn print_count(&self, archive: &Path, count: u64) {
        match self.mode {
            OutputMode::Human if !self.quiet => {
                println!("{}: {} files", archive.display(), count)
            }
            OutputMode::Human | OutputMode::Plain => println!("{}", count),
            OutputMode::Json => self.print_json_object(&serde_json::json!({
                "type": "count",
                "archive": archive.display().to_string(),
                "files": count,
            })),
        }
    }

    pub fn print_separator(&self) {
        if self.quiet {
            return;
        }

        match self.mode {
            OutputMode::Human => {
                if self.use_colors {
                    println!("{}", style("─".repeat(60)).dim());
                } else {
                    println!("{}", "-".repeat(60));
                }
            }
            OutputMode::Plain => {
                println!("{}", "-".repeat(60));
            }
            OutputMode::Json => {}
        }
    }

    // Private helper methods
    fn should_show_message(&self, min_verbose_level: u8) -> bool {
        !self.quiet && self.verbose_level >= min_verbose_level
    }

    fn print_human_listing(&self, archive: &Path, listing: &ArchiveListing) {
        if !self.quiet {
            let solid = match listing.solid {
                Some(true) => "solid",
                Some(false) => "non-solid",
                None => "solidity unknown",
            };
            let title = format!("{} ({})", archive.display(), solid);
            if self.use_colors {
                println!("{}{}", PACKAGE, style(title).bold().cyan());
            } else {
                println!("{}", title);
            }
            self.print_separator();
        }

        for entry in &listing.entries {
            let size = match entry.size {
                Some(size) if !entry.is_directory() => format_bytes(size),
                _ => String::new(),
            };
            println!(
                "{:>10}  {:8}  {:5}  {}",
                size,
                entry.crc.as_deref().unwrap_or(""),
                entry.attributes.as_deref().unwrap_or(""),
                entry.path
            );
        }

        if !self.quiet {
            self.print_separator();
            let total: u64 = listing.files().filter_map(|entry| entry.size).sum();
            println!(
                "{} files, {}",
                listing.files().count(),
                format_bytes(total)
            );
        }
    }

    fn print_human_message(&self, msg_type: MessageType, message: &str) {
        #[allow(clippy::type_complexity)]
        let (emoji, color_fn): (Emoji, Box<dyn Fn(&str) -> console::StyledObject<&str>>) =
            match msg_type {
                MessageType::Error => (CROSS, Box::new(|msg| style(msg).red().bold())),
                MessageType::Warning => (WARNING, Box::new(|msg| style(msg).yellow().bold())),
            };

        if self.use_colors {
            eprintln!("{}{}", emoji, color_fn(message));
        } else {
            let prefix = match msg_type {
                MessageType::Error => "✗",
                MessageType::Warning => "!",
            };
            eprintln!("{} {}", prefix, message);
        }
    }

    fn print_json_message(&self, level: &str, message: &str) {
        self.print_json_object(&serde_json::json!({
            "type": "message",
            "level": level,
            "message": message,
            "timestamp": chrono::Utc::now().to_rfc3339()
        }));
    }

    fn print_json_object(&self, obj: &serde_json::Value) {
        println!(
            "{}",
            serde_json::to_string(obj).unwrap_or_else(|_| "{}".to_string())
        );
    }
}

#[derive(Debug, Clone, Copy)]
enum MessageType {
    Error,
    Warning,
}

fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB"];
    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    if unit_index == 0 {
        format!("{} {}", bytes, UNITS[unit_index])
    } else {
        format!("{:.1} {}", size, UNITS[unit_index])
    }
}
