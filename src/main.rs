use clap::Parser;
use sevenrun::cli::{CompressArgs, CountArgs, ExecArgs, ExtractArgs, ListArgs};
use sevenrun::{Cli, Command, OutputFormatter, OutputMode, SevenRun, SevenRunError, UserFriendlyError};
use std::process;
use std::time::Instant;
use tracing_subscriber::{fmt, EnvFilter};

fn main() {
    let exit_code = run();
    process::exit(exit_code);
}

fn run() -> i32 {
    // Parse CLI arguments
    let cli = Cli::parse();
    setup_logging(&cli);
    tracing::debug!("Parsed CLI arguments: {:?}", cli);

    // Handle special commands first
    if cli.generate_config {
        return handle_generate_config(&cli);
    }

    let Some(command) = cli.command.as_ref() else {
        eprintln!("No command given. Run `sevenrun --help` for usage.");
        return 1;
    };

    let sevenrun = match SevenRun::from_cli(&cli) {
        Ok(sevenrun) => sevenrun,
        Err(e) => {
            print_startup_error(&e);
            return exit_code_for(&e);
        }
    };

    let result = match command {
        Command::Compress(args) => handle_compress(&sevenrun, args),
        Command::Extract(args) => handle_extract(&sevenrun, args),
        Command::List(args) => handle_list(&sevenrun, args),
        Command::Count(args) => handle_count(&sevenrun, args),
        Command::Exec(args) => handle_exec(&sevenrun, args),
    };

    match result {
        Ok(()) => 0,
        Err(e) => {
            sevenrun.handle_error(&e);
            exit_code_for(&e)
        }
    }
}

fn handle_compress(sevenrun: &SevenRun, args: &CompressArgs) -> sevenrun::Result<()> {
    let request = args.to_request(sevenrun.config())?;

    if args.dry_run {
        let command = sevenrun.compress_command(&request)?;
        sevenrun.output_formatter().print_command("compress", &command);
        return Ok(());
    }

    let started = Instant::now();
    let archive = sevenrun.compress(&request)?;
    sevenrun
        .output_formatter()
        .print_compress_result(&archive, started.elapsed());
    Ok(())
}

fn handle_extract(sevenrun: &SevenRun, args: &ExtractArgs) -> sevenrun::Result<()> {
    if args.dry_run {
        let command = sevenrun.extract_command(&args.archive, &args.out_dir);
        sevenrun.output_formatter().print_command("extract", &command);
        return Ok(());
    }

    let started = Instant::now();
    let summary = sevenrun.extract(&args.archive, &args.out_dir, args.recursive, args.max_depth)?;
    sevenrun.output_formatter().print_extract_result(
        &args.archive,
        &args.out_dir,
        &summary.nested,
        summary.recursive,
        started.elapsed(),
    );
    Ok(())
}

fn handle_list(sevenrun: &SevenRun, args: &ListArgs) -> sevenrun::Result<()> {
    let listing = sevenrun.list(&args.archive)?;
    sevenrun
        .output_formatter()
        .print_listing(&args.archive, &listing);
    Ok(())
}

fn handle_count(sevenrun: &SevenRun, args: &CountArgs) -> sevenrun::Result<()> {
    let count = sevenrun.count(&args.archive, args.list_file.as_deref(), args.recurse)?;
    sevenrun.output_formatter().print_count(&args.archive, count);
    Ok(())
}

fn handle_exec(sevenrun: &SevenRun, args: &ExecArgs) -> sevenrun::Result<()> {
    sevenrun.exec(&args.args)
}

fn handle_generate_config(cli: &Cli) -> i32 {
    let config_path = cli
        .config
        .as_ref()
        .map(|p| p.to_string_lossy().to_string())
        .unwrap_or_else(|| "sevenrun.toml".to_string());

    match SevenRun::generate_sample_config(&config_path) {
        Ok(()) => {
            println!("Generated sample configuration file: {}", config_path);
            println!("\nTo use this configuration:");
            println!("  sevenrun --config {} <COMMAND>", config_path);
            println!("\nEdit the file to customize settings for your needs.");
            0
        }
        Err(e) => {
            eprintln!("Failed to generate configuration file: {}", e.user_message());
            if let Some(suggestion) = e.suggestion() {
                eprintln!("Suggestion: {}", suggestion);
            }
            1
        }
    }
}

/// 1 general, 2 configuration, 3 failed archive operation, 4 tool could not
/// be started, 5 archive missing.
fn exit_code_for(error: &SevenRunError) -> i32 {
    match error {
        SevenRunError::Config { .. } => 2,
        SevenRunError::Operation { .. } => 3,
        SevenRunError::ToolLaunch { .. } => 4,
        SevenRunError::ArchiveNotFound { .. } => 5,
        _ => 1,
    }
}

fn print_startup_error(error: &SevenRunError) {
    // Create a basic formatter for startup errors
    let formatter = OutputFormatter::new(OutputMode::Human, 0, false);
    formatter.print_user_friendly_error(error);
}

fn setup_logging(cli: &Cli) {
    let log_level = if cli.quiet {
        "sevenrun=error"
    } else {
        match cli.verbose {
            0 => "sevenrun=warn",
            1 => "sevenrun=info",
            2 => "sevenrun=debug",
            _ => "sevenrun=trace",
        }
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    fmt::Subscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_generate_config_command() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test.toml");

        let cli = Cli::try_parse_from([
            "sevenrun",
            "--generate-config",
            "--config",
            config_path.to_str().unwrap(),
        ])
        .unwrap();

        let exit_code = handle_generate_config(&cli);
        assert_eq!(exit_code, 0);
        assert!(config_path.exists());

        let content = fs::read_to_string(&config_path).unwrap();
        assert!(content.contains("[tool]"));
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(
            exit_code_for(&SevenRunError::Config {
                message: "bad".to_string()
            }),
            2
        );
        assert_eq!(
            exit_code_for(&SevenRunError::operation("a.7z: Extraction failed:", Some(2), "")),
            3
        );
        assert_eq!(
            exit_code_for(&SevenRunError::ArchiveNotFound {
                path: "a.7z".to_string()
            }),
            5
        );
        assert_eq!(
            exit_code_for(&SevenRunError::InvalidPath {
                path: "x".to_string()
            }),
            1
        );
    }

    #[test]
    fn test_dry_run_compress() {
        let cli = Cli::try_parse_from([
            "sevenrun",
            "-q",
            "--output-format",
            "plain",
            "compress",
            "src",
            "out.7z",
            "--dry-run",
        ])
        .unwrap();
        let sevenrun = SevenRun::new(sevenrun::Config::default(), OutputMode::Plain, 0, true);

        let Some(Command::Compress(args)) = cli.command.as_ref() else {
            panic!("expected compress");
        };
        assert!(handle_compress(&sevenrun, args).is_ok());
        assert!(!std::path::Path::new("out.7z.tmp").exists());
    }
}
