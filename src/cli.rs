use crate::archive::command::CompressRequest;
use crate::archive::operations::DEFAULT_MAX_NESTING;
use crate::config::{CliOverrides, Config};
use crate::error::{Result, SevenRunError};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "sevenrun")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Drive the 7-Zip command line tool")]
#[command(
    long_about = "sevenrun builds 7-Zip command lines, runs the tool, follows its console \
                  output for progress and turns the result into a clear success or failure."
)]
#[command(after_help = "EXAMPLES:\n  \
    sevenrun compress ./MyMod MyMod.7z --dest-dir ./dist\n  \
    sevenrun compress ./MyMod MyMod.zip --extra-args=-mx=9\n  \
    sevenrun extract MyMod.7z ./unpacked --recursive\n  \
    sevenrun list MyMod.7z --output-format json\n  \
    sevenrun count MyMod.7z --list-file names.txt --recurse\n  \
    sevenrun exec -- t MyMod.7z\n  \
    sevenrun --generate-config --config sevenrun.toml")]
#[command(arg_required_else_help = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Configuration file path
    #[arg(short, long, global = true, help = "Path to TOML configuration file")]
    pub config: Option<PathBuf>,

    /// 7-Zip executable to run
    #[arg(long, global = true, env = "SEVENRUN_TOOL")]
    pub tool: Option<String>,

    /// Output format for results
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Human)]
    pub output_format: OutputFormat,

    /// Verbose output level (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (suppress non-essential output)
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Generate sample configuration file
    #[arg(long, help = "Generate a sample configuration file")]
    pub generate_config: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Pack the contents of a directory into an archive
    Compress(CompressArgs),
    /// Unpack an archive into a directory
    Extract(ExtractArgs),
    /// Show the entries of an archive
    List(ListArgs),
    /// Count the files in an archive
    Count(CountArgs),
    /// Run the archive tool with the given arguments and print its output
    Exec(ExecArgs),
}

#[derive(Args, Debug)]
pub struct CompressArgs {
    /// Directory whose contents are archived
    pub src_dir: PathBuf,

    /// Archive to create; the extension selects the format (.7z or .zip)
    pub archive: PathBuf,

    /// Directory the archive is written to (defaults to the archive's parent)
    #[arg(long)]
    pub dest_dir: Option<PathBuf>,

    /// Create a non-solid archive
    #[arg(long)]
    pub no_solid: bool,

    /// Solid block size in MiB
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    pub block_size: Option<u32>,

    /// Extra 7-Zip switches; a -ms= switch here replaces the solid settings
    #[arg(long, allow_hyphen_values = true)]
    pub extra_args: Option<String>,

    /// Print the command line instead of running it
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Args, Debug)]
pub struct ExtractArgs {
    /// Archive to unpack
    pub archive: PathBuf,

    /// Output directory
    pub out_dir: PathBuf,

    /// Also unpack archives found inside the archive
    #[arg(short, long)]
    pub recursive: bool,

    /// How many levels of nested archives to unpack with --recursive
    #[arg(long, default_value_t = DEFAULT_MAX_NESTING)]
    pub max_depth: usize,

    /// Print the command line instead of running it
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Archive to list
    pub archive: PathBuf,
}

#[derive(Args, Debug)]
pub struct CountArgs {
    /// Archive to inspect
    pub archive: PathBuf,

    /// Only count files named in this list file
    #[arg(long)]
    pub list_file: Option<PathBuf>,

    /// Match names in subdirectories too
    #[arg(short, long)]
    pub recurse: bool,
}

#[derive(Args, Debug)]
pub struct ExecArgs {
    /// Arguments passed to the tool unchanged (put them after `--`)
    #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
    pub args: Vec<String>,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable colored output
    Human,
    /// JSON formatted output
    Json,
    /// Plain text output
    Plain,
}

impl Cli {
    pub fn load_config(&self) -> Result<Config> {
        let mut config = Config::load_with_defaults(self.config.as_ref())?;

        let overrides = self.create_cli_overrides();
        config.merge_with_cli_args(&overrides);
        config.validate()?;

        Ok(config)
    }

    pub fn create_cli_overrides(&self) -> CliOverrides {
        let overrides = CliOverrides::new().with_tool(self.tool.clone());

        match &self.command {
            Some(Command::Compress(args)) => overrides
                .with_extra_arguments(args.extra_args.clone())
                .with_solid(args.no_solid.then_some(false))
                .with_block_size(args.block_size),
            _ => overrides,
        }
    }

    pub fn verbosity_level(&self) -> u8 {
        if self.quiet {
            0
        } else {
            self.verbose
        }
    }
}

impl CompressArgs {
    /// Splits the archive argument into destination directory and file name.
    /// `--dest-dir` wins over a directory given as part of the archive path.
    pub fn to_request(&self, config: &Config) -> Result<CompressRequest> {
        let archive_name = self
            .archive
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .ok_or_else(|| SevenRunError::InvalidPath {
                path: self.archive.display().to_string(),
            })?;

        let dest_dir = match (&self.dest_dir, self.archive.parent()) {
            (Some(dest_dir), _) => dest_dir.clone(),
            (None, Some(parent)) if parent != Path::new("") => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };

        Ok(CompressRequest {
            dest_dir,
            archive_name,
            src_dir: self.src_dir.clone(),
            solid: config.compression.solid,
            block_size: config.compression.block_size,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn test_parse_compress() {
        let cli = parse(&[
            "sevenrun",
            "compress",
            "src",
            "out.7z",
            "--no-solid",
            "--block-size",
            "64",
            "--extra-args",
            "-mx=9",
        ]);

        match cli.command {
            Some(Command::Compress(ref args)) => {
                assert_eq!(args.src_dir, PathBuf::from("src"));
                assert_eq!(args.archive, PathBuf::from("out.7z"));
                assert!(args.no_solid);
                assert_eq!(args.block_size, Some(64));
                assert_eq!(args.extra_args.as_deref(), Some("-mx=9"));
                assert!(!args.dry_run);
            }
            ref other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_zero_block_size_is_rejected() {
        let result =
            Cli::try_parse_from(["sevenrun", "compress", "src", "out.7z", "--block-size", "0"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_global_options_after_subcommand() {
        let cli = parse(&["sevenrun", "count", "a.7z", "--tool", "/opt/7zz", "-vv"]);
        assert_eq!(cli.tool.as_deref(), Some("/opt/7zz"));
        assert_eq!(cli.verbosity_level(), 2);

        let quiet = parse(&["sevenrun", "-q", "count", "a.7z"]);
        assert_eq!(quiet.verbosity_level(), 0);
    }

    #[test]
    fn test_parse_exec() {
        let cli = parse(&["sevenrun", "--tool", "7zz", "exec", "--", "t", "-p", "mod.7z"]);
        match cli.command {
            Some(Command::Exec(ref args)) => assert_eq!(args.args, vec!["t", "-p", "mod.7z"]),
            ref other => panic!("unexpected command: {:?}", other),
        }
        assert!(Cli::try_parse_from(["sevenrun", "exec"]).is_err());
    }

    #[test]
    fn test_quiet_conflicts_with_verbose() {
        let result = Cli::try_parse_from(["sevenrun", "-q", "-v", "list", "a.7z"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_extract_defaults() {
        let cli = parse(&["sevenrun", "extract", "a.7z", "out"]);
        match cli.command {
            Some(Command::Extract(args)) => {
                assert!(!args.recursive);
                assert_eq!(args.max_depth, DEFAULT_MAX_NESTING);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_cli_overrides_from_compress() {
        let cli = parse(&[
            "sevenrun",
            "--tool",
            "7zz",
            "compress",
            "src",
            "out.7z",
            "--no-solid",
        ]);
        let overrides = cli.create_cli_overrides();
        assert_eq!(overrides.tool.as_deref(), Some("7zz"));
        assert_eq!(overrides.solid, Some(false));
        assert_eq!(overrides.block_size, None);

        let cli = parse(&["sevenrun", "compress", "src", "out.7z"]);
        assert_eq!(cli.create_cli_overrides().solid, None);
    }

    #[test]
    fn test_compress_request_paths() {
        let config = Config::default();

        let cli = parse(&["sevenrun", "compress", "src", "dist/out.7z"]);
        let Some(Command::Compress(args)) = cli.command else {
            panic!("expected compress");
        };
        let request = args.to_request(&config).unwrap();
        assert_eq!(request.dest_dir, PathBuf::from("dist"));
        assert_eq!(request.archive_name, "out.7z");
        assert!(request.solid);

        let cli = parse(&["sevenrun", "compress", "src", "out.zip"]);
        let Some(Command::Compress(args)) = cli.command else {
            panic!("expected compress");
        };
        assert_eq!(args.to_request(&config).unwrap().dest_dir, PathBuf::from("."));

        let cli = parse(&[
            "sevenrun",
            "compress",
            "src",
            "dist/out.7z",
            "--dest-dir",
            "release",
        ]);
        let Some(Command::Compress(args)) = cli.command else {
            panic!("expected compress");
        };
        assert_eq!(
            args.to_request(&config).unwrap().dest_dir,
            PathBuf::from("release")
        );
    }

    #[test]
    fn test_generate_config_without_subcommand() {
        let cli = parse(&["sevenrun", "--generate-config"]);
        assert!(cli.generate_config);
        assert!(cli.command.is_none());
    }
}
