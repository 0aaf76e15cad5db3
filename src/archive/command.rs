use crate::archive::formats::CompressionSettings;
use crate::archive::staging::StagedFile;
use crate::error::Result;
use std::fmt;
use std::path::{Path, PathBuf, MAIN_SEPARATOR};

/// Switches that make 7-Zip read file names and write its console output as UTF-8.
const CHARSET_SWITCHES: [&str; 2] = ["-scsUTF-8", "-sccUTF-8"];

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Plain(String),
    /// Rendered as `prefix"value"`, passed to the process as `prefixvalue`.
    Quoted { prefix: &'static str, value: String },
}

impl Token {
    fn plain<S: Into<String>>(value: S) -> Self {
        Token::Plain(value.into())
    }

    fn quoted<S: Into<String>>(prefix: &'static str, value: S) -> Self {
        Token::Quoted {
            prefix,
            value: value.into(),
        }
    }

    fn argument(&self) -> String {
        match self {
            Token::Plain(value) => value.clone(),
            Token::Quoted { prefix, value } => format!("{}{}", prefix, value),
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Plain(value) => write!(f, "{}", value),
            Token::Quoted { prefix, value } => write!(f, "{}\"{}\"", prefix, value),
        }
    }
}

/// A fully built archive tool invocation.
///
/// `Display` renders the command the way it would be typed in a console;
/// [`CommandLine::arguments`] gives the argv handed to the process, without
/// the console quoting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    program: String,
    quote_program: bool,
    tokens: Vec<Token>,
}

impl CommandLine {
    fn new<S: Into<String>>(program: S, quote_program: bool) -> Self {
        Self {
            program: program.into(),
            quote_program,
            tokens: Vec::new(),
        }
    }

    /// An ad-hoc invocation: every argument passed through verbatim.
    pub fn from_args<S, I>(program: S, args: I) -> Self
    where
        S: Into<String>,
        I: IntoIterator,
        I::Item: Into<String>,
    {
        let mut command = Self::new(program, false);
        command.tokens = args.into_iter().map(Token::plain).collect();
        command
    }

    fn push(&mut self, token: Token) -> &mut Self {
        self.tokens.push(token);
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn arguments(&self) -> Vec<String> {
        self.tokens.iter().map(Token::argument).collect()
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.quote_program {
            write!(f, "\"{}\"", self.program)?;
        } else {
            write!(f, "{}", self.program)?;
        }
        for token in &self.tokens {
            write!(f, " {}", token)?;
        }
        Ok(())
    }
}

/// Parameters of a compress run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompressRequest {
    pub dest_dir: PathBuf,
    pub archive_name: String,
    pub src_dir: PathBuf,
    pub solid: bool,
    pub block_size: Option<u32>,
}

/// Everything a compress run needs: the resolved settings, where the archive
/// is staged and the command that writes it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompressPlan {
    pub settings: CompressionSettings,
    pub staged: StagedFile,
    pub command: CommandLine,
}

#[derive(Debug, Clone)]
pub struct CommandBuilder {
    tool: String,
    extra_arguments: String,
}

impl CommandBuilder {
    pub fn new<S: Into<String>>(tool: S) -> Self {
        Self {
            tool: tool.into(),
            extra_arguments: String::new(),
        }
    }

    /// User arguments merged into the solid switches of every compress command.
    pub fn with_extra_arguments<S: Into<String>>(mut self, extra_arguments: S) -> Self {
        self.extra_arguments = extra_arguments.into();
        self
    }

    pub fn tool(&self) -> &str {
        &self.tool
    }

    /// `<tool> a <temp archive> -t<format> [solid] -y -r -o"<dest>" -scsUTF-8 -sccUTF-8 "<src>/*"`
    pub fn compress(&self, request: &CompressRequest) -> Result<CompressPlan> {
        let settings = CompressionSettings::resolve(
            &request.archive_name,
            request.block_size,
            request.solid,
            &self.extra_arguments,
        );
        let staged = StagedFile::new(request.dest_dir.join(&settings.archive_name))?;

        let mut command = CommandLine::new(self.tool.as_str(), false);
        command
            .push(Token::plain("a"))
            .push(Token::plain(display(staged.temp_path())))
            .push(Token::plain(format!("-t{}", settings.format.type_name())));
        for switch in settings.solid_tokens() {
            command.push(Token::Plain(switch));
        }
        command
            .push(Token::plain("-y"))
            .push(Token::plain("-r"))
            .push(Token::quoted("-o", display(&request.dest_dir)));
        push_charset(&mut command);
        command.push(Token::quoted(
            "",
            format!("{}{}*", display(&request.src_dir), MAIN_SEPARATOR),
        ));

        Ok(CompressPlan {
            settings,
            staged,
            command,
        })
    }

    /// `"<tool>" x "<archive>" -y -bb1 -o"<out>" -scsUTF-8 -sccUTF-8`
    pub fn extract(&self, archive: &Path, out_dir: &Path) -> CommandLine {
        let mut command = CommandLine::new(self.tool.as_str(), true);
        command
            .push(Token::plain("x"))
            .push(Token::quoted("", display(archive)))
            .push(Token::plain("-y"))
            .push(Token::plain("-bb1"))
            .push(Token::quoted("-o", display(out_dir)));
        push_charset(&mut command);
        command
    }

    /// `<tool> l -scsUTF-8 -sccUTF-8 <archive> [@<list file>] [-r]`
    pub fn count(&self, archive: &Path, list_file: Option<&Path>, recurse: bool) -> CommandLine {
        let mut command = CommandLine::new(self.tool.as_str(), false);
        command.push(Token::plain("l"));
        push_charset(&mut command);
        command.push(Token::plain(display(archive)));
        if let Some(list_file) = list_file {
            command.push(Token::plain(format!("@{}", display(list_file))));
        }
        if recurse {
            command.push(Token::plain("-r"));
        }
        command
    }

    /// `"<tool>" l -slt -sccUTF-8 "<archive>"`
    pub fn detailed_list(&self, archive: &Path) -> CommandLine {
        let mut command = CommandLine::new(self.tool.as_str(), true);
        command
            .push(Token::plain("l"))
            .push(Token::plain("-slt"))
            .push(Token::plain("-sccUTF-8"))
            .push(Token::quoted("", display(archive)));
        command
    }
}

fn push_charset(command: &mut CommandLine) {
    for switch in CHARSET_SWITCHES {
        command.push(Token::plain(switch));
    }
}

fn display(path: &Path) -> String {
    path.display().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::formats::ArchiveFormat;

    fn request(archive_name: &str, solid: bool) -> CompressRequest {
        CompressRequest {
            dest_dir: PathBuf::from("out"),
            archive_name: archive_name.to_string(),
            src_dir: PathBuf::from("src"),
            solid,
            block_size: None,
        }
    }

    #[test]
    fn test_compress_command_7z() {
        let builder = CommandBuilder::new("7z");
        let plan = builder.compress(&request("mod.7z", true)).unwrap();

        let expected = format!(
            "7z a {} -t7z -ms=on -y -r -o\"out\" -scsUTF-8 -sccUTF-8 \"src{}*\"",
            Path::new("out").join("mod.7z.tmp").display(),
            MAIN_SEPARATOR
        );
        assert_eq!(plan.command.to_string(), expected);
        assert_eq!(plan.staged.target_path(), Path::new("out").join("mod.7z"));

        let args = plan.command.arguments();
        assert_eq!(plan.command.program(), "7z");
        assert!(args.contains(&"-oout".to_string()));
        assert_eq!(args.last().unwrap(), &format!("src{}*", MAIN_SEPARATOR));
    }

    #[test]
    fn test_format_switch_matches_extension() {
        let builder = CommandBuilder::new("7z");
        for format in ArchiveFormat::WRITABLE {
            for solid in [true, false] {
                let name = format!("pkg{}", format.extension());
                let plan = builder.compress(&request(&name, solid)).unwrap();
                let args = plan.command.arguments();
                assert!(args.contains(&format!("-t{}", format.type_name())));
                if !format.supports_solid() {
                    assert!(!args.iter().any(|a| a.starts_with("-ms")), "{:?}", args);
                }
            }
        }
    }

    #[test]
    fn test_zip_strips_solid_from_extra_arguments() {
        let builder = CommandBuilder::new("7z").with_extra_arguments("-ms=on -mx=9");
        let plan = builder.compress(&request("pkg.zip", true)).unwrap();
        let args = plan.command.arguments();
        assert!(!args.iter().any(|a| a.starts_with("-ms")));
        assert!(args.contains(&"-mx=9".to_string()));
    }

    #[test]
    fn test_unknown_extension_uses_default() {
        let builder = CommandBuilder::new("7z");
        let plan = builder.compress(&request("pkg.tar", false)).unwrap();
        assert_eq!(plan.settings.archive_name, "pkg.7z");
        assert!(plan.command.arguments().contains(&"-t7z".to_string()));
        assert!(plan.command.arguments().contains(&"-ms=off".to_string()));
    }

    #[test]
    fn test_building_is_deterministic() {
        let builder = CommandBuilder::new("7z").with_extra_arguments("-mx=9 -mmt=2");
        let first = builder.compress(&request("a.7z", true)).unwrap();
        let second = builder.compress(&request("a.7z", true)).unwrap();
        assert_eq!(first.command.to_string(), second.command.to_string());
        assert_eq!(first, second);

        let archive = Path::new("a.7z");
        assert_eq!(
            builder.extract(archive, Path::new("x")).to_string(),
            builder.extract(archive, Path::new("x")).to_string()
        );
    }

    #[test]
    fn test_extract_command() {
        let builder = CommandBuilder::new("7z");
        let command = builder.extract(Path::new("in.7z"), Path::new("unpacked"));
        assert_eq!(
            command.to_string(),
            "\"7z\" x \"in.7z\" -y -bb1 -o\"unpacked\" -scsUTF-8 -sccUTF-8"
        );
        assert_eq!(
            command.arguments(),
            vec!["x", "in.7z", "-y", "-bb1", "-ounpacked", "-scsUTF-8", "-sccUTF-8"]
        );
    }

    #[test]
    fn test_count_command() {
        let builder = CommandBuilder::new("7z");
        let archive = Path::new("in.7z");
        assert_eq!(
            builder.count(archive, None, false).to_string(),
            "7z l -scsUTF-8 -sccUTF-8 in.7z"
        );
        assert_eq!(
            builder.count(archive, Some(Path::new("files.txt")), true).to_string(),
            "7z l -scsUTF-8 -sccUTF-8 in.7z @files.txt -r"
        );
    }

    #[test]
    fn test_detailed_list_command() {
        let builder = CommandBuilder::new("7z");
        let command = builder.detailed_list(Path::new("in.7z"));
        assert_eq!(command.to_string(), "\"7z\" l -slt -sccUTF-8 \"in.7z\"");
        assert_eq!(command.arguments(), vec!["l", "-slt", "-sccUTF-8", "in.7z"]);
    }

    #[test]
    fn test_from_args() {
        let command = CommandLine::from_args("sh", ["-c", "exit 0"]);
        assert_eq!(command.program(), "sh");
        assert_eq!(command.arguments(), vec!["-c", "exit 0"]);
    }
}
