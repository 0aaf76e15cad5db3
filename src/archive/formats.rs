use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;
use tracing::debug;

/// Extension used when the requested archive name has no writable format.
pub const DEFAULT_EXTENSION: &str = ".7z";

/// Extensions that can be unpacked but not written.
pub const READ_ONLY_EXTENSIONS: &[&str] = &[".rar", ".7z.001", ".001"];

/// Extensions whose format rejects 7-Zip's solid switches.
pub const NO_SOLID_EXTENSIONS: &[&str] = &[".zip"];

static SOLID_SWITCH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)[-/]ms=[^\s]+").expect("valid solid switch regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    SevenZip,
    Zip,
}

impl ArchiveFormat {
    pub const WRITABLE: &'static [ArchiveFormat] = &[ArchiveFormat::SevenZip, ArchiveFormat::Zip];

    pub fn extension(self) -> &'static str {
        match self {
            ArchiveFormat::SevenZip => ".7z",
            ArchiveFormat::Zip => ".zip",
        }
    }

    /// Value of the `-t` switch.
    pub fn type_name(self) -> &'static str {
        match self {
            ArchiveFormat::SevenZip => "7z",
            ArchiveFormat::Zip => "zip",
        }
    }

    pub fn supports_solid(self) -> bool {
        !NO_SOLID_EXTENSIONS.contains(&self.extension())
    }

    pub fn from_extension(extension: &str) -> Option<Self> {
        let extension = extension.to_lowercase();
        Self::WRITABLE
            .iter()
            .copied()
            .find(|format| format.extension() == extension)
    }

    pub fn default_format() -> Self {
        Self::from_extension(DEFAULT_EXTENSION).unwrap_or(ArchiveFormat::SevenZip)
    }
}

/// Lowercased last extension of `name`, dot included (`"Foo.ZIP"` -> `".zip"`).
pub fn extension_of(name: &str) -> String {
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e.to_lowercase()))
        .unwrap_or_default()
}

/// Every extension that extraction may recurse into, writable ones first.
pub fn readable_extensions() -> Vec<String> {
    ArchiveFormat::WRITABLE
        .iter()
        .map(|f| f.extension())
        .chain(READ_ONLY_EXTENSIONS.iter().copied())
        .map(str::to_string)
        .collect()
}

/// True when the file name ends with one of `extensions`, compound ones such
/// as `.7z.001` included. Comparison ignores case.
pub fn has_extension_in(path: &Path, extensions: &[String]) -> bool {
    let name = match path.file_name().and_then(|n| n.to_str()) {
        Some(name) => name.to_lowercase(),
        None => return false,
    };
    extensions
        .iter()
        .any(|ext| name.len() > ext.len() && name.ends_with(&ext.to_lowercase()))
}

/// Archive name, format and solid switches resolved for a compress run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompressionSettings {
    pub archive_name: String,
    pub format: ArchiveFormat,
    pub solid: String,
}

impl CompressionSettings {
    /// Resolves what will actually be passed to the tool.
    ///
    /// Unknown extensions fall back to [`DEFAULT_EXTENSION`]. Formats that
    /// forbid solid archives get no solid switch at all, and any solid switch
    /// inside `extra_arguments` is stripped for them. Otherwise a solid switch
    /// in `extra_arguments` replaces the computed one.
    pub fn resolve(
        archive_name: &str,
        block_size: Option<u32>,
        is_solid: bool,
        extra_arguments: &str,
    ) -> Self {
        let (archive_name, format) = match ArchiveFormat::from_extension(&extension_of(archive_name)) {
            Some(format) => (archive_name.to_string(), format),
            None => {
                let format = ArchiveFormat::default_format();
                let stem = Path::new(archive_name)
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .unwrap_or(archive_name);
                (format!("{}{}", stem, format.extension()), format)
            }
        };

        let mut solid = if !format.supports_solid() {
            String::new()
        } else if is_solid {
            match block_size {
                Some(size) => format!("-ms=on -ms={}m", size),
                None => "-ms=on".to_string(),
            }
        } else {
            "-ms=off".to_string()
        };

        let user_args = extra_arguments.trim();
        if !user_args.is_empty() {
            let has_solid_switch = SOLID_SWITCH.is_match(user_args);
            if has_solid_switch && solid.is_empty() {
                let stripped = SOLID_SWITCH.replace_all(user_args, "");
                let stripped = stripped.split_whitespace().collect::<Vec<_>>().join(" ");
                debug!(
                    archive = %archive_name,
                    "extra compression arguments \"{}\" -> \"{}\"",
                    user_args,
                    stripped
                );
                solid = stripped;
            } else if has_solid_switch || solid.is_empty() {
                solid = user_args.to_string();
            } else {
                solid = format!("{} {}", solid, user_args);
            }
        }

        Self {
            archive_name,
            format,
            solid,
        }
    }

    /// Solid switches split into separate argv tokens.
    pub fn solid_tokens(&self) -> Vec<String> {
        self.solid.split_whitespace().map(str::to_string).collect()
    }
}
