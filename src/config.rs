use crate::error::{Result, SevenRunError};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub tool: ToolConfig,
    #[serde(default)]
    pub compression: CompressionConfig,
    #[serde(default)]
    pub labels: ProgressLabels,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ToolConfig {
    pub executable: String,
    pub hide_console: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CompressionConfig {
    /// Appended to (or, when it carries `-ms=`, replacing) the solid switches.
    pub extra_arguments: String,
    pub solid: bool,
    /// Solid block size in MiB.
    pub block_size: Option<u32>,
}

/// User-facing progress texts.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ProgressLabels {
    pub compressing: String,
    pub extracting: String,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            executable: if cfg!(windows) { "7z.exe" } else { "7z" }.to_string(),
            hide_console: true,
        }
    }
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self {
            extra_arguments: String::new(),
            solid: true,
            block_size: None,
        }
    }
}

impl Default for ProgressLabels {
    fn default() -> Self {
        Self {
            compressing: "Compressing files...".to_string(),
            extracting: "Extracting files...".to_string(),
        }
    }
}

impl Config {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(SevenRunError::Config {
                message: format!("Configuration file not found: {}", path.display()),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| SevenRunError::Config {
            message: format!("Failed to read config file {}: {}", path.display(), e),
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| SevenRunError::Config {
            message: format!("Failed to parse config file {}: {}", path.display(), e),
        })?;

        Ok(config)
    }

    pub fn load_with_defaults<P: AsRef<Path>>(config_path: Option<P>) -> Result<Self> {
        match config_path {
            Some(path) => Self::load_from_file(path),
            None => {
                let default_paths = ["sevenrun.toml", ".sevenrun.toml"];

                for default_path in &default_paths {
                    if Path::new(default_path).exists() {
                        return Self::load_from_file(default_path);
                    }
                }

                Ok(Self::default())
            }
        }
    }

    pub fn merge_with_cli_args(&mut self, cli_args: &CliOverrides) {
        if let Some(ref tool) = cli_args.tool {
            self.tool.executable = tool.clone();
        }

        if let Some(ref extra) = cli_args.extra_arguments {
            self.compression.extra_arguments = extra.clone();
        }

        if let Some(solid) = cli_args.solid {
            self.compression.solid = solid;
        }

        if let Some(block_size) = cli_args.block_size {
            self.compression.block_size = Some(block_size);
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.tool.executable.trim().is_empty() {
            return Err(SevenRunError::Config {
                message: "The archive tool executable must not be empty".to_string(),
            });
        }

        if self.compression.block_size == Some(0) {
            return Err(SevenRunError::Config {
                message: "Solid block size must be greater than 0".to_string(),
            });
        }

        Ok(())
    }

    pub fn create_sample_config() -> String {
        let sample_config = Self::default();
        toml::to_string_pretty(&sample_config).unwrap_or_else(|_| String::new())
    }
}

#[derive(Debug, Default)]
pub struct CliOverrides {
    pub tool: Option<String>,
    pub extra_arguments: Option<String>,
    pub solid: Option<bool>,
    pub block_size: Option<u32>,
}

impl CliOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tool(mut self, tool: Option<String>) -> Self {
        self.tool = tool;
        self
    }

    pub fn with_extra_arguments(mut self, extra_arguments: Option<String>) -> Self {
        self.extra_arguments = extra_arguments;
        self
    }

    pub fn with_solid(mut self, solid: Option<bool>) -> Self {
        self.solid = solid;
        self
    }

    pub fn with_block_size(mut self, block_size: Option<u32>) -> Self {
        self.block_size = block_size;
        self
    }
}
