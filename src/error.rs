use thiserror::Error;

#[derive(Error, Debug)]
pub enum SevenRunError {
    /// The archive tool ran but the run was classified as failed: nonzero
    /// exit code, an error line in its output, or missing expected output.
    #[error("{message}")]
    Operation {
        message: String,
        return_code: Option<i32>,
        output: String,
    },

    #[error("Failed to launch {tool}: {source}")]
    ToolLaunch {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    #[error("IO operation failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Path validation failed: {path}")]
    InvalidPath { path: String },

    #[error("Archive not found: {path}")]
    ArchiveNotFound { path: String },
}

impl SevenRunError {
    pub fn operation(
        message: impl Into<String>,
        return_code: Option<i32>,
        output: impl Into<String>,
    ) -> Self {
        SevenRunError::Operation {
            message: message.into(),
            return_code,
            output: output.into(),
        }
    }

    /// Exit code reported by the tool, when the error came from a finished run.
    pub fn return_code(&self) -> Option<i32> {
        match self {
            SevenRunError::Operation { return_code, .. } => *return_code,
            _ => None,
        }
    }
}

pub trait UserFriendlyError {
    fn user_message(&self) -> String;
    fn suggestion(&self) -> Option<String>;
}

impl UserFriendlyError for SevenRunError {
    fn user_message(&self) -> String {
        match self {
            SevenRunError::Operation { message, .. } => message.clone(),
            SevenRunError::ToolLaunch { tool, source } => {
                format!("Could not start archive tool '{}': {}", tool, source)
            }
            SevenRunError::Config { message } => {
                format!("Configuration error: {}", message)
            }
            SevenRunError::InvalidPath { path } => {
                format!("Invalid file path: {}", path)
            }
            SevenRunError::ArchiveNotFound { path } => {
                format!("Archive does not exist: {}", path)
            }
            _ => self.to_string(),
        }
    }

    fn suggestion(&self) -> Option<String> {
        match self {
            SevenRunError::ToolLaunch { .. } => Some(
                "Install 7-Zip (or p7zip) and make sure it is on PATH, or point to it with --tool or [tool] executable in sevenrun.toml.".to_string()
            ),
            SevenRunError::Config { .. } => Some(
                "Check your configuration file syntax and ensure all required fields are present.".to_string()
            ),
            SevenRunError::ArchiveNotFound { .. } => Some(
                "Check the archive path for typos.".to_string()
            ),
            SevenRunError::Operation { return_code: Some(2), .. } => Some(
                "7-Zip reported a fatal error. The archive may be corrupt or the destination may be out of space.".to_string()
            ),
            SevenRunError::Operation { return_code: Some(7), .. } => Some(
                "7-Zip rejected the command line. Check the extra compression arguments.".to_string()
            ),
            SevenRunError::Operation { return_code: Some(8), .. } => Some(
                "7-Zip ran out of memory. Try a smaller solid block size.".to_string()
            ),
            _ => None,
        }
    }
}

impl From<toml::de::Error> for SevenRunError {
    fn from(error: toml::de::Error) -> Self {
        SevenRunError::Config {
            message: error.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, SevenRunError>;
