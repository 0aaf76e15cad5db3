use crate::error::{Result, SevenRunError};
use crate::runner::classifier::OperationKind;
use regex::Regex;
use std::sync::LazyLock;
use tracing::warn;

static FILE_COUNT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+)\s+files(?:,\s+\d+\s+folders)?").expect("valid file count regex")
});

/// Terminal state of one archive tool run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutcome {
    /// `None` when the process was terminated by a signal.
    pub return_code: Option<i32>,
    /// The first error line and everything the tool printed after it.
    pub error_text: String,
    /// Last non-blank line of output, line terminator removed.
    pub last_line: String,
}

impl RunOutcome {
    /// A run failed if the tool says so or if it printed an error line, even
    /// with a zero exit code.
    pub fn is_failure(&self) -> bool {
        self.return_code != Some(0) || !self.error_text.is_empty()
    }

    /// Turns a failed run into [`SevenRunError::Operation`].
    pub fn into_result(self, target: &str, operation: OperationKind) -> Result<Self> {
        if !self.is_failure() {
            return Ok(self);
        }

        let message = format!(
            "{}\n{}",
            failure_header(target, operation),
            describe_return_code(self.return_code)
        );
        let message = if self.error_text.is_empty() {
            message
        } else {
            format!("{}\n{}", message, self.error_text.trim_end())
        };
        warn!(archive = %target, operation = %operation, "{}", message);

        Err(SevenRunError::Operation {
            message,
            return_code: self.return_code,
            output: self.error_text,
        })
    }

    /// File count from the summary line of a `7z l` run.
    pub fn file_count(&self, target: &str) -> Result<u64> {
        if self.last_line.is_empty() {
            return Err(SevenRunError::Operation {
                message: count_failure(target, "Empty output"),
                return_code: self.return_code,
                output: String::new(),
            });
        }

        parse_file_count(&self.last_line).ok_or_else(|| SevenRunError::Operation {
            message: count_failure(
                target,
                &format!("No file count summary in output: {}", self.last_line),
            ),
            return_code: self.return_code,
            output: self.last_line.clone(),
        })
    }
}

fn failure_header(target: &str, operation: OperationKind) -> String {
    format!("{}: {} failed:", target, operation.failure_noun())
}

/// Count failures are reported without the colon the tool-failure header carries.
fn count_failure(target: &str, detail: &str) -> String {
    format!("{}: {} failed\n{}", target, OperationKind::Count.failure_noun(), detail)
}

pub(crate) fn describe_return_code(return_code: Option<i32>) -> String {
    match return_code {
        Some(code) => format!("7z return value: {}", code),
        None => "7z return value: terminated by signal".to_string(),
    }
}

/// Parses `"<size> <packed>  <N> files[, <M> folders]"` and returns `N`.
pub fn parse_file_count(summary: &str) -> Option<u64> {
    FILE_COUNT
        .captures(summary)
        .and_then(|captures| captures.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(return_code: Option<i32>, error_text: &str, last_line: &str) -> RunOutcome {
        RunOutcome {
            return_code,
            error_text: error_text.to_string(),
            last_line: last_line.to_string(),
        }
    }

    #[test]
    fn test_parse_file_count() {
        assert_eq!(
            parse_file_count("                    3534900       325332  75 files, 29 folders"),
            Some(75)
        );
        assert_eq!(parse_file_count("    3534900       325332  75 files"), Some(75));
        assert_eq!(parse_file_count("  1 files, 0 folders"), Some(1));
        assert_eq!(parse_file_count("Everything is Ok"), None);
        assert_eq!(parse_file_count(""), None);
    }

    #[test]
    fn test_success_passes_through() {
        let result = outcome(Some(0), "", "ok").into_result("a.7z", OperationKind::Compress);
        assert_eq!(result.unwrap().last_line, "ok");
    }

    #[test]
    fn test_nonzero_exit_is_failure() {
        let err = outcome(Some(2), "", "")
            .into_result("a.7z", OperationKind::Extract)
            .unwrap_err();
        assert_eq!(err.to_string(), "a.7z: Extraction failed:\n7z return value: 2");
        assert_eq!(err.return_code(), Some(2));
    }

    #[test]
    fn test_error_text_with_zero_exit_is_failure() {
        let err = outcome(Some(0), "Error: disk full\n", "")
            .into_result("a.7z", OperationKind::Compress)
            .unwrap_err();
        match err {
            SevenRunError::Operation {
                message,
                return_code,
                output,
            } => {
                assert_eq!(
                    message,
                    "a.7z: Compression failed:\n7z return value: 0\nError: disk full"
                );
                assert_eq!(return_code, Some(0));
                assert_eq!(output, "Error: disk full\n");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_signal_termination_is_failure() {
        let outcome = outcome(None, "", "");
        assert!(outcome.is_failure());
        let err = outcome.into_result("a.7z", OperationKind::List).unwrap_err();
        assert!(err.to_string().contains("terminated by signal"));
    }

    #[test]
    fn test_file_count() {
        let count = outcome(Some(0), "", "    3534900       325332  75 files, 29 folders")
            .file_count("a.7z")
            .unwrap();
        assert_eq!(count, 75);
    }

    #[test]
    fn test_file_count_empty_output() {
        let err = outcome(Some(0), "", "").file_count("a.7z").unwrap_err();
        assert_eq!(err.to_string(), "a.7z: Listing failed\nEmpty output");
    }

    #[test]
    fn test_file_count_missing_summary() {
        let err = outcome(Some(0), "", "Everything is Ok")
            .file_count("a.7z")
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "a.7z: Listing failed\nNo file count summary in output: Everything is Ok"
        );
        assert_eq!(err.return_code(), Some(0));
    }
}
