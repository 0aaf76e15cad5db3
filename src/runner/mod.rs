pub mod classifier;
pub mod progress;
pub mod report;
pub mod supervisor;

pub use classifier::{LineClassifier, LineKind, ListField, OperationKind};
pub use progress::{ProgressEvent, ProgressSink, RecordingProgress};
pub use report::RunOutcome;
pub use supervisor::{CapturedOutput, LaunchOptions, ProcessSupervisor};
