pub mod command;
pub mod formats;
pub mod listing;
pub mod operations;
pub mod staging;

pub use command::{CommandBuilder, CommandLine, CompressPlan, CompressRequest};
pub use formats::{ArchiveFormat, CompressionSettings};
pub use listing::{ArchiveEntry, ArchiveListing, ListingCollector};
pub use operations::{ArchiveTool, DEFAULT_MAX_NESTING};
pub use staging::StagedFile;
