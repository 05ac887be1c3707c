pub mod ingestion;
pub mod metadata;

pub use ingestion::{IngestionError, IngestionOutcome, IngestionPipeline};
pub use metadata::{MetadataKeys, MetadataWriter};
