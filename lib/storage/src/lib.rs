pub mod builder;
pub mod context;
pub mod index_store;
pub mod ingest;
pub mod metadata;
pub mod registry;

pub use builder::{BuildReport, IndexBuilder};
pub use context::{ContextConfig, ContextHandle, ContextInfo, ServiceContext};
pub use index_store::{IndexHeader, SyllabusIndex, INDEX_FILE, METADATA_FILE};
pub use ingest::{stored_file_name, Ingested, Ingestor, UpdateReport, RAW_DIR};
pub use metadata::{ProgramMetadata, ProgramMetadataStore, ProgramRecord, PROGRAM_METADATA_FILE};
pub use registry::{ActiveConflict, RegisterOutcome, Registry, RegistryEntry};

/// Registry file name inside the data directory
pub const REGISTRY_FILE: &str = "registry.json";
