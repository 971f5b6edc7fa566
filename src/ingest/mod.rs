mod engine;
mod normalizer;

pub use engine::{ingest, IngestSummary, SourceSet};
