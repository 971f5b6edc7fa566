mod reader;
mod variant;

pub use reader::{parse_count, SourceTable};
pub use variant::FeedVariant;
