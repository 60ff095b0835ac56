pub mod memory;
pub mod python;
pub mod types;

use anyhow::Result;
use std::path::Path;

pub use memory::MemoryEngine;
pub use types::{EngineDiag, ExtractIn, ExtractOut};

/// Document-to-text conversion. Implementations return the raw text of one
/// document; an empty string means the document had no text layer.
pub trait Engine {
    fn doctor(&self) -> Result<EngineDiag>;
    fn extract_text(&self, input: &Path) -> Result<String>;
}
