use super::{Engine, EngineDiag};
use anyhow::{Result, anyhow};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Text already extracted elsewhere, keyed by document path.
#[derive(Debug, Clone, Default)]
pub struct MemoryEngine {
    texts: BTreeMap<PathBuf, String>,
}

impl MemoryEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<PathBuf>, text: impl Into<String>) {
        self.texts.insert(path.into(), text.into());
    }
}

impl<P: Into<PathBuf>, S: Into<String>> FromIterator<(P, S)> for MemoryEngine {
    fn from_iter<I: IntoIterator<Item = (P, S)>>(iter: I) -> Self {
        let mut engine = MemoryEngine::new();
        for (p, s) in iter {
            engine.insert(p, s);
        }
        engine
    }
}

impl Engine for MemoryEngine {
    fn doctor(&self) -> Result<EngineDiag> {
        Ok(EngineDiag {
            engine: "memory".into(),
            version: None,
            ok: true,
            error: None,
        })
    }

    fn extract_text(&self, input: &Path) -> Result<String> {
        self.texts
            .get(input)
            .cloned()
            .ok_or_else(|| anyhow!("no text registered for {}", input.display()))
    }
}
