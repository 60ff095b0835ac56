use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineDiag {
    pub engine: String,
    pub version: Option<String>,
    pub ok: bool,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractIn {
    pub input_pdf: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractOut {
    pub ok: bool,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub page_count: u32,
    #[serde(default)]
    pub warnings: Vec<String>,
    #[serde(default)]
    pub error: Option<String>,
}
