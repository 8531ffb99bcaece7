//! Pipeline configuration

use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::parser::StageId;

/// Which stages to run
///
/// The canonical order is fixed; configuration can only leave stages out.
/// Leaving out a stage that another enabled stage depends on is rejected
/// when the pipeline is built.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub disabled_stages: Vec<StageId>,
}

impl PipelineConfig {
    /// Load configuration from a JSON file
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading pipeline config {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("parsing pipeline config {}", path.display()))
    }
}
