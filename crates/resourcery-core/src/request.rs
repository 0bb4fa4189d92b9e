use serde::{Deserialize, Serialize};

use crate::field::FieldSpec;

/// Optional pipeline stages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationFlags {
    #[serde(default)]
    pub factory_seeder: bool,
    #[serde(default)]
    pub view_page: bool,
}

/// Everything the pipeline needs to scaffold one entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    pub entity_name: String,
    pub fields: Vec<FieldSpec>,
    #[serde(default)]
    pub soft_deletes: bool,
    #[serde(default)]
    pub flags: GenerationFlags,
}

impl GenerationRequest {
    pub fn new(entity_name: impl Into<String>, fields: Vec<FieldSpec>) -> Self {
        Self {
            entity_name: entity_name.into(),
            fields,
            soft_deletes: false,
            flags: GenerationFlags::default(),
        }
    }

    pub fn with_soft_deletes(mut self, enabled: bool) -> Self {
        self.soft_deletes = enabled;
        self
    }

    pub fn with_flags(mut self, flags: GenerationFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Field schema in its wire form, as passed to out-of-process steps.
    pub fn fields_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.fields)
    }
}
