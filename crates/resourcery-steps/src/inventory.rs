use std::collections::BTreeSet;
use std::io;

use serde::Serialize;

use crate::layout::ProjectLayout;

/// Model excluded from policy generation.
const USER_MODEL: &str = "User";

/// Which models already have an authorization policy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PolicyInventory {
    /// Models with a policy, in name order.
    pub with_policy: Vec<String>,
    /// Models that can still get a policy, in name order.
    pub available: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PolicyStats {
    pub total: usize,
    pub with_policy: usize,
    pub without_policy: usize,
}

impl PolicyInventory {
    pub fn stats(&self) -> PolicyStats {
        PolicyStats {
            total: self.with_policy.len() + self.available.len(),
            with_policy: self.with_policy.len(),
            without_policy: self.available.len(),
        }
    }

    pub fn has_policy(&self, model: &str) -> bool {
        self.with_policy.iter().any(|name| name == model)
    }
}

/// Scan `app/Models` and `app/Policies`. A missing models directory is an
/// empty inventory.
pub fn scan_policy_inventory(layout: &ProjectLayout) -> io::Result<PolicyInventory> {
    let entries = match std::fs::read_dir(layout.models_dir()) {
        Ok(entries) => entries,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(PolicyInventory::default()),
        Err(err) => return Err(err),
    };

    let mut models = BTreeSet::new();
    for entry in entries {
        let path = entry?.path();
        if !path.is_file() || path.extension().and_then(|ext| ext.to_str()) != Some("php") {
            continue;
        }
        if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
            if stem != USER_MODEL {
                models.insert(stem.to_string());
            }
        }
    }

    let mut inventory = PolicyInventory::default();
    for model in models {
        if layout.policy_path(&model).is_file() {
            inventory.with_policy.push(model);
        } else {
            inventory.available.push(model);
        }
    }
    Ok(inventory)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_model_is_excluded() {
        let dir = tempfile::tempdir().expect("tempdir");
        let layout = ProjectLayout::new(dir.path());
        std::fs::create_dir_all(layout.models_dir()).expect("models dir");
        std::fs::create_dir_all(layout.policies_dir()).expect("policies dir");
        for model in ["User", "Post", "Tag"] {
            std::fs::write(layout.model_path(model), "<?php").expect("write model");
        }
        std::fs::write(layout.policy_path("Post"), "<?php").expect("write policy");

        let inventory = scan_policy_inventory(&layout).expect("scan");
        assert_eq!(inventory.with_policy, vec!["Post".to_string()]);
        assert_eq!(inventory.available, vec!["Tag".to_string()]);
        assert_eq!(
            inventory.stats(),
            PolicyStats {
                total: 2,
                with_policy: 1,
                without_policy: 1
            }
        );
    }

    #[test]
    fn missing_models_dir_is_empty() {
        let dir = tempfile::tempdir().expect("tempdir");
        let inventory = scan_policy_inventory(&ProjectLayout::new(dir.path())).expect("scan");
        assert_eq!(inventory.stats().total, 0);
    }
}
