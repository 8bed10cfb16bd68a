//! Target registry loaded from a declarative document
//!
//! The registry document has two top-level fields:
//!
//! ```json
//! {
//!   "default_target": "t1",
//!   "build_targets": [
//!     { "id": "t1", "sources": ["a.v"], "include_targets": ["t2"], "working_dir": "sim/" },
//!     { "id": "t2", "sources": ["b.v"] }
//!   ]
//! }
//! ```
//!
//! JSON is the primary format. Files ending in `.toml` are read as TOML
//! with the same schema. The registry is read-only once loaded.

use crate::error::{BuildError, BuildResult};
use crate::targets::Target;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Raw registry document before validation
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RegistryDocument {
    build_targets: Vec<Target>,
    default_target: String,
}

/// In-memory mapping from target identifier to target definition
#[derive(Debug, Clone)]
pub struct TargetRegistry {
    /// Targets by id
    targets: HashMap<String, Target>,
    /// Declaration order of target ids
    order: Vec<String>,
    /// Target used when none is requested
    default_target: String,
}

impl TargetRegistry {
    /// Build a registry from already-parsed targets
    pub fn new(targets: Vec<Target>, default_target: impl Into<String>) -> BuildResult<Self> {
        Self::from_parts("<memory>", targets, default_target.into())
    }

    /// Load a registry file, picking the format from its extension
    pub fn load(path: &Path) -> BuildResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| BuildError::io(path, e))?;
        let source_name = path.display().to_string();

        let is_toml = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));

        let registry = if is_toml {
            Self::parse_toml(&source_name, &content)?
        } else {
            Self::parse_json(&source_name, &content)?
        };

        debug!(
            path = %path.display(),
            targets = registry.len(),
            default_target = %registry.default_target,
            "loaded target registry"
        );
        Ok(registry)
    }

    /// Parse a JSON registry document
    pub fn from_json_str(content: &str) -> BuildResult<Self> {
        Self::parse_json("<json>", content)
    }

    /// Parse a TOML registry document
    pub fn from_toml_str(content: &str) -> BuildResult<Self> {
        Self::parse_toml("<toml>", content)
    }

    fn parse_json(source_name: &str, content: &str) -> BuildResult<Self> {
        let doc: RegistryDocument = serde_json::from_str(content)
            .map_err(|e| BuildError::malformed(source_name, e))?;
        Self::from_parts(source_name, doc.build_targets, doc.default_target)
    }

    fn parse_toml(source_name: &str, content: &str) -> BuildResult<Self> {
        let doc: RegistryDocument =
            toml::from_str(content).map_err(|e| BuildError::malformed(source_name, e))?;
        Self::from_parts(source_name, doc.build_targets, doc.default_target)
    }

    fn from_parts(
        source_name: &str,
        build_targets: Vec<Target>,
        default_target: String,
    ) -> BuildResult<Self> {
        if default_target.trim().is_empty() {
            return Err(BuildError::malformed(
                source_name,
                "default_target cannot be empty",
            ));
        }

        let mut targets = HashMap::with_capacity(build_targets.len());
        let mut order = Vec::with_capacity(build_targets.len());

        for target in build_targets {
            target
                .validate()
                .map_err(|reason| BuildError::malformed(source_name, reason))?;

            if targets.contains_key(&target.id) {
                return Err(BuildError::malformed(
                    source_name,
                    format!("duplicate target id '{}'", target.id),
                ));
            }

            order.push(target.id.clone());
            targets.insert(target.id.clone(), target);
        }

        Ok(Self {
            targets,
            order,
            default_target,
        })
    }

    /// Get a target by id
    pub fn get(&self, id: &str) -> Option<&Target> {
        self.targets.get(id)
    }

    /// Check whether a target is defined
    pub fn contains(&self, id: &str) -> bool {
        self.targets.contains_key(id)
    }

    /// Identifier of the default target
    pub fn default_target_id(&self) -> &str {
        &self.default_target
    }

    /// Iterate targets in declaration order
    pub fn iter(&self) -> impl Iterator<Item = &Target> {
        self.order.iter().filter_map(|id| self.targets.get(id))
    }

    /// Get target count
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    /// Check if registry is empty
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_json() {
        let registry = TargetRegistry::from_json_str(
            r#"{"default_target": "t1", "build_targets": [{"id": "t1"}]}"#,
        )
        .unwrap();
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.default_target_id(), "t1");
        assert!(registry.contains("t1"));
        assert!(registry.get("t2").is_none());
    }

    #[test]
    fn test_missing_build_targets() {
        let err = TargetRegistry::from_json_str(r#"{"default_target": "t1"}"#).unwrap_err();
        match err {
            BuildError::MalformedRegistry { reason, .. } => {
                assert!(reason.contains("build_targets"));
            }
            other => panic!("Expected MalformedRegistry, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_default_target() {
        let err = TargetRegistry::from_json_str(r#"{"build_targets": []}"#).unwrap_err();
        assert!(matches!(err, BuildError::MalformedRegistry { .. }));
    }

    #[test]
    fn test_mistyped_sources() {
        let err = TargetRegistry::from_json_str(
            r#"{"default_target": "t1", "build_targets": [{"id": "t1", "sources": "a.v"}]}"#,
        )
        .unwrap_err();
        assert!(matches!(err, BuildError::MalformedRegistry { .. }));
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let err = TargetRegistry::from_json_str(
            r#"{"default_target": "t1", "build_targets": [{"id": "t1"}, {"id": "t1"}]}"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("duplicate target id 't1'"));
    }

    #[test]
    fn test_default_target_not_checked_at_load() {
        // An undefined default surfaces at resolution time, not here
        let registry = TargetRegistry::from_json_str(
            r#"{"default_target": "ghost", "build_targets": [{"id": "t1"}]}"#,
        )
        .unwrap();
        assert_eq!(registry.default_target_id(), "ghost");
    }

    #[test]
    fn test_declaration_order_preserved() {
        let registry = TargetRegistry::new(
            vec![Target::new("z"), Target::new("a"), Target::new("m")],
            "a",
        )
        .unwrap();
        let ids: Vec<&str> = registry.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["z", "a", "m"]);
    }

    #[test]
    fn test_parse_toml() {
        let registry = TargetRegistry::from_toml_str(
            r#"
default_target = "top"

[[build_targets]]
id = "top"
sources = ["top.v"]
include_targets = ["lib"]
working_dir = "sim"

[[build_targets]]
id = "lib"
sources = ["lib.v"]
"#,
        )
        .unwrap();
        assert_eq!(registry.len(), 2);
        assert_eq!(
            registry.get("top").unwrap().working_dir.as_deref(),
            Some("sim")
        );
    }
}
