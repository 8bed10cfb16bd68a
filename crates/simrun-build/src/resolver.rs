//! Target graph resolution
//!
//! Expands a root target's `include_targets` depth-first and collects a
//! duplicate-free source list. Included targets contribute their sources
//! before the including target's own, so the final list is in link order.
//!
//! A target that has already been visited is skipped. This keeps the walk
//! finite over diamonds and cycles; each skip is recorded as a [`Revisit`]
//! so callers can tell a shared dependency apart from an absorbed cycle.

use crate::error::{BuildError, BuildResult};
use crate::registry::TargetRegistry;
use serde::Serialize;
use std::collections::HashSet;
use tracing::{debug, trace};

/// How a revisited target relates to the walk that reached it again
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RevisitKind {
    /// Target was still being expanded: a back-edge
    Cycle,
    /// Target was already fully expanded: a shared dependency
    Shared,
}

/// An inclusion edge that pointed at an already-visited target
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Revisit {
    /// The target that was reached again
    pub target: String,
    /// The target whose include list referenced it
    pub included_by: String,
    pub kind: RevisitKind,
}

/// Result of resolving a target graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resolution {
    /// Root target id
    pub root: String,
    /// Deduplicated sources in link order
    pub sources: Vec<String>,
    /// Working directory declared by the root target
    pub working_dir: Option<String>,
    /// Targets in first-visit order
    pub visited: Vec<String>,
    /// Skipped inclusion edges
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub revisits: Vec<Revisit>,
}

impl Resolution {
    /// Working directory, treating an empty string as absent
    pub fn working_dir(&self) -> Option<&str> {
        self.working_dir
            .as_deref()
            .filter(|dir| !dir.trim().is_empty())
    }

    /// Working directory, or an error naming the root target
    pub fn require_working_dir(&self) -> BuildResult<&str> {
        self.working_dir()
            .ok_or_else(|| BuildError::MissingWorkingDirectory {
                target: self.root.clone(),
            })
    }

    /// Whether any cyclic back-edge was absorbed
    pub fn has_cycles(&self) -> bool {
        self.revisits.iter().any(|r| r.kind == RevisitKind::Cycle)
    }

    /// Back-edges only
    pub fn cycles(&self) -> impl Iterator<Item = &Revisit> {
        self.revisits.iter().filter(|r| r.kind == RevisitKind::Cycle)
    }
}

/// Resolve `root_id` against `registry`
///
/// Fails with [`BuildError::UndefinedTarget`] if the root or any target it
/// transitively includes is missing; no partial result is returned.
pub fn resolve(root_id: &str, registry: &TargetRegistry) -> BuildResult<Resolution> {
    let mut walk = Walk::new(registry);
    let working_dir = walk.visit(root_id, None)?;

    debug!(
        root = root_id,
        sources = walk.sources.len(),
        targets = walk.order.len(),
        revisits = walk.revisits.len(),
        "resolved target graph"
    );

    Ok(Resolution {
        root: root_id.to_string(),
        sources: walk.sources,
        working_dir,
        visited: walk.order,
        revisits: walk.revisits,
    })
}

/// Call-scoped traversal state
struct Walk<'a> {
    registry: &'a TargetRegistry,
    visited: HashSet<String>,
    order: Vec<String>,
    /// Targets whose includes are currently being expanded
    in_progress: HashSet<String>,
    seen_sources: HashSet<String>,
    sources: Vec<String>,
    revisits: Vec<Revisit>,
}

impl<'a> Walk<'a> {
    fn new(registry: &'a TargetRegistry) -> Self {
        Self {
            registry,
            visited: HashSet::new(),
            order: Vec::new(),
            in_progress: HashSet::new(),
            seen_sources: HashSet::new(),
            sources: Vec::new(),
            revisits: Vec::new(),
        }
    }

    /// Visit one target, returning its declared working directory
    fn visit(&mut self, id: &str, included_by: Option<&str>) -> BuildResult<Option<String>> {
        if self.visited.contains(id) {
            if let Some(parent) = included_by {
                let kind = if self.in_progress.contains(id) {
                    RevisitKind::Cycle
                } else {
                    RevisitKind::Shared
                };
                trace!(target_id = id, included_by = parent, ?kind, "skipping revisit");
                self.revisits.push(Revisit {
                    target: id.to_string(),
                    included_by: parent.to_string(),
                    kind,
                });
            }
            return Ok(None);
        }
        self.visited.insert(id.to_string());

        let registry = self.registry;
        let target = registry
            .get(id)
            .ok_or_else(|| BuildError::undefined_target(id, included_by))?;

        trace!(target_id = id, "visiting target");
        self.order.push(id.to_string());
        self.in_progress.insert(id.to_string());

        for include in &target.include_targets {
            // Only the root's working directory counts
            self.visit(include, Some(id))?;
        }

        self.in_progress.remove(id);

        for source in &target.sources {
            if self.seen_sources.insert(source.clone()) {
                self.sources.push(source.clone());
            }
        }

        Ok(target.working_dir.clone())
    }
}
