//! Explore/join structure across a project.
//!
//! Gathers the facts classification and consolidation need, without
//! classifying anything:
//!
//! - every explore's view set (base view plus all joins, nested joins included)
//! - alias edges from `from:` declarations
//! - views populated only by an `UNNEST(...)` join

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use tracing::debug;

use super::blocks::{
    find_blocks, has_directive, keyed_block, name_directive, sql_directive, strip_hash_comments,
    top_level_text, BlockKind, Directive,
};
use super::project::{ModelSource, ViewSource};
use crate::analysis::{Diagnostic, ExploreKey};

/// Model name for explores found outside a model file.
pub const UNKNOWN_MODEL: &str = "unknown_model";

// ============================================================================
// Alias graph
// ============================================================================

/// Directed `view -> from: target` edges. Each view has at most one target.
#[derive(Debug, Clone, Default)]
pub struct AliasGraph {
    graph: DiGraph<String, ()>,
    nodes: HashMap<String, NodeIndex>,
}

impl AliasGraph {
    pub fn new() -> Self {
        Self::default()
    }

    fn node(&mut self, name: &str) -> NodeIndex {
        if let Some(&idx) = self.nodes.get(name) {
            return idx;
        }
        let idx = self.graph.add_node(name.to_string());
        self.nodes.insert(name.to_string(), idx);
        idx
    }

    /// Record `view -> target`. The first target recorded for a view wins;
    /// a different later one is reported and ignored.
    pub fn add_edge(&mut self, view: &str, target: &str) -> Option<Diagnostic> {
        if let Some(existing) = self.target(view) {
            if existing == target {
                return None;
            }
            return Some(Diagnostic::ConflictingAlias {
                view: view.to_string(),
                kept: existing.to_string(),
                ignored: target.to_string(),
            });
        }

        let from = self.node(view);
        let to = self.node(target);
        self.graph.add_edge(from, to, ());
        None
    }

    /// Immediate alias target of a view.
    pub fn target(&self, view: &str) -> Option<&str> {
        let idx = *self.nodes.get(view)?;
        self.graph
            .neighbors(idx)
            .next()
            .and_then(|t| self.graph.node_weight(t))
            .map(String::as_str)
    }

    /// Every view that appears on either end of an edge.
    pub fn views(&self) -> impl Iterator<Item = &str> {
        self.graph.node_weights().map(String::as_str)
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Strongly connected components that form cycles, members sorted.
    pub fn detect_cycles(&self) -> Vec<Vec<String>> {
        tarjan_scc(&self.graph)
            .into_iter()
            .filter(|scc| {
                // A single node is only a cycle if it has a self-loop
                if scc.len() == 1 {
                    let idx = scc[0];
                    self.graph.edges_connecting(idx, idx).next().is_some()
                } else {
                    true
                }
            })
            .map(|scc| {
                let mut members: Vec<String> = scc
                    .into_iter()
                    .filter_map(|idx| self.graph.node_weight(idx).cloned())
                    .collect();
                members.sort();
                members
            })
            .collect()
    }

    /// Remove one edge per cycle so every chain terminates.
    ///
    /// The walk starts at the lexicographically smallest member and the edge
    /// that returns to an already visited view is dropped.
    pub fn break_cycles(&mut self) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();

        for members in self.detect_cycles() {
            let Some(start) = members.first() else {
                continue;
            };
            let mut visited: HashSet<String> = HashSet::new();
            let mut current = start.clone();

            loop {
                visited.insert(current.clone());
                let Some(next) = self.target(&current).map(str::to_string) else {
                    break;
                };
                if visited.contains(&next) {
                    if let (Some(&a), Some(&b)) = (self.nodes.get(&current), self.nodes.get(&next)) {
                        if let Some(edge) = self.graph.find_edge(a, b) {
                            self.graph.remove_edge(edge);
                        }
                    }
                    diagnostics.push(Diagnostic::AliasCycle {
                        members: members.clone(),
                        from: current,
                        to: next,
                    });
                    break;
                }
                current = next;
            }
        }

        diagnostics
    }
}

// ============================================================================
// Relationship graph
// ============================================================================

/// Structural facts gathered from every explore in the project.
#[derive(Debug, Clone, Default)]
pub struct RelationshipGraph {
    /// Views each explore touches. Refinements merge into one entry.
    pub explores: BTreeMap<ExploreKey, BTreeSet<String>>,
    pub aliases: AliasGraph,
    pub unnest_views: BTreeSet<String>,
    pub diagnostics: Vec<Diagnostic>,
}

impl RelationshipGraph {
    /// Scan model sources for explores. View sources are consulted so a
    /// view with its own table or derived table is never marked unnest.
    pub fn build(models: &[ModelSource], views: &BTreeMap<String, ViewSource>) -> Self {
        let mut graph = Self::default();

        let sourced: HashSet<&str> = views
            .iter()
            .filter(|(_, source)| {
                has_directive(&top_level_text(&source.text), Directive::SqlTableName)
                    || keyed_block(&source.text, Directive::DerivedTable).is_some()
            })
            .map(|(name, _)| name.as_str())
            .collect();

        for model in models {
            let text = strip_hash_comments(&model.text);
            for explore in find_blocks(&text, BlockKind::Explore) {
                graph.add_explore(&model.name, explore.name, explore.body, &sourced);
            }
        }

        graph.diagnostics.extend(graph.aliases.break_cycles());

        debug!(
            explores = graph.explores.len(),
            aliases = graph.aliases.edge_count(),
            unnest = graph.unnest_views.len(),
            "relationship graph built"
        );
        graph
    }

    fn add_explore(&mut self, model: &str, name: &str, body: &str, sourced: &HashSet<&str>) {
        let top = top_level_text(body);
        let base = match name_directive(&top, Directive::From) {
            Some(target) => {
                if target != name {
                    self.alias(name, &target);
                }
                target
            }
            None => {
                name_directive(&top, Directive::ViewName).unwrap_or_else(|| name.to_string())
            }
        };

        let mut views = BTreeSet::from([base]);
        self.add_joins(body, &mut views, sourced);

        self.explores
            .entry(ExploreKey::new(model, name))
            .or_default()
            .extend(views);
    }

    fn add_joins(&mut self, body: &str, views: &mut BTreeSet<String>, sourced: &HashSet<&str>) {
        for join in find_blocks(body, BlockKind::Join) {
            views.insert(join.name.to_string());

            let top = top_level_text(join.body);
            if let Some(target) = name_directive(&top, Directive::From) {
                if target != join.name {
                    self.alias(join.name, &target);
                }
            }

            let unnest = sql_directive(&top, Directive::Sql)
                .is_some_and(|sql| sql.to_ascii_uppercase().contains("UNNEST("));
            if unnest && !sourced.contains(join.name) {
                self.unnest_views.insert(join.name.to_string());
            }

            self.add_joins(join.body, views, sourced);
        }
    }

    fn alias(&mut self, view: &str, target: &str) {
        if let Some(diagnostic) = self.aliases.add_edge(view, target) {
            self.diagnostics.push(diagnostic);
        }
    }

    /// Number of explores whose view set contains `view`.
    pub fn explore_count(&self, view: &str) -> usize {
        self.explores.values().filter(|v| v.contains(view)).count()
    }

    /// Every view named by an explore or an alias edge.
    pub fn referenced_views(&self) -> BTreeSet<String> {
        let mut names: BTreeSet<String> = self.explores.values().flatten().cloned().collect();
        names.extend(self.aliases.views().map(str::to_string));
        names
    }
}
