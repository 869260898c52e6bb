//! Stratification analysis for programs with negation
//!
//! This module analyzes programs to determine if they can be safely evaluated
//! with negation. A program is stratifiable if there are no cycles through negation.
//!
//! # Stratification
//!
//! Stratification assigns each predicate to a stratum (layer). Predicates in higher
//! strata can depend on negated predicates from lower strata, but not vice versa.
//!
//! # Algorithm
//!
//! 1. Build the predicate dependency graph (head -> body, edges signed)
//! 2. Compute strongly connected components with Tarjan's algorithm
//! 3. Reject any component containing a negative edge
//! 4. Walk the components dependencies-first; a component's level is the
//!    maximum over its outside dependencies of `level + 1` for a negative
//!    edge and `level` for a positive one
//!
//! # Example
//!
//! ```ignore
//! let stratification = stratify(&rules)?;
//! for stratum in &stratification.strata {
//!     // Evaluate rules stratum by stratum
//! }
//! ```

use datalog_ast::{Literal, Predicate, Rule};
use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use std::collections::{HashMap, HashSet};

/// One layer of the program
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Stratum {
    /// Predicates assigned to this stratum, sorted
    pub predicates: Vec<Predicate>,
    /// Rules whose head belongs to this stratum, in program order
    pub rules: Vec<Rule>,
    /// Some predicate of this stratum depends on itself
    pub is_recursive: bool,
}

/// Result of stratification analysis
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Stratification {
    /// Map from predicate to stratum number (0 = bottom stratum)
    pub predicate_strata: HashMap<Predicate, usize>,
    /// Strata in evaluation order
    pub strata: Vec<Stratum>,
}

impl Stratification {
    /// Total number of strata
    pub fn num_strata(&self) -> usize {
        self.strata.len()
    }

    pub fn stratum_of(&self, predicate: &Predicate) -> Option<usize> {
        self.predicate_strata.get(predicate).copied()
    }
}

/// Error during stratification
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StratificationError {
    /// Program has a cycle through negation (not stratifiable)
    #[error("Cycle through negation detected among: {}", format_cycle(.0))]
    CycleThroughNegation(Vec<Predicate>),
}

fn format_cycle(cycle: &[Predicate]) -> String {
    let names: Vec<String> = cycle.iter().map(|p| p.to_string()).collect();
    names.join(", ")
}

/// Dependency between predicates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DependencyType {
    Positive, // p depends positively on q
    Negative, // p depends negatively on q (through negation)
}

/// Dependency graph for stratification analysis
struct DependencyGraph {
    graph: DiGraph<Predicate, DependencyType>,
    nodes: HashMap<Predicate, NodeIndex>,
}

impl DependencyGraph {
    fn node(&mut self, predicate: Predicate) -> NodeIndex {
        *self
            .nodes
            .entry(predicate)
            .or_insert_with(|| self.graph.add_node(predicate))
    }

    /// Build dependency graph from rules
    fn build(rules: &[Rule]) -> Self {
        let mut graph = DependencyGraph {
            graph: DiGraph::new(),
            nodes: HashMap::new(),
        };

        for rule in rules {
            let head = graph.node(rule.head.predicate);
            for literal in &rule.body {
                let (atom, dep_type) = match literal {
                    Literal::Positive(atom) => (atom, DependencyType::Positive),
                    Literal::Negative(atom) => (atom, DependencyType::Negative),
                    // Built-ins don't create predicate dependencies
                    Literal::BuiltIn(_) => continue,
                };
                let body = graph.node(atom.predicate);
                graph.graph.add_edge(head, body, dep_type);
            }
        }

        graph
    }
}

/// Stratify a program
pub fn stratify(rules: &[Rule]) -> Result<Stratification, StratificationError> {
    if rules.is_empty() {
        return Ok(Stratification::default());
    }

    let DependencyGraph { graph, .. } = DependencyGraph::build(rules);

    // Components come out dependencies first
    let components = tarjan_scc(&graph);
    let mut level_of: HashMap<NodeIndex, usize> = HashMap::new();
    let mut levels: Vec<(Vec<NodeIndex>, usize, bool)> = Vec::with_capacity(components.len());

    for component in components {
        let members: HashSet<NodeIndex> = component.iter().copied().collect();
        let mut level = 0;
        let mut recursive = component.len() > 1;

        for &node in &component {
            for edge in graph.edges(node) {
                let target = edge.target();
                let negative = *edge.weight() == DependencyType::Negative;
                if members.contains(&target) {
                    if negative {
                        let mut cycle: Vec<Predicate> =
                            component.iter().map(|n| graph[*n]).collect();
                        cycle.sort();
                        return Err(StratificationError::CycleThroughNegation(cycle));
                    }
                    recursive |= target == node;
                    continue;
                }
                let dep_level = level_of.get(&target).copied().unwrap_or(0);
                level = level.max(dep_level + usize::from(negative));
            }
        }

        for &node in &component {
            level_of.insert(node, level);
        }
        levels.push((component, level, recursive));
    }

    let num_strata = levels.iter().map(|(_, level, _)| *level).max().unwrap_or(0) + 1;
    let mut strata: Vec<Stratum> = vec![Stratum::default(); num_strata];
    let mut predicate_strata = HashMap::new();

    for (component, level, recursive) in levels {
        let stratum = &mut strata[level];
        stratum.is_recursive |= recursive;
        for node in component {
            stratum.predicates.push(graph[node]);
            predicate_strata.insert(graph[node], level);
        }
    }
    for stratum in &mut strata {
        stratum.predicates.sort();
    }

    // Organize rules by stratum
    for rule in rules {
        let level = predicate_strata
            .get(&rule.head.predicate)
            .copied()
            .unwrap_or(0);
        strata[level].rules.push(rule.clone());
    }

    Ok(Stratification {
        predicate_strata,
        strata,
    })
}
