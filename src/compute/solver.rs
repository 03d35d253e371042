//! A synchronous, single-threaded dependency solver.
use super::error::SolveError;
use super::kernel;
use super::registry::TransformRegistry;
use crate::config::SolverConfig;
use crate::store::{Cache, Node, NodeKind, Operation, Value};
use rayon::prelude::*;
use std::collections::{HashMap, HashSet};

pub type Solution = HashMap<Node, Value>;

pub struct Solver<'a> {
    registry: &'a TransformRegistry,
    config: SolverConfig,
}

/// Evaluation order plus the bookkeeping used to build it.
#[derive(Default)]
struct Plan {
    order: Vec<Node>,
    visiting: HashSet<Node>, // For cycle detection
    visited: HashSet<Node>,  // For memoization
    names: HashMap<String, Node>,
}

impl<'a> Solver<'a> {
    pub fn new(registry: &'a TransformRegistry) -> Self {
        Self::with_config(registry, SolverConfig::default())
    }

    pub fn with_config(registry: &'a TransformRegistry, config: SolverConfig) -> Self {
        Self { registry, config }
    }

    pub fn config(&self) -> &SolverConfig { &self.config }

    /// Computes the values of `targets`, calculating their dependencies as needed.
    ///
    /// Nodes with a value in `seed` are never recomputed, and every other node
    /// in the closure is evaluated at most once. The result holds exactly the
    /// requested targets; `seed` is left untouched.
    pub fn solve(&self, targets: &[Node], seed: &Cache) -> Result<Solution, SolveError> {
        let working = self.resolve(targets, seed)?;
        Ok(select(targets, seed, &working))
    }

    /// Single-target form of [`Solver::solve`].
    pub fn solve_one(&self, target: &Node, seed: &Cache) -> Result<Value, SolveError> {
        let working = self.resolve(std::slice::from_ref(target), seed)?;
        lookup(target, seed, &working).cloned().ok_or_else(|| SolveError::MissingLeafValue {
            node: target.name().to_string(),
        })
    }

    /// Like [`Solver::solve`], but merges every computed intermediate into
    /// `cache` so later calls can reuse it. On failure `cache` is unchanged.
    pub fn solve_with_cache(&self, targets: &[Node], cache: &mut Cache) -> Result<Solution, SolveError> {
        let working = self.resolve(targets, cache)?;
        let result = select(targets, cache, &working);
        cache.extend(working);
        Ok(result)
    }

    /// Solves the same targets against several independent seeds in parallel.
    /// Results are returned in the order of `seeds`.
    pub fn solve_batch(&self, targets: &[Node], seeds: &[Cache]) -> Vec<Result<Solution, SolveError>> {
        seeds.par_iter().map(|seed| self.solve(targets, seed)).collect()
    }

    fn resolve(&self, targets: &[Node], seed: &Cache) -> Result<HashMap<Node, Value>, SolveError> {
        tracing::debug!(targets = targets.len(), seeded = seed.len(), "Solving");

        let mut plan = Plan::default();
        for target in targets {
            self.build_eval_order_dfs(target, seed, 0, &mut plan)
                .inspect_err(|e| tracing::warn!(error = %e, "Solve planning failed"))?;
        }

        let mut working = HashMap::with_capacity(plan.order.len());
        for node in &plan.order {
            // The DFS ensures dependencies are evaluated first.
            let value = self
                .evaluate(node, seed, &working)
                .inspect_err(|e| tracing::warn!(error = %e, "Solve failed"))?;
            working.insert(node.clone(), value);
        }

        tracing::debug!(evaluated = working.len(), "Solved");
        Ok(working)
    }

    /// Recursive post-order DFS over declared dependency order, which yields a
    /// topological evaluation order restricted to nodes not already seeded.
    fn build_eval_order_dfs(
        &self,
        node: &Node,
        seed: &Cache,
        depth: usize,
        plan: &mut Plan,
    ) -> Result<(), SolveError> {
        if self.config.strict_names {
            match plan.names.get(node.name()) {
                Some(existing) if existing != node => {
                    return Err(SolveError::ConflictingNodeName { name: node.name().to_string() });
                }
                Some(_) => {}
                None => {
                    plan.names.insert(node.name().to_string(), node.clone());
                }
            }
        }
        if plan.visited.contains(node) {
            return Ok(());
        }
        if seed.contains(node) {
            tracing::trace!(node = %node, "Cache hit");
            return Ok(());
        }
        if plan.visiting.contains(node) {
            return Err(SolveError::CyclicDependency { node: node.name().to_string() });
        }
        // Only nodes that still need a walk count against the limit.
        if let Some(limit) = self.config.max_depth {
            if depth > limit {
                return Err(SolveError::DepthLimitExceeded { node: node.name().to_string(), limit });
            }
        }

        match node.kind() {
            NodeKind::Leaf => {
                return Err(SolveError::MissingLeafValue { node: node.name().to_string() });
            }
            NodeKind::Derived { operation, dependencies } => {
                if !self.registry.supports(operation) {
                    return Err(SolveError::UnknownTransform {
                        node: node.name().to_string(),
                        tag: operation.tag().to_string(),
                    });
                }
                plan.visiting.insert(node.clone());
                for dep in dependencies {
                    self.build_eval_order_dfs(dep, seed, depth + 1, plan)?;
                }
                plan.visiting.remove(node);
            }
        }

        plan.visited.insert(node.clone());
        plan.order.push(node.clone());
        Ok(())
    }

    fn evaluate(&self, node: &Node, seed: &Cache, working: &HashMap<Node, Value>) -> Result<Value, SolveError> {
        let (operation, dependencies) = match node.kind() {
            NodeKind::Derived { operation, dependencies } => (operation, dependencies),
            NodeKind::Leaf => {
                return Err(SolveError::MissingLeafValue { node: node.name().to_string() });
            }
        };

        let mut inputs = Vec::with_capacity(dependencies.len());
        for dep in dependencies {
            let value = lookup(dep, seed, working).ok_or_else(|| SolveError::MissingLeafValue {
                node: dep.name().to_string(),
            })?;
            inputs.push(value.clone());
        }

        let result = match operation {
            Operation::Custom { tag } => {
                let transform = self.registry.get(tag).ok_or_else(|| SolveError::UnknownTransform {
                    node: node.name().to_string(),
                    tag: tag.clone(),
                })?;
                transform.evaluate(&inputs)
            }
            builtin => kernel::execute(builtin, &inputs),
        };

        let value = result.map_err(|source| SolveError::TransformEvaluation {
            node: node.name().to_string(),
            source,
        })?;
        tracing::debug!(node = %node, kind = value.kind_name(), "Evaluated");
        Ok(value)
    }
}

#[inline]
fn lookup<'c>(node: &Node, seed: &'c Cache, working: &'c HashMap<Node, Value>) -> Option<&'c Value> {
    seed.get(node).or_else(|| working.get(node))
}

fn select(targets: &[Node], seed: &Cache, working: &HashMap<Node, Value>) -> Solution {
    targets
        .iter()
        .filter_map(|t| lookup(t, seed, working).map(|v| (t.clone(), v.clone())))
        .collect()
}
