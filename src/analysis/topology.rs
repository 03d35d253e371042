use crate::store::Node;
use std::collections::HashSet;

/// Returns the dependency closure of `targets` in evaluation order.
///
/// Post-order DFS over each target's dependencies in declared order: every
/// dependency appears before its consumer, and nodes shared by several
/// consumers appear once.
pub fn closure(targets: &[Node]) -> Vec<Node> {
    let mut order = Vec::new();
    let mut visited = HashSet::new();
    // Explicit stack of (node, next dependency to visit); chains of any depth
    // are walked without recursion.
    let mut stack: Vec<(Node, usize)> = Vec::new();
    for target in targets {
        if visited.contains(target) {
            continue;
        }
        stack.push((target.clone(), 0));
        while let Some(frame) = stack.last_mut() {
            let next = frame.0.dependencies().get(frame.1).cloned();
            frame.1 += 1;
            match next {
                Some(dep) => {
                    if !visited.contains(&dep) {
                        stack.push((dep, 0));
                    }
                }
                None => {
                    if let Some((node, _)) = stack.pop() {
                        if visited.insert(node.clone()) {
                            order.push(node);
                        }
                    }
                }
            }
        }
    }
    order
}

/// Identifies every node in the closure of `targets` that is, or
/// transitively depends on, one of the `changed` nodes.
/// Used for incremental invalidation of a retained cache.
pub fn downstream_from(targets: &[Node], changed: &[Node]) -> HashSet<Node> {
    let changed: HashSet<&Node> = changed.iter().collect();
    let mut dirty = HashSet::new();

    // Closure order guarantees dependencies are classified before consumers.
    for node in closure(targets) {
        let is_dirty = changed.contains(&node)
            || node.dependencies().iter().any(|dep| dirty.contains(dep));
        if is_dirty {
            dirty.insert(node);
        }
    }
    dirty
}
