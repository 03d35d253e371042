//! Defines the `Node`, the immutable unit of computation in a dependency graph.
//!
//! A node is either a leaf, whose value is supplied by the caller, or a
//! derived node that applies an `Operation` to the values of its dependencies.
//! Nodes are identified structurally: two nodes built independently (or
//! decoded from storage) compare equal when they describe the same
//! computation, so they can be used interchangeably as cache keys.

use crate::serialization::NodeTable;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use smallvec::SmallVec;
use std::collections::hash_map::DefaultHasher;
use std::collections::HashSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Ordered dependency list. Order is positional-argument order for the
/// operation and participates in equality.
pub type Dependencies = SmallVec<[Node; 2]>;

/// Identifies the calculation performed by a derived node.
///
/// Operations are tags, not function pointers, so a node graph can be
/// encoded and decoded without losing the ability to evaluate it. `Custom`
/// tags are resolved through a `TransformRegistry` at solve time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    /// Counts occurrences of each item in a sequence.
    Table,
    /// `new - old` per item over the union of two frequency tables.
    Delta,
    /// Delta relative to the original count, clamped when a baseline exists.
    ProportionalDelta,
    Custom { tag: String },
}

impl Operation {
    /// The canonical name of the operation, used to derive node names.
    pub fn tag(&self) -> &str {
        match self {
            Operation::Table => "table",
            Operation::Delta => "delta",
            Operation::ProportionalDelta => "prop_delta",
            Operation::Custom { tag } => tag,
        }
    }

    pub fn custom(tag: impl Into<String>) -> Self {
        Operation::Custom { tag: tag.into() }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// A value supplied externally through the seed cache.
    Leaf,
    Derived {
        operation: Operation,
        dependencies: Dependencies,
    },
}

struct NodeInner {
    name: String,
    kind: NodeKind,
    /// Structural fingerprint of `name`, `kind` and, through their own
    /// digests, every dependency. Equal nodes always share a digest.
    digest: u64,
}

// Releases dependency chains without recursion: uniquely owned dependencies
// are unlinked onto a worklist before they drop.
impl Drop for NodeInner {
    fn drop(&mut self) {
        let mut pending: Vec<Node> = match &mut self.kind {
            NodeKind::Leaf => return,
            NodeKind::Derived { dependencies, .. } => std::mem::take(dependencies).into_vec(),
        };
        while let Some(node) = pending.pop() {
            if let Some(mut inner) = Arc::into_inner(node.0) {
                if let NodeKind::Derived { dependencies, .. } = &mut inner.kind {
                    pending.extend(std::mem::take(dependencies));
                }
            }
        }
    }
}

/// A named node in the computation graph. Cloning is cheap (`Arc`).
///
/// Dropping the last handle to a deep graph does not recurse, so chains of
/// any length can be built and released.
#[derive(Clone)]
pub struct Node(Arc<NodeInner>);

impl Node {
    pub fn leaf(name: impl Into<String>) -> Self {
        Self::from_parts(name.into(), NodeKind::Leaf)
    }

    /// Builds a derived node. Without an explicit `name`, the name is
    /// composed from the operation tag and the dependency names, e.g.
    /// `delta(table(old_tokens), table(new_tokens))`.
    pub fn derived<I>(operation: Operation, dependencies: I, name: Option<&str>) -> Self
    where
        I: IntoIterator<Item = Node>,
    {
        let dependencies: Dependencies = dependencies.into_iter().collect();
        let name = match name {
            Some(explicit) => explicit.to_string(),
            None => format_name(&operation, &dependencies),
        };
        Self::from_parts(name, NodeKind::Derived { operation, dependencies })
    }

    /// Shorthand for a derived node evaluated by a registered transform.
    pub fn custom<I>(tag: impl Into<String>, dependencies: I, name: Option<&str>) -> Self
    where
        I: IntoIterator<Item = Node>,
    {
        Self::derived(Operation::custom(tag), dependencies, name)
    }

    fn from_parts(name: String, kind: NodeKind) -> Self {
        let mut hasher = DefaultHasher::new();
        name.hash(&mut hasher);
        match &kind {
            NodeKind::Leaf => 0u8.hash(&mut hasher),
            NodeKind::Derived { operation, dependencies } => {
                1u8.hash(&mut hasher);
                operation.hash(&mut hasher);
                dependencies.len().hash(&mut hasher);
                for dep in dependencies {
                    dep.0.digest.hash(&mut hasher);
                }
            }
        }
        let digest = hasher.finish();
        Node(Arc::new(NodeInner { name, kind, digest }))
    }

    pub fn name(&self) -> &str { &self.0.name }
    pub fn kind(&self) -> &NodeKind { &self.0.kind }
    pub fn is_leaf(&self) -> bool { matches!(self.0.kind, NodeKind::Leaf) }

    pub fn operation(&self) -> Option<&Operation> {
        match &self.0.kind {
            NodeKind::Leaf => None,
            NodeKind::Derived { operation, .. } => Some(operation),
        }
    }

    pub fn dependencies(&self) -> &[Node] {
        match &self.0.kind {
            NodeKind::Leaf => &[],
            NodeKind::Derived { dependencies, .. } => dependencies,
        }
    }

    /// True when both handles point at the same allocation, not merely at
    /// equal nodes.
    pub fn ptr_eq(this: &Node, other: &Node) -> bool {
        Arc::ptr_eq(&this.0, &other.0)
    }
}

fn format_name(operation: &Operation, dependencies: &[Node]) -> String {
    let args: Vec<&str> = dependencies.iter().map(Node::name).collect();
    format!("{}({})", operation.tag(), args.join(", "))
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        if Node::ptr_eq(self, other) {
            return true;
        }
        if self.0.digest != other.0.digest {
            return false;
        }
        structurally_equal(self, other)
    }
}

impl Eq for Node {}

/// Walks both graphs side by side. Each pair of allocations is compared once,
/// so shared sub-graphs cost linear rather than exponential time.
fn structurally_equal(a: &Node, b: &Node) -> bool {
    let mut seen: HashSet<(*const NodeInner, *const NodeInner)> = HashSet::new();
    let mut stack = vec![(a, b)];
    while let Some((x, y)) = stack.pop() {
        if Node::ptr_eq(x, y) || !seen.insert((Arc::as_ptr(&x.0), Arc::as_ptr(&y.0))) {
            continue;
        }
        let (xs, ys) = (x.dependencies(), y.dependencies());
        if x.0.digest != y.0.digest
            || x.0.name != y.0.name
            || x.operation() != y.operation()
            || xs.len() != ys.len()
        {
            return false;
        }
        stack.extend(xs.iter().zip(ys));
    }
    true
}

impl Hash for Node {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.0.digest);
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.name)
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0.kind {
            NodeKind::Leaf => write!(f, "<{}>", self.0.name),
            NodeKind::Derived { operation, dependencies } => f
                .debug_struct("Node")
                .field("name", &self.0.name)
                .field("operation", operation)
                .field("dependencies", dependencies)
                .finish(),
        }
    }
}

// --- Serde ---
//
// A node is written as the flat table of its closure plus the index of the
// node itself; see `serialization::NodeTable`.

#[derive(Serialize, Deserialize)]
struct NodeRepr {
    nodes: NodeTable,
    root: usize,
}

impl Serialize for Node {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let (nodes, roots) = NodeTable::encode(std::slice::from_ref(self));
        NodeRepr { nodes, root: roots[0] }.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Node {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let repr = NodeRepr::deserialize(deserializer)?;
        let nodes = repr.nodes.decode().map_err(serde::de::Error::custom)?;
        nodes.get(repr.root).cloned().ok_or_else(|| {
            serde::de::Error::custom(format!("root index {} is outside the node table", repr.root))
        })
    }
}
