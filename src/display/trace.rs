use crate::store::{Cache, Node, NodeKind, Value};
use std::collections::HashMap;
use std::fmt::Write;

/// Maximum table entries shown inline before eliding the rest.
const PREVIEW_ENTRIES: usize = 4;

/// Renders the dependency tree of `target` with the values held in `cache`.
///
/// Nodes reached a second time are printed as a reference to the level where
/// they were first expanded.
pub fn format_trace(cache: &Cache, target: &Node) -> String {
    let mut tracer = Tracer {
        cache,
        visited_at_level: HashMap::new(),
        output: String::new(),
    };

    let _ = writeln!(tracer.output, "AUDIT TRACE for node '{}':", target.name());
    let _ = writeln!(tracer.output, "--------------------------------------------------");
    tracer.trace_node(target, 1, "");
    tracer.output
}

struct Tracer<'a> {
    cache: &'a Cache,
    visited_at_level: HashMap<Node, usize>,
    output: String,
}

impl<'a> Tracer<'a> {
    fn trace_node(&mut self, node: &Node, level: usize, prefix: &str) {
        if let Some(&first_seen) = self.visited_at_level.get(node) {
            let _ = writeln!(self.output, "{}{} -> (Ref to L{})", prefix, node.name(), first_seen);
            return;
        }
        self.visited_at_level.insert(node.clone(), level);

        let line_header = format!("[L{}] {} {}", level, node.name(), self.format_value(node));
        match node.kind() {
            NodeKind::Leaf => {
                let _ = writeln!(self.output, "{}{} -> Leaf", prefix, line_header);
            }
            NodeKind::Derived { operation, dependencies } => {
                let args: Vec<&str> = dependencies.iter().map(Node::name).collect();
                let _ = writeln!(self.output, "{}{} = {}({})", prefix, line_header, operation.tag(), args.join(", "));
                self.recurse_children(prefix, dependencies, level);
            }
        }
    }

    fn recurse_children(&mut self, prefix: &str, children: &[Node], level: usize) {
        let stem = build_child_stem(prefix);
        for (i, child) in children.iter().enumerate() {
            let connector = if i == children.len() - 1 { "`--" } else { "|--" };
            let full_prefix = format!("{}{}", stem, connector);
            self.trace_node(child, level + 1, &full_prefix);
        }
    }

    fn format_value(&self, node: &Node) -> String {
        match self.cache.get(node) {
            None => "[?]".to_string(),
            Some(Value::Number(n)) => format!("[{:.3}]", n),
            Some(Value::Items(items)) => format!("[items len={}]", items.len()),
            Some(Value::Frequencies(t)) => preview(t.iter().map(|(k, v)| format!("{}: {}", k, v)), t.len()),
            Some(Value::Deltas(t)) => preview(t.iter().map(|(k, v)| format!("{}: {}", k, v)), t.len()),
            Some(Value::Ratios(t)) => preview(t.iter().map(|(k, v)| format!("{}: {:.3}", k, v)), t.len()),
            Some(Value::Vectors(v)) => {
                let width = v.first().map_or(0, Vec::len);
                format!("[vectors {}x{}]", v.len(), width)
            }
        }
    }
}

fn preview(entries: impl Iterator<Item = String>, len: usize) -> String {
    let shown: Vec<String> = entries.take(PREVIEW_ENTRIES).collect();
    if len > PREVIEW_ENTRIES {
        format!("{{{}, ... +{}}}", shown.join(", "), len - PREVIEW_ENTRIES)
    } else {
        format!("{{{}}}", shown.join(", "))
    }
}

fn build_child_stem(current_prefix: &str) -> String {
    current_prefix.replace("`--", "   ").replace("|--", "|  ")
}
