use datasource_core::datasources::frequencies;
use datasource_core::store::{DeltaTable, FrequencyTable};
use datasource_core::{serialization, Cache, Node, SolveError, Solver, TransformRegistry, Value};

struct Graph {
    old_tokens: Node,
    new_tokens: Node,
    old_ft: Node,
    new_ft: Node,
    delta: Node,
    prop_delta: Node,
}

fn graph() -> Graph {
    let old_tokens = Node::leaf("old_tokens");
    let new_tokens = Node::leaf("new_tokens");
    let old_ft = frequencies::table(&old_tokens, Some("old_ft"));
    let new_ft = frequencies::table(&new_tokens, Some("new_ft"));
    let delta = frequencies::delta(&old_ft, &new_ft, Some("delta"));
    let prop_delta = frequencies::prop_delta(&old_ft, &delta, Some("prop_delta"));
    Graph { old_tokens, new_tokens, old_ft, new_ft, delta, prop_delta }
}

fn repeat(spec: &[(&str, usize)]) -> Value {
    Value::items(spec.iter().flat_map(|&(t, n)| std::iter::repeat(t).take(n)))
}

fn seed(g: &Graph) -> Cache {
    Cache::new()
        .with(&g.old_tokens, repeat(&[("a", 3), ("b", 2), ("c", 45)]))
        .with(&g.new_tokens, repeat(&[("a", 1), ("b", 5), ("d", 3)]))
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

#[test]
fn test_table() {
    let g = graph();
    let registry = TransformRegistry::new();
    let cache = Cache::new().with(&g.new_tokens, repeat(&[("a", 3), ("b", 2), ("c", 45)]));

    let out = Solver::new(&registry).solve_one(&g.new_ft, &cache).unwrap();
    let expected: FrequencyTable = [("a", 3), ("b", 2), ("c", 45)].into_iter().collect();
    assert_eq!(out, Value::from(expected));

    let decoded = serialization::from_json(&serialization::to_json(&g.new_ft).unwrap()).unwrap();
    assert_eq!(decoded, g.new_ft);
}

#[test]
fn test_delta() {
    let g = graph();
    let registry = TransformRegistry::new();

    let out = Solver::new(&registry).solve_one(&g.delta, &seed(&g)).unwrap();
    let expected: DeltaTable = [("a", -2), ("b", 3), ("c", -45), ("d", 3)].into_iter().collect();
    assert_eq!(out, Value::from(expected));

    let decoded = serialization::from_bytes(&serialization::to_bytes(&g.delta).unwrap()).unwrap();
    assert_eq!(decoded, g.delta);
}

#[test]
fn test_prop_delta() {
    let g = graph();
    let registry = TransformRegistry::new();

    let out = Solver::new(&registry).solve_one(&g.prop_delta, &seed(&g)).unwrap();
    let pd = out.as_ratios().unwrap();
    assert_eq!(pd.keys().collect::<Vec<_>>(), ["a", "b", "c", "d"]);
    assert_eq!(round2(pd.get_or("a", f64::NAN)), -0.67);
    assert_eq!(round2(pd.get_or("b", f64::NAN)), 1.0);
    assert_eq!(round2(pd.get_or("c", f64::NAN)), -1.0);
    assert_eq!(round2(pd.get_or("d", f64::NAN)), 3.0);

    let decoded = serialization::from_json(&serialization::to_json(&g.prop_delta).unwrap()).unwrap();
    assert_eq!(decoded, g.prop_delta);
}

#[test]
fn test_all_targets_in_one_request() {
    let g = graph();
    let registry = TransformRegistry::new();
    let targets = [g.old_ft.clone(), g.new_ft.clone(), g.delta.clone(), g.prop_delta.clone()];

    let out = Solver::new(&registry).solve(&targets, &seed(&g)).unwrap();
    assert_eq!(out.len(), 4);
    assert!(!out.contains_key(&g.old_tokens));
    assert_eq!(out[&g.old_ft].as_frequencies().unwrap().total(), 50);
}

#[test]
fn test_decoded_graph_solves_against_original_seed() {
    let g = graph();
    let registry = TransformRegistry::new();
    let decoded = serialization::from_json(&serialization::to_json(&g.prop_delta).unwrap()).unwrap();

    let solver = Solver::new(&registry);
    assert_eq!(
        solver.solve_one(&decoded, &seed(&g)).unwrap(),
        solver.solve_one(&g.prop_delta, &seed(&g)).unwrap()
    );
}

#[test]
fn test_empty_sequences() {
    let g = graph();
    let registry = TransformRegistry::new();
    let cache = Cache::new().with(&g.old_tokens, Value::items(Vec::<String>::new())).with(&g.new_tokens, Value::items(Vec::<String>::new()));

    let out = Solver::new(&registry).solve(&[g.old_ft.clone(), g.prop_delta.clone()], &cache).unwrap();
    assert!(out[&g.old_ft].as_frequencies().unwrap().is_empty());
    assert!(out[&g.prop_delta].as_ratios().unwrap().is_empty());
}

#[test]
fn test_missing_leaf() {
    let g = graph();
    let registry = TransformRegistry::new();
    let cache = Cache::new().with(&g.old_tokens, Value::items(["a"]));

    let err = Solver::new(&registry).solve(&[g.prop_delta.clone()], &cache).unwrap_err();
    assert_eq!(err, SolveError::MissingLeafValue { node: "new_tokens".into() });
}
