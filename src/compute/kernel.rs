use super::error::TransformError;
use crate::store::{DeltaTable, FrequencyTable, Operation, ProportionalDeltaTable, Value};

/// Counts occurrences of each distinct item. Empty input gives an empty table.
pub fn frequency_table(items: &[String]) -> FrequencyTable {
    FrequencyTable::from_items(items)
}

/// `new - old` for every item present in either table; absent counts are 0.
pub fn delta_table(old: &FrequencyTable, new: &FrequencyTable) -> DeltaTable {
    let mut delta = DeltaTable::new();
    for item in old.keys().chain(new.keys()) {
        if delta.contains(item) {
            continue;
        }
        let change = new.get_or(item, 0) as i64 - old.get_or(item, 0) as i64;
        delta.insert(item, change);
    }
    delta
}

/// For each item in `delta`: the raw delta when the item had no original
/// count, otherwise `delta / old` clamped to `[-1, 1]`.
pub fn proportional_delta(old: &FrequencyTable, delta: &DeltaTable) -> ProportionalDeltaTable {
    let mut ratios = ProportionalDeltaTable::new();
    for (item, change) in delta.iter() {
        let baseline = old.get_or(item, 0);
        let ratio = if baseline == 0 {
            change as f64
        } else {
            (change as f64 / baseline as f64).clamp(-1.0, 1.0)
        };
        ratios.insert(item, ratio);
    }
    ratios
}

/// Evaluates a built-in operation over its dependency values (in declared order).
pub fn execute(op: &Operation, inputs: &[Value]) -> Result<Value, TransformError> {
    match op {
        Operation::Table => {
            expect_arity(inputs, 1)?;
            let items = expect(inputs, 0, "items", Value::as_items)?;
            Ok(frequency_table(items).into())
        }
        Operation::Delta => {
            expect_arity(inputs, 2)?;
            let old = expect(inputs, 0, "frequencies", Value::as_frequencies)?;
            let new = expect(inputs, 1, "frequencies", Value::as_frequencies)?;
            Ok(delta_table(old, new).into())
        }
        Operation::ProportionalDelta => {
            expect_arity(inputs, 2)?;
            let old = expect(inputs, 0, "frequencies", Value::as_frequencies)?;
            let delta = expect(inputs, 1, "deltas", Value::as_deltas)?;
            Ok(proportional_delta(old, delta).into())
        }
        Operation::Custom { tag } => Err(TransformError::Failed(format!(
            "'{}' is not a built-in operation",
            tag
        ))),
    }
}

pub(crate) fn expect_arity(inputs: &[Value], expected: usize) -> Result<(), TransformError> {
    if inputs.len() != expected {
        return Err(TransformError::ArityMismatch { expected, actual: inputs.len() });
    }
    Ok(())
}

pub(crate) fn expect<'a, T: ?Sized>(
    inputs: &'a [Value],
    position: usize,
    expected: &'static str,
    accessor: impl Fn(&'a Value) -> Option<&'a T>,
) -> Result<&'a T, TransformError> {
    let value = &inputs[position];
    accessor(value).ok_or(TransformError::TypeMismatch {
        position,
        expected,
        found: value.kind_name(),
    })
}
