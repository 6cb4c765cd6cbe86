//! Deep merging of nested mappings.
//!
//! Nested mappings on both sides are merged recursively; any other value
//! (including arrays) on the overlay side replaces the base value entirely.

use crate::node::Node;
use crate::value::{Table, Value};

/// Merges `overlay` on top of `base`, returning a new mapping.
///
/// Neither input is modified. Overlay values win on conflicting keys.
pub fn merge(base: &Table, overlay: &Table) -> Table {
    let mut merged = base.clone();
    deep_merge(&mut merged, overlay.clone());
    merged
}

/// Merges `overlay` into `base` in place.
///
/// A merged entry keeps the form of the base entry: a wrapped node stays a
/// (new) node, a plain mapping stays a mapping.
pub(crate) fn deep_merge(base: &mut Table, overlay: Table) {
    for (key, value) in overlay {
        let nested = match (base.get(&key).and_then(Value::as_mapping), value.as_mapping()) {
            (Some(mut base_table), Some(overlay_table)) => {
                deep_merge(&mut base_table, overlay_table);
                Some(base_table)
            }
            _ => None,
        };

        let merged = match nested {
            Some(table) if matches!(base.get(&key), Some(Value::Node(_))) => {
                Value::Node(Node::wrap(table))
            }
            Some(table) => Value::Table(table),
            None => value,
        };
        base.insert(key, merged);
    }
}

/// Inserts `value` at the nested `path`, creating intermediate mappings.
///
/// An existing non-mapping value along the path is replaced by a mapping.
pub(crate) fn insert_at_path(table: &mut Table, path: &[String], value: Value) {
    let Some((first, rest)) = path.split_first() else {
        if let Some(overlay) = value.as_mapping() {
            deep_merge(table, overlay);
        }
        return;
    };

    if rest.is_empty() {
        match (table.get(first).and_then(Value::as_mapping), value.as_mapping()) {
            (Some(mut base), Some(overlay)) => {
                deep_merge(&mut base, overlay);
                table.insert(first.clone(), Value::Table(base));
            }
            _ => {
                table.insert(first.clone(), value);
            }
        }
        return;
    }

    if !matches!(table.get(first), Some(Value::Table(_))) {
        let existing = table.get(first).and_then(Value::as_mapping).unwrap_or_default();
        table.insert(first.clone(), Value::Table(existing));
    }

    if let Some(Value::Table(nested)) = table.get_mut(first) {
        insert_at_path(nested, rest, value);
    }
}
