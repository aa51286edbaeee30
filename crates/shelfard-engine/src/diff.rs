//! Structural diff between two schema snapshots
//!
//! Both column trees are walked in parallel and paired by path. A column present
//! on one side only is reported once, at the top of its subtree. Struct and array
//! columns are compared through their children; a column whose type family
//! changed is reported as a single type change and its children are not visited.

use shelfard_core::{Column, ColumnPath, ColumnType, RawChange, Schema, SchemaError, ARRAY_ELEMENT};
use std::collections::{HashMap, HashSet};

/// Compare a baseline schema against the current one.
///
/// The output is sorted by path, then by change kind priority, and is
/// empty when both schemas are structurally identical.
pub fn diff(baseline: &Schema, current: &Schema) -> Vec<RawChange> {
    let mut changes = Vec::new();
    let root = ColumnPath::root();

    if baseline.root.column_type.same_shape(&current.root.column_type) {
        compare_columns(&root, &baseline.root, &current.root, &mut changes);
    } else {
        changes.push(RawChange::ColumnRemoved {
            path: root.clone(),
            column: baseline.root.clone(),
        });
        changes.push(RawChange::ColumnAdded {
            path: root,
            column: current.root.clone(),
        });
    }

    sort_changes(&mut changes);
    changes
}

/// Validate both schemas, then diff them
pub fn try_diff(baseline: &Schema, current: &Schema) -> Result<Vec<RawChange>, SchemaError> {
    baseline.validate()?;
    current.validate()?;
    Ok(diff(baseline, current))
}

/// Sort by path segments, then by kind priority
pub fn sort_changes(changes: &mut [RawChange]) {
    changes.sort_by(|a, b| {
        a.path()
            .cmp(b.path())
            .then_with(|| a.kind().priority().cmp(&b.kind().priority()))
    });
}

fn compare_columns(path: &ColumnPath, old: &Column, new: &Column, out: &mut Vec<RawChange>) {
    if !old.column_type.same_shape(&new.column_type) {
        out.push(RawChange::TypeChanged {
            path: path.clone(),
            old_type: old.column_type.clone(),
            new_type: new.column_type.clone(),
        });
    }

    match (old.nullable, new.nullable) {
        (false, true) => out.push(RawChange::NullabilityRelaxed { path: path.clone() }),
        (true, false) => out.push(RawChange::NullabilityTightened { path: path.clone() }),
        _ => {}
    }

    if old.default != new.default {
        out.push(RawChange::DefaultChanged {
            path: path.clone(),
            old_default: old.default.clone(),
            new_default: new.default.clone(),
        });
    }

    match (&old.column_type, &new.column_type) {
        (ColumnType::Struct { fields: old_fields }, ColumnType::Struct { fields: new_fields }) => {
            compare_fields(path, old_fields, new_fields, out);
        }
        (ColumnType::Array { element: old_element }, ColumnType::Array { element: new_element }) => {
            compare_columns(&path.child(ARRAY_ELEMENT), old_element, new_element, out);
        }
        _ => {}
    }
}

fn compare_fields(path: &ColumnPath, old_fields: &[Column], new_fields: &[Column], out: &mut Vec<RawChange>) {
    let old_by_name: HashMap<&str, &Column> = old_fields.iter().map(|c| (c.name.as_str(), c)).collect();
    let new_by_name: HashMap<&str, &Column> = new_fields.iter().map(|c| (c.name.as_str(), c)).collect();

    for old in old_fields {
        let child_path = path.child(old.name.clone());
        match new_by_name.get(old.name.as_str()) {
            Some(new) => compare_columns(&child_path, old, new, out),
            None => out.push(RawChange::ColumnRemoved {
                path: child_path,
                column: old.clone(),
            }),
        }
    }

    for new in new_fields {
        if !old_by_name.contains_key(new.name.as_str()) {
            out.push(RawChange::ColumnAdded {
                path: path.child(new.name.clone()),
                column: new.clone(),
            });
        }
    }

    detect_reorders(path, old_fields, &new_by_name, out);
}

/// Reorders are judged on the relative order of the columns both sides share, so
/// insertions and removals elsewhere never shift anything. The longest run of
/// shared columns already in order stays put; everything else counts as moved.
fn detect_reorders(
    path: &ColumnPath,
    old_fields: &[Column],
    new_by_name: &HashMap<&str, &Column>,
    out: &mut Vec<RawChange>,
) {
    let mut common: Vec<(&Column, &Column)> = old_fields
        .iter()
        .filter_map(|old| new_by_name.get(old.name.as_str()).map(|new| (old, *new)))
        .collect();

    if common.len() < 2 {
        return;
    }

    // Rank every shared column by its old order, then read the ranks in new order
    common.sort_by_key(|(old, _)| old.position);
    let old_rank: HashMap<&str, usize> = common
        .iter()
        .enumerate()
        .map(|(rank, (old, _))| (old.name.as_str(), rank))
        .collect();

    let mut by_new_order: Vec<&(&Column, &Column)> = common.iter().collect();
    by_new_order.sort_by_key(|(_, new)| new.position);
    let ranks: Vec<usize> = by_new_order
        .iter()
        .map(|(old, _)| old_rank[old.name.as_str()])
        .collect();

    let in_place = longest_increasing_subsequence(&ranks);

    for (rank, (old, new)) in common.iter().enumerate() {
        if !in_place.contains(&rank) {
            out.push(RawChange::ColumnReordered {
                path: path.child(old.name.clone()),
                old_position: old.position,
                new_position: new.position,
            });
        }
    }
}

/// Values forming one longest strictly increasing subsequence (patience sorting)
fn longest_increasing_subsequence(seq: &[usize]) -> HashSet<usize> {
    let mut tails: Vec<usize> = Vec::new();
    let mut prev: Vec<Option<usize>> = vec![None; seq.len()];

    for (i, &value) in seq.iter().enumerate() {
        let slot = tails.partition_point(|&t| seq[t] < value);
        if slot > 0 {
            prev[i] = Some(tails[slot - 1]);
        }
        if slot == tails.len() {
            tails.push(i);
        } else {
            tails[slot] = i;
        }
    }

    let mut kept = HashSet::new();
    let mut cursor = tails.last().copied();
    while let Some(i) = cursor {
        kept.insert(seq[i]);
        cursor = prev[i];
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use shelfard_core::ChangeKind;

    fn schema(columns: Vec<Column>) -> Schema {
        Schema::from_columns("test_table", columns)
    }

    fn kinds(changes: &[RawChange]) -> Vec<(String, ChangeKind)> {
        changes.iter().map(|c| (c.path().to_string(), c.kind())).collect()
    }

    fn create_test_schema() -> Schema {
        schema(vec![
            Column::new("id", ColumnType::Int),
            Column::new("name", ColumnType::bounded_string(40)),
            Column::struct_of(
                "address",
                vec![
                    Column::new("city", ColumnType::bounded_string(20)),
                    Column::new("zip", ColumnType::bounded_string(5)).with_nullable(true),
                ],
            ),
        ])
    }

    #[test]
    fn test_no_drift() {
        let expected = create_test_schema();
        let actual = expected.clone();

        assert!(diff(&expected, &actual).is_empty());
    }

    #[test]
    fn test_dropped_nested_column() {
        let expected = create_test_schema();
        let actual = schema(vec![
            Column::new("id", ColumnType::Int),
            Column::new("name", ColumnType::bounded_string(40)),
            Column::struct_of("address", vec![Column::new("city", ColumnType::bounded_string(20))]),
        ]);

        let changes = diff(&expected, &actual);
        assert_eq!(kinds(&changes), vec![("address.zip".to_string(), ChangeKind::ColumnRemoved)]);
    }

    #[test]
    fn test_removed_struct_is_reported_once() {
        let expected = create_test_schema();
        let actual = schema(vec![
            Column::new("id", ColumnType::Int),
            Column::new("name", ColumnType::bounded_string(40)),
        ]);

        let changes = diff(&expected, &actual);
        assert_eq!(changes.len(), 1);
        match &changes[0] {
            RawChange::ColumnRemoved { path, column } => {
                assert_eq!(path.to_string(), "address");
                assert_eq!(column.children().len(), 2);
            }
            other => panic!("unexpected change {:?}", other),
        }
    }

    #[test]
    fn test_nullability_and_default() {
        let expected = schema(vec![
            Column::new("a", ColumnType::Int),
            Column::new("b", ColumnType::Int).with_nullable(true),
            Column::new("c", ColumnType::Int).with_default(serde_json::json!(0)),
        ]);
        let actual = schema(vec![
            Column::new("a", ColumnType::Int).with_nullable(true),
            Column::new("b", ColumnType::Int),
            Column::new("c", ColumnType::Int).with_default(serde_json::json!(1)),
        ]);

        let changes = diff(&expected, &actual);
        assert_eq!(
            kinds(&changes),
            vec![
                ("a".to_string(), ChangeKind::NullabilityRelaxed),
                ("b".to_string(), ChangeKind::NullabilityTightened),
                ("c".to_string(), ChangeKind::DefaultChanged),
            ]
        );
    }

    #[test]
    fn test_type_and_nullability_on_same_path_are_ordered() {
        let expected = schema(vec![Column::new("id", ColumnType::Int)]);
        let actual = schema(vec![Column::new("id", ColumnType::bounded_string(3)).with_nullable(true)]);

        let changes = diff(&expected, &actual);
        assert_eq!(
            kinds(&changes),
            vec![
                ("id".to_string(), ChangeKind::TypeChanged),
                ("id".to_string(), ChangeKind::NullabilityRelaxed),
            ]
        );
    }

    #[test]
    fn test_array_elements_use_bracket_segment() {
        let expected = schema(vec![Column::array_of("ids", Column::new("id", ColumnType::Int))]);
        let actual = schema(vec![Column::array_of("ids", Column::new("id", ColumnType::BigInt))]);

        let changes = diff(&expected, &actual);
        assert_eq!(kinds(&changes), vec![("ids.[]".to_string(), ChangeKind::TypeChanged)]);
    }

    #[test]
    fn test_family_change_does_not_descend() {
        let expected = schema(vec![Column::array_of("items", Column::new("x", ColumnType::Int))]);
        let actual = schema(vec![Column::struct_of("items", vec![Column::new("x", ColumnType::Int)])]);

        let changes = diff(&expected, &actual);
        assert_eq!(kinds(&changes), vec![("items".to_string(), ChangeKind::TypeChanged)]);
    }

    #[test]
    fn test_root_shape_change() {
        let expected = create_test_schema();
        let actual = Schema::new(
            "test_table",
            2,
            Column::array_of("", Column::struct_of("", vec![Column::new("id", ColumnType::Int)])),
        );

        let changes = diff(&expected, &actual);
        assert_eq!(
            kinds(&changes),
            vec![
                ("$".to_string(), ChangeKind::ColumnRemoved),
                ("$".to_string(), ChangeKind::ColumnAdded),
            ]
        );
    }

    #[test]
    fn test_swap_reports_single_reorder() {
        let expected = schema(vec![
            Column::new("id", ColumnType::Int),
            Column::new("name", ColumnType::bounded_string(4)),
        ]);
        let actual = schema(vec![
            Column::new("name", ColumnType::bounded_string(4)),
            Column::new("id", ColumnType::Int),
        ]);

        let changes = diff(&expected, &actual);
        assert_eq!(changes.len(), 1);
        assert_eq!(
            changes[0],
            RawChange::ColumnReordered {
                path: ColumnPath::parse("name"),
                old_position: 1,
                new_position: 0,
            }
        );
    }

    #[test]
    fn test_insertion_does_not_trigger_reorder() {
        let expected = schema(vec![
            Column::new("a", ColumnType::Int),
            Column::new("b", ColumnType::Int),
            Column::new("c", ColumnType::Int),
        ]);
        let actual = schema(vec![
            Column::new("new", ColumnType::Int).with_nullable(true),
            Column::new("a", ColumnType::Int),
            Column::new("c", ColumnType::Int),
        ]);

        let changes = diff(&expected, &actual);
        assert_eq!(
            kinds(&changes),
            vec![
                ("b".to_string(), ChangeKind::ColumnRemoved),
                ("new".to_string(), ChangeKind::ColumnAdded),
            ]
        );
    }

    #[test]
    fn test_moving_one_column_to_the_front() {
        let expected = schema(vec![
            Column::new("a", ColumnType::Int),
            Column::new("b", ColumnType::Int),
            Column::new("c", ColumnType::Int),
            Column::new("d", ColumnType::Int),
        ]);
        let actual = schema(vec![
            Column::new("d", ColumnType::Int),
            Column::new("a", ColumnType::Int),
            Column::new("b", ColumnType::Int),
            Column::new("c", ColumnType::Int),
        ]);

        let changes = diff(&expected, &actual);
        assert_eq!(kinds(&changes), vec![("d".to_string(), ChangeKind::ColumnReordered)]);
    }

    #[test]
    fn test_output_sorted_by_path() {
        let expected = schema(vec![
            Column::new("zeta", ColumnType::Int),
            Column::struct_of("a", vec![Column::new("y", ColumnType::Int)]),
        ]);
        let actual = schema(vec![
            Column::struct_of("a", vec![Column::new("x", ColumnType::Int).with_nullable(true)]),
            Column::new("beta", ColumnType::Bool).with_nullable(true),
        ]);

        let paths: Vec<String> = diff(&expected, &actual).iter().map(|c| c.path().to_string()).collect();
        assert_eq!(paths, vec!["a.x", "a.y", "beta", "zeta"]);
    }

    #[test]
    fn test_try_diff_rejects_corrupt_schema() {
        let expected = create_test_schema();
        let mut corrupt = create_test_schema();
        if let ColumnType::Struct { fields } = &mut corrupt.root.column_type {
            fields[2].name = "id".to_string();
        }

        let err = try_diff(&expected, &corrupt).unwrap_err();
        assert!(matches!(err, SchemaError::SchemaMismatch { .. }));
    }

    #[test]
    fn test_lis_keeps_longest_ordered_run() {
        let kept = longest_increasing_subsequence(&[3, 0, 1, 2]);
        assert_eq!(kept, HashSet::from([0, 1, 2]));
        assert!(longest_increasing_subsequence(&[]).is_empty());
    }
}
