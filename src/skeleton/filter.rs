use std::collections::{BTreeMap, BTreeSet};

use super::table::{AttributeTable, AttributeValue};

// ---------------------------------------------------------------------------
// Selection predicate: which unique values are selected per column
// ---------------------------------------------------------------------------

/// Per-column selection state: maps column_name → set of selected values.
/// A column absent from the map places no constraint on rows.
pub type SelectionState = BTreeMap<String, BTreeSet<AttributeValue>>;

/// Initialise a [`SelectionState`] with every value of every column selected.
pub fn init_selection(table: &AttributeTable) -> SelectionState {
    table
        .column_names()
        .iter()
        .filter_map(|name| Some((name.clone(), table.unique_values(name)?)))
        .collect()
}

/// Return indices of rows (entities) that pass all selections.
///
/// A row passes a column selection when:
/// * The column is not present in `selection` → passes (no constraint)
/// * The selected set for that column is empty → nothing selected → fails
/// * The row's value for that column is in the selected set → passes
///
/// A selection naming a column the table does not have rejects every row.
pub fn selected_indices(table: &AttributeTable, selection: &SelectionState) -> Vec<usize> {
    // Resolve each active constraint to its column once.
    let mut constraints = Vec::new();
    for (name, selected) in selection {
        if selected.is_empty() {
            return Vec::new();
        }
        let Some(column) = table.column(name) else {
            return Vec::new();
        };
        if let Some(all_vals) = table.unique_values(name) {
            if all_vals.is_subset(selected) {
                continue; // everything selected, no filtering needed
            }
        }
        constraints.push((column, selected));
    }

    (0..table.n_rows())
        .filter(|&row| {
            constraints
                .iter()
                .all(|(column, selected)| selected.contains(&column[row]))
        })
        .collect()
}

/// Rows whose numeric value in `column` lies in `[lo, hi]`.
pub fn indices_in_range(table: &AttributeTable, column: &str, lo: f64, hi: f64) -> Vec<usize> {
    let Some(values) = table.column(column) else {
        return Vec::new();
    };
    values
        .iter()
        .enumerate()
        .filter(|(_, v)| v.as_f64().is_some_and(|x| x >= lo && x <= hi))
        .map(|(i, _)| i)
        .collect()
}
