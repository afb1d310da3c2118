use featsync_error::FeatsyncError;
use gherkin::Table;
use std::collections::BTreeMap;

/// Rows keyed by the value in `key_column`; each row maps the remaining
/// headings to their cells. The first row holds the headings. A later row
/// with the same key replaces an earlier one.
pub fn table_to_map(
    table: &Table,
    key_column: &str,
) -> Result<BTreeMap<String, BTreeMap<String, String>>, FeatsyncError> {
    let (headings, rows) = table.rows.split_first().ok_or_else(|| {
        FeatsyncError::malformed_input("table has no heading row")
    })?;
    let key_index = headings.iter().position(|h| h == key_column).ok_or_else(|| {
        FeatsyncError::malformed_input(format!("'{key_column}' is not in the table headings"))
    })?;

    Ok(rows
        .iter()
        .map(|row| {
            let key = row.get(key_index).cloned().unwrap_or_default();
            let rest = headings
                .iter()
                .zip(row)
                .enumerate()
                .filter(|(i, _)| *i != key_index)
                .map(|(_, (h, c))| (h.clone(), c.clone()))
                .collect();
            (key, rest)
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse;

    fn step_table(rows: &str) -> Table {
        let src = format!("Feature: F\n  Scenario: s\n    Given users\n{rows}");
        parse(&src).unwrap().scenarios[0].steps[0]
            .table
            .clone()
            .unwrap()
    }

    #[test]
    fn keys_rows_by_column() {
        let table = step_table(
            "      | user  | role  | locked |\n      | alice | admin | no     |\n      | bob   | qa    | yes    |\n",
        );
        let map = table_to_map(&table, "user").unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(map["bob"]["role"], "qa");
        assert_eq!(map["alice"].len(), 2);
        assert!(!map["alice"].contains_key("user"));
    }

    #[test]
    fn unknown_key_column_is_malformed() {
        let table = step_table("      | a |\n");
        assert!(table_to_map(&table, "b").is_err());
    }
}
