//! Property tests for featsync-gherkin
//!
//! Fixed-width tables: every line has the same shape and every cell is padded
//! to the widest member of its column.

use featsync_gherkin::{parse, render_rows};
use proptest::prelude::*;

fn cell() -> impl Strategy<Value = String> {
    "[a-z0-9]{1,8}"
}

/// A heading row followed by zero or more rows of the same width.
fn rows() -> impl Strategy<Value = Vec<Vec<String>>> {
    (1usize..5).prop_flat_map(|cols| {
        proptest::collection::vec(proptest::collection::vec(cell(), cols), 1..6)
    })
}

proptest! {
    /// All lines have equal length and end with " |".
    #[test]
    fn prop_lines_are_aligned(t in rows()) {
        let rendered = render_rows(&t);
        let lines: Vec<&str> = rendered.lines().collect();
        prop_assert_eq!(lines.len(), t.len());
        let width = lines[0].len();
        for line in &lines {
            prop_assert!(line.starts_with(" | "));
            prop_assert!(line.ends_with(" |"));
            prop_assert_eq!(line.len(), width);
        }
    }

    /// A rendered table read back as a step table gives the same cells.
    #[test]
    fn prop_rendered_table_reads_back(t in rows()) {
        let mut src = String::from("Feature: F\n  Scenario: s\n    Given rows\n");
        for line in render_rows(&t).lines() {
            src.push_str("     ");
            src.push_str(line.trim_start());
            src.push('\n');
        }
        let feature = parse(&src).unwrap();
        let read = feature.scenarios[0].steps[0].table.clone().unwrap();
        prop_assert_eq!(read.rows, t);
    }
}
