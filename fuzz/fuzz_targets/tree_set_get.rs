//! Fuzz harness for path writes into issue documents.
//!
//! A successful write must be readable back at the same path.

#![no_main]

use libfuzzer_sys::fuzz_target;
use serde_json::{Value, json};

fuzz_target!(|input: (String, String)| {
    let (doc, path) = input;
    let mut tree: Value = serde_json::from_str(&doc).unwrap_or_else(|_| json!({}));
    let marker = json!({"fuzz": path.len()});
    if featsync_tree::set(&mut tree, &path, marker.clone()).is_ok() {
        assert_eq!(featsync_tree::get(&tree, &path), Some(&marker));
    }
});
