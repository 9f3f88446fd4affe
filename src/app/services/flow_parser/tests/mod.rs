//! Test utilities for flow batch parser testing
//!
//! This module provides common helpers for building JSON-lines batch
//! content used across the parser test modules.

use std::io::Write;
use tempfile::NamedTempFile;


/// Helper to build one well-formed flow entry line
pub fn flow_line(dst_device: &str, dst_port: &str) -> String {
    format!(
        r#"{{"time":118781,"duration":16,"srcdevice":"Comp348305","dstdevice":"{}","protocol":6,"srcport":"Port12597","dstport":"{}","srcpackets":25,"dstpackets":0,"srcbytes":3989,"dstbytes":0}}"#,
        dst_device, dst_port
    )
}

/// Helper to create a complete test batch with a mix of web and non-web flows
pub fn create_test_batch() -> String {
    [
        flow_line("Comp1", "443"),
        flow_line("Comp2", "22"),
        flow_line("Comp1", "80"),
        flow_line("Comp3", "443"),
    ]
    .join("\n")
}

/// Helper to create a temporary batch file with given content
pub fn create_temp_batch(content: &str) -> NamedTempFile {
    let mut temp_file = NamedTempFile::new().unwrap();
    writeln!(temp_file, "{}", content).unwrap();
    temp_file
}
