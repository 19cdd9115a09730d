//! Integration tests for the dcp-rs crates.
//!
//! These tests drive the picture pipeline (RGB to XYZ, through a codec and
//! back) and the subtitle assets end to end.

#[cfg(test)]
mod golden;
