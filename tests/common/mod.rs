//! Shared helpers for integration tests.
//!
//! Each test binary compiles its own copy, so not every helper is used
//! everywhere.
#![allow(dead_code)]

pub mod fixtures;
