// src/filesystem/mod.rs

//! Filesystem helpers shared by snapshot and restore
//!
//! Both steps copy whole directory trees; they differ only in how a failing
//! entry is treated, which is expressed as a [`FailurePolicy`].

mod copy;

pub use copy::{copy_tree, is_unexpected, CopyStats, FailurePolicy};
