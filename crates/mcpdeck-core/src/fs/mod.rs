//! File writing helpers.

pub mod atomic;

pub use atomic::{temp_path_for, write_atomic, write_atomic_checked};
