// src/dataset/mod.rs

pub mod build;
pub mod types;

pub use build::{build_dataset, reconcile_headers, DatasetSpec};
pub use types::{Cell, Column, Dataset};
