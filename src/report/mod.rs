//! Output rendering for pipeline runs.

pub mod generator;

pub use generator::{render, render_plan};
