//! Operator-facing output (terminal dashboard).

pub mod console;
