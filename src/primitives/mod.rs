//! Core compute primitives.
//!
//! Feature data is stored as a dense row-major [`Matrix`]. Symptom features
//! are binary, but they are kept as `f32` so classifiers can treat them as
//! ordinary numeric columns.

mod matrix;

pub use matrix::Matrix;
