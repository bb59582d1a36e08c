#![allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]

//! Known-answer tests against published vectors.

mod kat_vectors;
