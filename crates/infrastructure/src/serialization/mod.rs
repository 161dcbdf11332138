//! Deterministic JSON for files written by the client.
//!
//! Objects keep their key order (`BTreeMap` sources sort it), use 2-space
//! indentation and end with a newline.

mod json;

pub use json::{SerializationError, from_json_bytes, to_json_stable, to_json_stable_bytes};
