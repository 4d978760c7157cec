//! Argument and return value representation.
//!
//! Boxed/owned argument values need a concrete representation to cross a
//! trait-object boundary. `serde_json::Value` is the de facto interchange
//! format in the Rust agent/service ecosystem, and a concrete (rather than
//! generic `T: Serialize`) type keeps [`crate::entity::EntityDispatch`]
//! object-safe, so the kernel can hold `Arc<dyn EntityDispatch>` handles.

/// A single argument or return value crossing the `invoke` boundary.
pub type Value = serde_json::Value;
