//! # des-core — data model for the discrete-event simulation kernel
//!
//! This crate defines the vocabulary every other kernel crate builds on:
//! logical time, the event record, the continuation primitive, the entity
//! dispatch contract, and the error taxonomy. It owns no scheduling logic
//! of its own — that lives in `des-kernel`, built on these types the way
//! `des-kernel` depends on `des-core` the way concrete implementations in
//! this codebase depend on their shared protocol crate.
//!
//! ## The Types
//!
//! | Type | What it does |
//! |------|-------------|
//! | [`time::LogicalTime`], [`time::Sequence`] | the `(time, seq)` total order |
//! | [`event::EventRecord`] | one scheduled invocation |
//! | [`continuation::Continuation`] | one-shot rendezvous for blocking calls |
//! | [`entity::EntityDispatch`] | the contract transformed entities satisfy |
//! | [`source::CallerLink`] | optional weak back-link for trace printing |
//! | [`error::SimError`] | the kernel's error taxonomy |
//!
//! ## Dependency Notes
//!
//! Argument and return values cross the `invoke` boundary as
//! `serde_json::Value` ([`value::Value`]) rather than a generic
//! `T: Serialize` — the same choice this codebase's agentic-framework
//! ancestor made for its extension-data fields, for the same reason: it
//! keeps [`entity::EntityDispatch`] object-safe so the kernel can hold
//! `Arc<dyn EntityDispatch>` handles, at the cost of losing static typing
//! at the dispatch boundary (arguments are validated, not type-checked, by
//! the kernel).

#![deny(missing_docs)]

pub mod continuation;
pub mod entity;
pub mod error;
pub mod event;
pub mod ids;
pub mod source;
pub mod time;
pub mod value;

pub use continuation::{Continuation, ContinuationState, Waiter};
pub use entity::{EntityDispatch, MethodKind};
pub use error::{EventError, SimError};
pub use event::{DebugSite, EventRecord};
pub use ids::EventId;
pub use source::CallerLink;
pub use time::{LogicalTime, Sequence, SequenceGenerator};
pub use value::Value;
