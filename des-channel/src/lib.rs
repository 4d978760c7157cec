//! # des-channel — rendezvous channels
//!
//! A bounded, zero-capacity synchronous channel typed `T`, usable from
//! inside event bodies: `put` blocks until a matching `take` is ready, and
//! vice versa. Built directly on [`des_kernel::Kernel::park_on`] and
//! `des_core::Continuation` rather than on the entity-dispatch contract —
//! a rendezvous never invokes anyone's `invoke`, so there is no need to
//! round-trip through `des_core::Value` the way posted events do.

#![deny(missing_docs)]

mod channel;

pub use channel::Channel;
