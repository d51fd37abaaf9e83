//! World-state flags for Gatekeeper.
//!
//! A [`FlagStore`] holds named boolean and bounded integer values. Each flag
//! can be bound to an event source in a [`gk_core::Registry`]; writes that
//! change a flag raise the new value there, so condition predicates observe
//! flags exactly like any other event. [`Session`] bundles a store and a
//! registry for hosts that want both.

/// Error types for the flag store.
pub mod error;
/// Flag definitions and values.
pub mod flag;
/// The registry/store pairing.
pub mod session;
/// Flag storage.
pub mod store;

pub use error::{FlagError, FlagResult};
pub use flag::{Flag, FlagKind, FlagValue};
pub use session::Session;
pub use store::{FlagSnapshot, FlagStore};
