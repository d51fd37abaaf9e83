//! Condition graph for Gatekeeper.
//!
//! A [`Registry`] owns typed event sources and condition nodes: event-driven
//! [`Predicate`] leaves that compare raised values against a target, and
//! [`Composite`] nodes that combine other nodes with AND/OR logic. Nodes are
//! addressed by [`NodeId`] handles, so a child may be shared by any number of
//! composites.
//!
//! Subscriptions are reference counted. A node only listens to its inputs
//! while at least one subscriber is attached, and every fulfillment is
//! delivered synchronously, children before parents.

/// Comparison operators and typed comparison.
pub mod compare;
/// Registry configuration.
pub mod config;
/// Error types used throughout the crate.
pub mod error;
/// Condition node types.
pub mod node;
/// The registry that owns nodes and sources.
pub mod registry;
/// Inspectable snapshots of condition trees.
pub mod report;
/// Typed event sources and the [`EventSink`] trait.
pub mod source;
/// Subscription handles and callbacks.
pub mod subscription;
/// Values carried by event sources.
pub mod value;

/// Re-export comparison types.
pub use compare::{ComparisonOp, Tolerance, compare};
/// Re-export configuration.
pub use config::RegistryConfig;
/// Re-export error types.
pub use error::{GkError, GkResult};
/// Re-export node types.
pub use node::{Combinator, Composite, Node, NodeId, Predicate};
/// Re-export the registry.
pub use registry::Registry;
/// Re-export report types.
pub use report::{ConditionReport, ReportDetail};
/// Re-export event source types.
pub use source::{EventSink, EventSource, ListenerId, SourceId};
/// Re-export subscription types.
pub use subscription::SubscriptionId;
/// Re-export value types.
pub use value::{Value, ValueKind};
