use crate::node::NodeId;
use crate::source::{ListenerId, SourceId};
use crate::subscription::SubscriptionId;
use crate::value::ValueKind;

/// Alias for `Result<T, GkError>`.
pub type GkResult<T> = Result<T, GkError>;

/// Errors returned by the condition registry.
#[derive(Debug, thiserror::Error)]
pub enum GkError {
    /// The node handle does not refer to a live node.
    #[error("node not found: {0}")]
    NodeNotFound(NodeId),

    /// The event source handle does not refer to a live source.
    #[error("event source not found: {0}")]
    SourceNotFound(SourceId),

    /// The subscription handle is unknown or was already released.
    #[error("subscription not found: {0}")]
    SubscriptionNotFound(SubscriptionId),

    /// The listener handle is unknown or was already removed.
    #[error("listener not found: {0}")]
    ListenerNotFound(ListenerId),

    /// A value of the wrong kind was supplied.
    #[error("kind mismatch: expected {expected}, found {found}")]
    KindMismatch {
        /// The kind the receiver accepts.
        expected: ValueKind,
        /// The kind that was supplied.
        found: ValueKind,
    },

    /// The node cannot be subscribed to.
    #[error("node {0} does not support subscriptions")]
    NotSubscribable(NodeId),

    /// The operation only applies to predicates.
    #[error("node {0} is not a predicate")]
    NotAPredicate(NodeId),
}
