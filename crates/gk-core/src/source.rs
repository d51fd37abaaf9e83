//! Typed event sources that predicates listen to.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::GkResult;
use crate::node::NodeId;
use crate::value::{Value, ValueKind};

/// Handle to an event source in a [`Registry`](crate::Registry).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SourceId(pub u64);

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "source#{}", self.0)
    }
}

/// Handle to a listener registered on an event source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ListenerId(pub u64);

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listener#{}", self.0)
    }
}

/// Callback invoked with every value raised on a source.
pub type SourceCallback = Box<dyn FnMut(&Value)>;

/// Who receives the values raised on a source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Listener {
    /// A predicate node, fed through `on_event`.
    Predicate(NodeId),
    /// An external callback stored in the registry under the listener's ID.
    Callback,
}

/// A typed channel of values, e.g. "gold changed" or "door opened".
#[derive(Debug, Clone)]
pub struct EventSource {
    /// Human-readable name used in reports and logs.
    pub label: String,
    /// The kind of value this source carries.
    pub kind: ValueKind,
    pub(crate) listeners: Vec<(ListenerId, Listener)>,
}

impl EventSource {
    pub(crate) fn new(label: String, kind: ValueKind) -> Self {
        Self {
            label,
            kind,
            listeners: Vec::new(),
        }
    }

    /// Number of active listeners, predicates included.
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Whether the given predicate is currently listening.
    pub fn has_predicate_listener(&self, node: NodeId) -> bool {
        self.listeners
            .iter()
            .any(|(_, l)| *l == Listener::Predicate(node))
    }
}

/// Anything that can deliver a value to an event source.
///
/// Implemented by [`Registry`](crate::Registry). Stores that own state
/// observed by predicates (such as flag stores) notify through this trait so
/// they do not need to own the registry.
pub trait EventSink {
    /// Raise `value` on `source`, dispatching it to every listener.
    fn raise(&mut self, source: SourceId, value: Value) -> GkResult<()>;
}
