use std::fmt;

use serde::{Deserialize, Serialize};

use crate::compare::ComparisonOp;
use crate::source::{ListenerId, SourceId};
use crate::subscription::{Subscriber, SubscriptionId};
use crate::value::Value;

/// Handle to a condition node in a [`Registry`](crate::Registry).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

/// Boolean combinator of a composite.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Combinator {
    /// Every child must hold.
    #[default]
    And,
    /// At least one child must hold.
    Or,
}

impl fmt::Display for Combinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::And => write!(f, "AND"),
            Self::Or => write!(f, "OR"),
        }
    }
}

/// An event-driven leaf comparing values raised on a source against a target.
#[derive(Debug, Clone)]
pub struct Predicate {
    /// The source to listen to. `None` leaves the predicate unassigned.
    pub source: Option<SourceId>,
    /// The value observed values are compared against.
    pub target: Value,
    /// The comparison operator.
    pub op: ComparisonOp,
    /// Negate the comparison result.
    pub inverted: bool,
    pub(crate) cached: bool,
    pub(crate) subscribers: Vec<(SubscriptionId, Subscriber)>,
    pub(crate) listener: Option<ListenerId>,
}

impl Predicate {
    /// A predicate testing `observed == target`, not yet attached to a source.
    pub fn new(target: impl Into<Value>) -> Self {
        Self {
            source: None,
            target: target.into(),
            op: ComparisonOp::Equals,
            inverted: false,
            cached: false,
            subscribers: Vec::new(),
            listener: None,
        }
    }

    /// Listen to the given source.
    pub fn observing(mut self, source: SourceId) -> Self {
        self.source = Some(source);
        self
    }

    /// Use the given comparison operator.
    pub fn with_op(mut self, op: ComparisonOp) -> Self {
        self.op = op;
        self
    }

    /// Set whether the result is negated.
    pub fn inverted(mut self, inverted: bool) -> Self {
        self.inverted = inverted;
        self
    }

    /// The last cached result.
    pub fn cached(&self) -> bool {
        self.cached
    }

    /// Whether the predicate currently listens on its source.
    pub fn is_listening(&self) -> bool {
        self.listener.is_some()
    }
}

/// An AND/OR combination of other nodes.
///
/// Children are referenced by handle and may be shared between composites.
#[derive(Debug, Clone, Default)]
pub struct Composite {
    /// The child nodes, in order.
    pub children: Vec<NodeId>,
    /// How child results are combined.
    pub combinator: Combinator,
    /// Negate the combined result.
    pub inverted: bool,
    // Empty unless subscribed; then one entry per child.
    pub(crate) states: Vec<bool>,
    pub(crate) subscribers: Vec<(SubscriptionId, Subscriber)>,
    pub(crate) child_subscriptions: Vec<SubscriptionId>,
}

impl Composite {
    /// A composite with the given combinator and children.
    pub fn new(combinator: Combinator, children: impl IntoIterator<Item = NodeId>) -> Self {
        Self {
            children: children.into_iter().collect(),
            combinator,
            ..Self::default()
        }
    }

    /// An AND composite.
    pub fn all(children: impl IntoIterator<Item = NodeId>) -> Self {
        Self::new(Combinator::And, children)
    }

    /// An OR composite.
    pub fn any(children: impl IntoIterator<Item = NodeId>) -> Self {
        Self::new(Combinator::Or, children)
    }

    /// Set whether the result is negated.
    pub fn inverted(mut self, inverted: bool) -> Self {
        self.inverted = inverted;
        self
    }

    /// The cached per-child states. Empty while unsubscribed.
    pub fn cached_states(&self) -> &[bool] {
        &self.states
    }

    /// Apply the combinator and inversion to a set of child states.
    pub(crate) fn combine(&self, mut states: impl Iterator<Item = bool>) -> bool {
        let combined = match self.combinator {
            Combinator::And => states.all(|s| s),
            Combinator::Or => states.any(|s| s),
        };
        combined != self.inverted
    }
}

/// A condition node owned by the registry.
#[derive(Debug, Clone)]
pub enum Node {
    /// An event-driven comparison leaf.
    Predicate(Predicate),
    /// An AND/OR combination.
    Composite(Composite),
    /// A polled leaf with a fixed result. It cannot be subscribed to.
    Constant(bool),
}

impl Node {
    /// Whether the node supports event-driven subscription.
    pub fn is_event_driven(&self) -> bool {
        !matches!(self, Self::Constant(_))
    }

    /// Short name of the node's kind.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Predicate(_) => "predicate",
            Self::Composite(_) => "composite",
            Self::Constant(_) => "constant",
        }
    }

    pub(crate) fn subscribers(&self) -> &[(SubscriptionId, Subscriber)] {
        match self {
            Self::Predicate(p) => &p.subscribers,
            Self::Composite(c) => &c.subscribers,
            Self::Constant(_) => &[],
        }
    }

    pub(crate) fn subscribers_mut(&mut self) -> Option<&mut Vec<(SubscriptionId, Subscriber)>> {
        match self {
            Self::Predicate(p) => Some(&mut p.subscribers),
            Self::Composite(c) => Some(&mut c.subscribers),
            Self::Constant(_) => None,
        }
    }

    /// Number of live subscriptions on this node.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers().len()
    }
}
