use std::fmt;

use serde::{Deserialize, Serialize};

use crate::node::NodeId;

/// Handle returned by [`Registry::subscribe`](crate::Registry::subscribe).
///
/// Each subscription is counted separately: subscribing twice yields two
/// handles, and the node stays active until both are released.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SubscriptionId(pub u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub#{}", self.0)
    }
}

/// Callback invoked with the node that was just fulfilled.
pub type FulfillCallback = Box<dyn FnMut(NodeId)>;

/// The receiving end of a subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Subscriber {
    /// An external callback stored in the registry under the subscription's ID.
    Callback,
    /// A composite watching one of its children.
    Parent {
        /// The composite to re-evaluate.
        composite: NodeId,
        /// Position of the child in the composite's child list.
        slot: usize,
    },
}
