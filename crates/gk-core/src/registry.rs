//! The arena that owns every node and event source, and the subscription
//! engine that wires them together.
//!
//! All dispatch is synchronous and depth-first. A predicate that becomes
//! true notifies its subscribers in registration order; when one of those
//! subscribers is a composite, the composite re-evaluates and notifies its
//! own subscribers before the predicate moves on to the next one.

use std::collections::HashMap;
use std::fmt;

use crate::compare::compare_with;
use crate::config::RegistryConfig;
use crate::error::{GkError, GkResult};
use crate::node::{Composite, Node, NodeId, Predicate};
use crate::source::{EventSink, EventSource, Listener, ListenerId, SourceCallback, SourceId};
use crate::subscription::{FulfillCallback, Subscriber, SubscriptionId};
use crate::value::{Value, ValueKind};

/// Owns condition nodes and event sources, addressed by handles.
pub struct Registry {
    config: RegistryConfig,
    next_id: u64,
    nodes: HashMap<NodeId, Node>,
    labels: HashMap<NodeId, String>,
    sources: HashMap<SourceId, EventSource>,

    // Subscriptions and listeners
    callbacks: HashMap<SubscriptionId, FulfillCallback>,
    subscription_owners: HashMap<SubscriptionId, NodeId>,
    source_callbacks: HashMap<ListenerId, SourceCallback>,
    listener_owners: HashMap<ListenerId, SourceId>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("config", &self.config)
            .field("nodes", &self.nodes.len())
            .field("sources", &self.sources.len())
            .field("subscriptions", &self.subscription_owners.len())
            .finish()
    }
}

impl Registry {
    /// Create an empty registry with the default configuration.
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    /// Create an empty registry with the given configuration.
    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            config,
            next_id: 1,
            nodes: HashMap::new(),
            labels: HashMap::new(),
            sources: HashMap::new(),
            callbacks: HashMap::new(),
            subscription_owners: HashMap::new(),
            source_callbacks: HashMap::new(),
            listener_owners: HashMap::new(),
        }
    }

    /// The registry's configuration.
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    fn next_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    // -----------------------------------------------------------------------
    // Event sources
    // -----------------------------------------------------------------------

    /// Create an event source carrying values of `kind`.
    pub fn add_source(&mut self, kind: ValueKind, label: impl Into<String>) -> SourceId {
        let id = SourceId(self.next_id());
        self.sources.insert(id, EventSource::new(label.into(), kind));
        id
    }

    /// Get an event source by handle.
    pub fn source(&self, id: SourceId) -> Option<&EventSource> {
        self.sources.get(&id)
    }

    /// Number of listeners on a source. Zero for unknown sources.
    pub fn listener_count(&self, id: SourceId) -> usize {
        self.sources.get(&id).map_or(0, EventSource::listener_count)
    }

    /// Register an external callback receiving every value raised on `source`.
    pub fn add_listener(
        &mut self,
        source: SourceId,
        callback: impl FnMut(&Value) + 'static,
    ) -> GkResult<ListenerId> {
        if !self.sources.contains_key(&source) {
            return Err(GkError::SourceNotFound(source));
        }
        let id = ListenerId(self.next_id());
        if let Some(src) = self.sources.get_mut(&source) {
            src.listeners.push((id, Listener::Callback));
        }
        self.listener_owners.insert(id, source);
        self.source_callbacks.insert(id, Box::new(callback));
        Ok(id)
    }

    /// Remove a callback registered with [`add_listener`](Self::add_listener).
    pub fn remove_listener(&mut self, listener: ListenerId) -> GkResult<()> {
        if self.source_callbacks.remove(&listener).is_none() {
            return Err(GkError::ListenerNotFound(listener));
        }
        self.drop_listener(listener);
        Ok(())
    }

    fn drop_listener(&mut self, listener: ListenerId) {
        let Some(source) = self.listener_owners.remove(&listener) else {
            return;
        };
        if let Some(src) = self.sources.get_mut(&source) {
            src.listeners.retain(|(id, _)| *id != listener);
        }
    }

    /// Raise `value` on `source`, dispatching it to every listener in
    /// registration order.
    pub fn raise(&mut self, source: SourceId, value: Value) -> GkResult<()> {
        let src = self
            .sources
            .get(&source)
            .ok_or(GkError::SourceNotFound(source))?;
        if value.kind() != src.kind {
            return Err(GkError::KindMismatch {
                expected: src.kind,
                found: value.kind(),
            });
        }
        log::trace!("raise {} = {value}", src.label);

        let listeners = src.listeners.clone();
        for (id, listener) in listeners {
            match listener {
                Listener::Predicate(node) => self.deliver(node, &value),
                Listener::Callback => {
                    if let Some(callback) = self.source_callbacks.get_mut(&id) {
                        callback(&value);
                    }
                }
            }
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Nodes
    // -----------------------------------------------------------------------

    /// Add a predicate. Its target must match the kind of its source.
    pub fn add_predicate(&mut self, mut predicate: Predicate) -> GkResult<NodeId> {
        if let Some(source) = predicate.source {
            let src = self
                .sources
                .get(&source)
                .ok_or(GkError::SourceNotFound(source))?;
            if src.kind != predicate.target.kind() {
                return Err(GkError::KindMismatch {
                    expected: src.kind,
                    found: predicate.target.kind(),
                });
            }
        }
        predicate.cached = false;
        predicate.subscribers.clear();
        predicate.listener = None;

        let id = NodeId(self.next_id());
        self.nodes.insert(id, Node::Predicate(predicate));
        Ok(id)
    }

    /// Add a composite. Every child must already exist.
    pub fn add_composite(&mut self, mut composite: Composite) -> GkResult<NodeId> {
        if let Some(missing) = composite
            .children
            .iter()
            .find(|child| !self.nodes.contains_key(child))
        {
            return Err(GkError::NodeNotFound(*missing));
        }
        composite.states.clear();
        composite.subscribers.clear();
        composite.child_subscriptions.clear();

        let id = NodeId(self.next_id());
        self.nodes.insert(id, Node::Composite(composite));
        Ok(id)
    }

    /// Add a polled node with a fixed result.
    pub fn add_constant(&mut self, value: bool) -> NodeId {
        let id = NodeId(self.next_id());
        self.nodes.insert(id, Node::Constant(value));
        id
    }

    /// Attach a human-readable name to a node, used in reports and logs.
    pub fn set_label(&mut self, id: NodeId, label: impl Into<String>) -> GkResult<()> {
        if !self.nodes.contains_key(&id) {
            return Err(GkError::NodeNotFound(id));
        }
        self.labels.insert(id, label.into());
        Ok(())
    }

    /// The label attached to a node, if any.
    pub fn label(&self, id: NodeId) -> Option<&str> {
        self.labels.get(&id).map(String::as_str)
    }

    /// Get a node by handle.
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    /// Whether the handle refers to a live node.
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// All live node handles in creation order.
    pub fn node_ids(&self) -> Vec<NodeId> {
        let mut ids: Vec<NodeId> = self.nodes.keys().copied().collect();
        ids.sort();
        ids
    }

    /// Number of live nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Remove a node, releasing every subscription on it and every
    /// subscription it holds on its children or source.
    ///
    /// Composites that reference the removed node keep their handle and
    /// treat it as unsatisfied from then on.
    pub fn remove(&mut self, id: NodeId) -> GkResult<Node> {
        let node = self.nodes.get_mut(&id).ok_or(GkError::NodeNotFound(id))?;
        let released = node.subscribers().to_vec();
        if let Some(list) = node.subscribers_mut() {
            list.clear();
        }
        for (sub, subscriber) in &released {
            self.callbacks.remove(sub);
            self.subscription_owners.remove(sub);
            // A removed child no longer counts towards its parents.
            if let Subscriber::Parent { composite, slot } = *subscriber {
                let state = match self.nodes.get_mut(&composite) {
                    Some(Node::Composite(c)) => c.states.get_mut(slot),
                    _ => None,
                };
                if let Some(state) = state {
                    *state = false;
                }
            }
        }
        if !released.is_empty() {
            self.deactivate(id);
        }

        self.labels.remove(&id);
        let node = self.nodes.remove(&id).ok_or(GkError::NodeNotFound(id))?;
        log::debug!("removed {id} ({} subscriptions released)", released.len());
        Ok(node)
    }

    // -----------------------------------------------------------------------
    // Evaluation
    // -----------------------------------------------------------------------

    /// Evaluate a node.
    ///
    /// Predicates return their cached result. Composites use their cached
    /// child states while subscribed and pull every child's result
    /// otherwise. Missing nodes evaluate to `false`.
    pub fn evaluate(&self, id: NodeId) -> bool {
        match self.nodes.get(&id) {
            None => {
                self.warn_missing(format_args!("evaluating missing {id}"));
                false
            }
            Some(Node::Constant(value)) => *value,
            Some(Node::Predicate(p)) => p.cached,
            Some(Node::Composite(c)) => {
                if c.children.is_empty() {
                    return !c.inverted;
                }
                if c.subscribers.is_empty() {
                    c.combine(c.children.iter().map(|child| self.evaluate(*child)))
                } else {
                    c.combine(c.states.iter().copied())
                }
            }
        }
    }

    /// Deliver a value to a predicate as if its source had raised it.
    pub fn on_event(&mut self, id: NodeId, value: Value) -> GkResult<()> {
        match self.nodes.get(&id) {
            Some(Node::Predicate(_)) => {
                self.deliver(id, &value);
                Ok(())
            }
            Some(_) => Err(GkError::NotAPredicate(id)),
            None => Err(GkError::NodeNotFound(id)),
        }
    }

    fn deliver(&mut self, id: NodeId, value: &Value) {
        let tolerance = self.config.tolerance;
        let fulfilled = match self.nodes.get_mut(&id) {
            Some(Node::Predicate(p)) => {
                p.cached = compare_with(value, &p.target, p.op, &tolerance) != p.inverted;
                p.cached
            }
            _ => return,
        };
        log::trace!("{} <- {value}: {fulfilled}", self.name_of(id));
        if fulfilled {
            self.notify(id);
        }
    }

    fn notify(&mut self, id: NodeId) {
        let subscribers = match self.nodes.get(&id) {
            Some(node) => node.subscribers().to_vec(),
            None => return,
        };
        for (sub, subscriber) in subscribers {
            match subscriber {
                Subscriber::Callback => {
                    if let Some(callback) = self.callbacks.get_mut(&sub) {
                        callback(id);
                    }
                }
                Subscriber::Parent { composite, slot } => self.child_fulfilled(composite, slot),
            }
        }
    }

    fn child_fulfilled(&mut self, composite: NodeId, slot: usize) {
        match self.nodes.get_mut(&composite) {
            Some(Node::Composite(c)) => match c.states.get_mut(slot) {
                Some(state) => *state = true,
                None => return,
            },
            _ => return,
        }
        if self.evaluate(composite) {
            log::debug!("{} fulfilled", self.name_of(composite));
            self.notify(composite);
        }
    }

    // -----------------------------------------------------------------------
    // Subscriptions
    // -----------------------------------------------------------------------

    /// Subscribe to a node's fulfillment.
    ///
    /// The callback runs every time the node is fulfilled while the
    /// subscription is live. The first subscription on a node activates
    /// it: predicates reset their cached result and start listening on
    /// their source; composites snapshot their children and subscribe to
    /// every event-driven child.
    pub fn subscribe(
        &mut self,
        id: NodeId,
        callback: impl FnMut(NodeId) + 'static,
    ) -> GkResult<SubscriptionId> {
        let sub = self.attach(id, Subscriber::Callback)?;
        self.callbacks.insert(sub, Box::new(callback));
        Ok(sub)
    }

    /// Release a subscription. The last release on a node deactivates it.
    pub fn unsubscribe(&mut self, sub: SubscriptionId) -> GkResult<()> {
        if self.callbacks.remove(&sub).is_none() {
            return Err(GkError::SubscriptionNotFound(sub));
        }
        self.detach(sub)
    }

    /// Number of live subscriptions on a node, internal ones included.
    pub fn subscriber_count(&self, id: NodeId) -> usize {
        self.nodes.get(&id).map_or(0, Node::subscriber_count)
    }

    /// Whether anything is subscribed to the node.
    pub fn is_subscribed(&self, id: NodeId) -> bool {
        self.subscriber_count(id) > 0
    }

    fn attach(&mut self, id: NodeId, subscriber: Subscriber) -> GkResult<SubscriptionId> {
        let sub = SubscriptionId(self.next_id());
        let list = self
            .nodes
            .get_mut(&id)
            .ok_or(GkError::NodeNotFound(id))?
            .subscribers_mut()
            .ok_or(GkError::NotSubscribable(id))?;
        list.push((sub, subscriber));
        let first = list.len() == 1;
        self.subscription_owners.insert(sub, id);
        if first {
            self.activate(id);
        }
        Ok(sub)
    }

    fn detach(&mut self, sub: SubscriptionId) -> GkResult<()> {
        let owner = self
            .subscription_owners
            .remove(&sub)
            .ok_or(GkError::SubscriptionNotFound(sub))?;
        let Some(list) = self.nodes.get_mut(&owner).and_then(Node::subscribers_mut) else {
            return Ok(());
        };
        list.retain(|(s, _)| *s != sub);
        if list.is_empty() {
            self.deactivate(owner);
        }
        Ok(())
    }

    fn activate(&mut self, id: NodeId) {
        match self.nodes.get(&id) {
            Some(Node::Predicate(_)) => self.activate_predicate(id),
            Some(Node::Composite(_)) => self.activate_composite(id),
            _ => {}
        }
    }

    fn activate_predicate(&mut self, id: NodeId) {
        let source = match self.nodes.get_mut(&id) {
            Some(Node::Predicate(p)) => {
                p.cached = false;
                p.source
            }
            _ => return,
        };
        let Some(source) = source else {
            self.warn_missing(format_args!("{} has no event source", self.name_of(id)));
            return;
        };

        let listener = ListenerId(self.next_id());
        match self.sources.get_mut(&source) {
            Some(src) => src.listeners.push((listener, Listener::Predicate(id))),
            None => {
                self.warn_missing(format_args!("{} listens on missing {source}", self.name_of(id)));
                return;
            }
        }
        self.listener_owners.insert(listener, source);
        if let Some(Node::Predicate(p)) = self.nodes.get_mut(&id) {
            p.listener = Some(listener);
        }
        log::debug!("{} listening on {source}", self.name_of(id));
    }

    fn activate_composite(&mut self, id: NodeId) {
        let children = match self.nodes.get(&id) {
            Some(Node::Composite(c)) => c.children.clone(),
            _ => return,
        };

        let states: Vec<bool> = children.iter().map(|child| self.evaluate(*child)).collect();
        if let Some(Node::Composite(c)) = self.nodes.get_mut(&id) {
            c.states = states;
        }

        let mut child_subscriptions = Vec::new();
        for (slot, child) in children.iter().enumerate() {
            match self.nodes.get(child) {
                Some(node) if node.is_event_driven() => {}
                Some(_) => continue,
                None => {
                    self.warn_missing(format_args!(
                        "{} has missing child {child}",
                        self.name_of(id)
                    ));
                    continue;
                }
            }
            match self.attach(*child, Subscriber::Parent { composite: id, slot }) {
                Ok(sub) => child_subscriptions.push(sub),
                Err(e) => log::warn!("{} could not watch {child}: {e}", self.name_of(id)),
            }
        }
        if let Some(Node::Composite(c)) = self.nodes.get_mut(&id) {
            c.child_subscriptions = child_subscriptions;
        }
        log::debug!("{} subscribed to its children", self.name_of(id));
    }

    fn deactivate(&mut self, id: NodeId) {
        match self.nodes.get_mut(&id) {
            Some(Node::Predicate(p)) => {
                if let Some(listener) = p.listener.take() {
                    self.drop_listener(listener);
                    log::debug!("{} stopped listening", self.name_of(id));
                }
            }
            Some(Node::Composite(c)) => {
                c.states.clear();
                let released = std::mem::take(&mut c.child_subscriptions);
                for sub in released {
                    // Already gone if the child was removed.
                    if let Err(e) = self.detach(sub) {
                        log::trace!("{e}");
                    }
                }
                log::debug!("{} unsubscribed from its children", self.name_of(id));
            }
            _ => {}
        }
    }

    // -----------------------------------------------------------------------
    // Debugging
    // -----------------------------------------------------------------------

    /// Drive a node towards fulfillment.
    ///
    /// A predicate raises its target on its source; if it is not listening
    /// the value is also delivered to it directly. A composite forces every
    /// event-driven child, which does not guarantee the composite itself
    /// becomes true. Predicates without a source are left untouched.
    pub fn force_fulfill(&mut self, id: NodeId) -> GkResult<()> {
        match self.nodes.get(&id).ok_or(GkError::NodeNotFound(id))? {
            Node::Predicate(p) => {
                let Some(source) = p.source else {
                    self.warn_missing(format_args!(
                        "cannot force {}: no event source",
                        self.name_of(id)
                    ));
                    return Ok(());
                };
                let target = p.target.clone();
                let listening = p.listener.is_some();
                log::debug!("forcing {} with {target}", self.name_of(id));
                self.raise(source, target.clone())?;
                if !listening {
                    self.deliver(id, &target);
                }
                Ok(())
            }
            Node::Composite(c) => {
                let children = c.children.clone();
                for child in children {
                    match self.nodes.get(&child).map(Node::is_event_driven) {
                        Some(true) => self.force_fulfill(child)?,
                        Some(false) => {}
                        None => self.warn_missing(format_args!(
                            "cannot force missing child {child} of {}",
                            self.name_of(id)
                        )),
                    }
                }
                Ok(())
            }
            Node::Constant(_) => Ok(()),
        }
    }

    /// The node's label, or its handle when unlabeled.
    pub fn name_of(&self, id: NodeId) -> String {
        self.labels
            .get(&id)
            .cloned()
            .unwrap_or_else(|| id.to_string())
    }

    fn warn_missing(&self, message: fmt::Arguments<'_>) {
        if self.config.warn_on_missing {
            log::warn!("{message}");
        }
    }
}

impl EventSink for Registry {
    fn raise(&mut self, source: SourceId, value: Value) -> GkResult<()> {
        Registry::raise(self, source, value)
    }
}
