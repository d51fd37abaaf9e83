//! Turns a [`Definition`] into a live [`Session`].

use std::collections::{HashMap, HashSet};

use gk_core::{Composite, NodeId, Predicate, RegistryConfig, SourceId, Value, ValueKind};
use gk_flags::Session;
use uuid::Uuid;

use crate::definition::{ConditionDef, Definition, FlagDef};
use crate::error::{ConfigError, ConfigResult};

/// Name lookup for everything a definition declared.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    conditions: Vec<(String, NodeId)>,
    by_condition: HashMap<String, NodeId>,
    events: Vec<(String, SourceId)>,
    by_event: HashMap<String, SourceId>,
    children: HashSet<NodeId>,
}

impl Catalog {
    /// Look up a condition by name.
    pub fn condition(&self, name: &str) -> Option<NodeId> {
        self.by_condition.get(name).copied()
    }

    /// Look up a named event by name.
    pub fn event(&self, name: &str) -> Option<SourceId> {
        self.by_event.get(name).copied()
    }

    /// All conditions in definition order.
    pub fn conditions(&self) -> impl Iterator<Item = (&str, NodeId)> {
        self.conditions.iter().map(|(name, id)| (name.as_str(), *id))
    }

    /// All named events in definition order.
    pub fn events(&self) -> impl Iterator<Item = (&str, SourceId)> {
        self.events.iter().map(|(name, id)| (name.as_str(), *id))
    }

    /// Conditions that are not the child of any composite.
    pub fn roots(&self) -> impl Iterator<Item = (&str, NodeId)> {
        self.conditions().filter(|(_, id)| !self.children.contains(id))
    }

    fn add_condition(&mut self, name: &str, id: NodeId) {
        self.by_condition.insert(name.to_string(), id);
        self.conditions.push((name.to_string(), id));
    }
}

/// A compiled definition: the live session and its name catalog.
#[derive(Debug)]
pub struct Blueprint {
    /// The flags and condition graph.
    pub session: Session,
    /// Names of conditions and events.
    pub catalog: Catalog,
}

impl Blueprint {
    /// Look up a condition by name.
    pub fn condition(&self, name: &str) -> Option<NodeId> {
        self.catalog.condition(name)
    }

    /// Look up a named event by name.
    pub fn event(&self, name: &str) -> Option<SourceId> {
        self.catalog.event(name)
    }
}

/// Compile a definition with the default registry configuration.
pub fn compile(def: &Definition) -> ConfigResult<Blueprint> {
    compile_with(def, RegistryConfig::default())
}

/// Compile a definition into a session.
///
/// Flags are defined first, then named events, then conditions in order.
/// Compilation stops at the first error.
pub fn compile_with(def: &Definition, config: RegistryConfig) -> ConfigResult<Blueprint> {
    let mut session = Session::with_config(config);
    let mut catalog = Catalog::default();

    for flag in &def.flags {
        session_define(&mut session, flag)?;
    }

    for event in &def.events {
        if catalog.by_event.contains_key(&event.name) {
            return Err(ConfigError::DuplicateName {
                section: "event",
                name: event.name.clone(),
            });
        }
        let source = session
            .registry_mut()
            .add_source(event.kind, format!("event:{}", event.name));
        catalog.by_event.insert(event.name.clone(), source);
        catalog.events.push((event.name.clone(), source));
    }

    for condition in &def.conditions {
        let name = condition.name();
        if catalog.condition(name).is_some() {
            return Err(ConfigError::DuplicateName {
                section: "condition",
                name: name.to_string(),
            });
        }
        let id = match condition {
            ConditionDef::Predicate {
                flag,
                event,
                op,
                target,
                inverted,
                ..
            } => {
                let source = match (flag, event) {
                    (Some(_), Some(_)) => {
                        return Err(ConfigError::AmbiguousSource(name.to_string()));
                    }
                    (Some(key), None) => Some(flag_source(&mut session, name, key)?),
                    (None, Some(event)) => Some(catalog.event(event).ok_or_else(|| {
                        ConfigError::UnknownEvent {
                            condition: name.to_string(),
                            event: event.clone(),
                        }
                    })?),
                    (None, None) => {
                        log::warn!("condition {name} observes nothing");
                        None
                    }
                };
                let kind = source
                    .and_then(|s| session.registry().source(s))
                    .map(|s| s.kind);
                let target = target_value(name, kind, target.as_ref())?;
                let mut predicate = Predicate::new(target).with_op(*op).inverted(*inverted);
                if let Some(source) = source {
                    predicate = predicate.observing(source);
                }
                session.registry_mut().add_predicate(predicate)?
            }
            ConditionDef::Composite {
                combinator,
                children,
                inverted,
                ..
            } => {
                let ids = children
                    .iter()
                    .map(|child| {
                        catalog.condition(child).ok_or_else(|| ConfigError::UnknownChild {
                            condition: name.to_string(),
                            child: child.clone(),
                        })
                    })
                    .collect::<ConfigResult<Vec<_>>>()?;
                catalog.children.extend(ids.iter().copied());
                session
                    .registry_mut()
                    .add_composite(Composite::new(*combinator, ids).inverted(*inverted))?
            }
            ConditionDef::Constant { value, .. } => session.registry_mut().add_constant(*value),
        };
        session.registry_mut().set_label(id, name)?;
        catalog.add_condition(name, id);
    }

    log::info!(
        "compiled {} flags, {} events, {} conditions",
        def.flags.len(),
        def.events.len(),
        def.conditions.len()
    );
    Ok(Blueprint { session, catalog })
}

fn session_define(session: &mut Session, flag: &FlagDef) -> ConfigResult<()> {
    match flag {
        FlagDef::Bool { key, default } => session.define_bool(key.clone(), *default)?,
        FlagDef::Int {
            key,
            default,
            min,
            max,
        } => session.define_int(
            key.clone(),
            *default,
            min.unwrap_or(i64::MIN),
            max.unwrap_or(i64::MAX),
        )?,
    }
    Ok(())
}

fn flag_source(session: &mut Session, condition: &str, key: &str) -> ConfigResult<SourceId> {
    if session.flags().flag(key).is_none() {
        return Err(ConfigError::UnknownFlag {
            condition: condition.to_string(),
            flag: key.to_string(),
        });
    }
    Ok(session.flag_source(key)?)
}

/// Interpret a JSON target against the kind of the observed source.
///
/// Without a source the JSON type decides the kind. A missing target means
/// `()` for unit events and `true` for booleans.
fn target_value(
    condition: &str,
    kind: Option<ValueKind>,
    target: Option<&serde_json::Value>,
) -> ConfigResult<Value> {
    use serde_json::Value as Json;

    let invalid = |expected: ValueKind| ConfigError::InvalidTarget {
        condition: condition.to_string(),
        expected,
        found: target.map_or_else(|| "nothing".to_string(), Json::to_string),
    };

    let Some(kind) = kind else {
        return Ok(match target {
            None | Some(Json::Null) => Value::Unit,
            Some(Json::Bool(b)) => Value::Bool(*b),
            Some(Json::Number(n)) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or_default()),
            },
            Some(Json::String(s)) => Value::Text(s.clone()),
            Some(_) => return Err(invalid(ValueKind::Text)),
        });
    };

    match (kind, target) {
        (ValueKind::Unit, None | Some(Json::Null)) => Ok(Value::Unit),
        (ValueKind::Bool, None) => Ok(Value::Bool(true)),
        (ValueKind::Bool, Some(Json::Bool(b))) => Ok(Value::Bool(*b)),
        (ValueKind::Int, Some(Json::Number(n))) => n.as_i64().map(Value::Int).ok_or_else(|| invalid(kind)),
        (ValueKind::Float, Some(Json::Number(n))) => n.as_f64().map(Value::Float).ok_or_else(|| invalid(kind)),
        (ValueKind::Text, Some(Json::String(s))) => Ok(Value::Text(s.clone())),
        (ValueKind::Id, Some(Json::String(s))) => Uuid::parse_str(s).map(Value::Id).map_err(|_| invalid(kind)),
        _ => Err(invalid(kind)),
    }
}
