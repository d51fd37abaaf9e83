//! Inspectable snapshots of a condition tree.

use std::fmt::Write as _;

use serde::Serialize;

use crate::compare::ComparisonOp;
use crate::error::{GkError, GkResult};
use crate::node::{Combinator, Node, NodeId};
use crate::registry::Registry;
use crate::value::Value;

/// Snapshot of a node and, recursively, its children.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConditionReport {
    /// The node's handle.
    pub id: NodeId,
    /// The node's label, or its handle when unlabeled.
    pub name: String,
    /// Kind-specific details.
    pub detail: ReportDetail,
    /// Result of [`Registry::evaluate`] at the time of the snapshot.
    pub value: bool,
    /// Number of live subscriptions on the node.
    pub subscribers: usize,
    /// Reports for the node's children, in order.
    pub children: Vec<ConditionReport>,
}

/// Kind-specific part of a [`ConditionReport`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReportDetail {
    /// An event-driven comparison leaf.
    Predicate {
        /// Label of the observed source, `None` when unassigned.
        source: Option<String>,
        /// Comparison operator.
        op: ComparisonOp,
        /// Target value.
        target: Value,
        /// Whether the result is negated.
        inverted: bool,
        /// Whether the predicate is listening on its source.
        listening: bool,
    },
    /// An AND/OR combination.
    Composite {
        /// How children are combined.
        combinator: Combinator,
        /// Whether the result is negated.
        inverted: bool,
    },
    /// A fixed-result leaf.
    Constant,
    /// A child handle that no longer refers to a node.
    Missing,
}

impl Registry {
    /// Build a report for `id` and everything below it.
    pub fn report(&self, id: NodeId) -> GkResult<ConditionReport> {
        if !self.contains(id) {
            return Err(GkError::NodeNotFound(id));
        }
        Ok(self.build_report(id))
    }

    fn build_report(&self, id: NodeId) -> ConditionReport {
        let (detail, children) = match self.node(id) {
            None => (ReportDetail::Missing, Vec::new()),
            Some(Node::Constant(_)) => (ReportDetail::Constant, Vec::new()),
            Some(Node::Predicate(p)) => (
                ReportDetail::Predicate {
                    source: p
                        .source
                        .map(|s| self.source(s).map_or_else(|| s.to_string(), |src| src.label.clone())),
                    op: p.op,
                    target: p.target.clone(),
                    inverted: p.inverted,
                    listening: p.is_listening(),
                },
                Vec::new(),
            ),
            Some(Node::Composite(c)) => (
                ReportDetail::Composite {
                    combinator: c.combinator,
                    inverted: c.inverted,
                },
                c.children.iter().map(|child| self.build_report(*child)).collect(),
            ),
        };
        ConditionReport {
            id,
            name: self.name_of(id),
            detail,
            value: self.node(id).is_some() && self.evaluate(id),
            subscribers: self.subscriber_count(id),
            children,
        }
    }
}

impl ConditionReport {
    /// Render the report as an indented tree, one node per line.
    pub fn render(&self) -> String {
        let mut out = String::new();
        self.render_into(&mut out, 0);
        out.truncate(out.trim_end().len());
        out
    }

    fn render_into(&self, out: &mut String, depth: usize) {
        let mark = if self.value { "x" } else { " " };
        write!(out, "{}[{mark}] {}: ", "  ".repeat(depth), self.name).ok();
        match &self.detail {
            ReportDetail::Predicate {
                source,
                op,
                target,
                inverted,
                ..
            } => {
                let not = if *inverted { "NOT " } else { "" };
                let source = source.as_deref().unwrap_or("<unassigned>");
                write!(out, "{not}{source} {op} {target}").ok();
            }
            ReportDetail::Composite {
                combinator,
                inverted,
            } => {
                let not = if *inverted { "NOT " } else { "" };
                write!(out, "{not}{combinator}").ok();
            }
            ReportDetail::Constant => out.push_str("constant"),
            ReportDetail::Missing => out.push_str("<missing>"),
        }
        if self.subscribers > 0 {
            write!(out, " ({} subscribed)", self.subscribers).ok();
        }
        out.push('\n');
        for child in &self.children {
            child.render_into(out, depth + 1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{Composite, Predicate};
    use crate::value::ValueKind;

    fn quest_gate() -> (Registry, NodeId, NodeId) {
        let mut reg = Registry::new();
        let gold = reg.add_source(ValueKind::Int, "gold");
        let door = reg.add_source(ValueKind::Unit, "door_opened");
        let rich = reg
            .add_predicate(
                Predicate::new(50_i64)
                    .observing(gold)
                    .with_op(ComparisonOp::GreaterOrEqual),
            )
            .unwrap();
        let opened = reg
            .add_predicate(Predicate::new(Value::Unit).observing(door))
            .unwrap();
        let always = reg.add_constant(true);
        let gate = reg
            .add_composite(Composite::all([rich, opened, always]))
            .unwrap();
        reg.set_label(rich, "rich").unwrap();
        reg.set_label(opened, "door").unwrap();
        reg.set_label(always, "always").unwrap();
        reg.set_label(gate, "gate").unwrap();
        (reg, gate, rich)
    }

    #[test]
    fn render_tree() {
        let (mut reg, gate, rich) = quest_gate();
        reg.on_event(rich, Value::Int(80)).unwrap();
        let report = reg.report(gate).unwrap();
        insta::assert_snapshot!(report.render(), @r#"
        [ ] gate: AND
          [x] rich: gold >= 50
          [ ] door: door_opened == ()
          [x] always: constant
        "#);
    }

    #[test]
    fn render_marks_inversion_and_subscriptions() {
        let mut reg = Registry::new();
        let loose = reg
            .add_predicate(Predicate::new(true).inverted(true))
            .unwrap();
        let gate = reg
            .add_composite(Composite::any([loose]).inverted(true))
            .unwrap();
        reg.set_label(loose, "loose").unwrap();
        reg.set_label(gate, "gate").unwrap();
        reg.subscribe(gate, |_| {}).unwrap();

        assert_eq!(
            reg.report(gate).unwrap().render(),
            "[x] gate: NOT OR (1 subscribed)\n  [ ] loose: NOT <unassigned> == true (1 subscribed)"
        );
    }

    #[test]
    fn report_tracks_subscriptions() {
        let (mut reg, gate, rich) = quest_gate();
        reg.subscribe(gate, |_| {}).unwrap();
        let report = reg.report(gate).unwrap();
        assert_eq!(report.subscribers, 1);
        assert_eq!(report.children[0].id, rich);
        assert_eq!(report.children[0].subscribers, 1);
        assert!(matches!(
            report.children[0].detail,
            ReportDetail::Predicate {
                listening: true,
                ..
            }
        ));
        assert_eq!(report.children[2].subscribers, 0);
    }

    #[test]
    fn missing_children_are_reported() {
        let (mut reg, gate, rich) = quest_gate();
        reg.remove(rich).unwrap();
        let report = reg.report(gate).unwrap();
        assert_eq!(report.children[0].detail, ReportDetail::Missing);
        assert!(!report.children[0].value);
        assert!(reg.report(rich).is_err());
    }

    #[test]
    fn report_serializes_to_json() {
        let (reg, gate, _) = quest_gate();
        let json = serde_json::to_value(reg.report(gate).unwrap()).unwrap();
        assert_eq!(json["name"], "gate");
        assert_eq!(json["detail"]["type"], "composite");
        assert_eq!(json["detail"]["combinator"], "and");
        assert_eq!(json["children"][0]["detail"]["op"], "greater_or_equal");
    }
}
