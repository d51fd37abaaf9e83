use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

use colored::Colorize;
use gk_config::Blueprint;
use gk_core::{ConditionReport, NodeId};
use gk_flags::{FlagKind, FlagValue};

use super::split_assignment;

/// Flag writes run first, then raised events, then forced conditions.
pub struct Actions {
    pub sets: Vec<String>,
    pub raises: Vec<String>,
    pub forces: Vec<String>,
    pub watches: Vec<String>,
}

pub fn run(file: &Path, actions: &Actions, json: bool) -> Result<(), String> {
    let mut blueprint = super::load(file)?;

    let watched = watched_conditions(&blueprint, &actions.watches)?;
    let fulfilled = Rc::new(RefCell::new(Vec::new()));
    for &id in &watched {
        let is_event_driven = blueprint
            .session
            .registry()
            .node(id)
            .is_some_and(|node| node.is_event_driven());
        if !is_event_driven {
            continue;
        }
        let log = Rc::clone(&fulfilled);
        blueprint
            .session
            .registry_mut()
            .subscribe(id, move |node| log.borrow_mut().push(node))
            .map_err(|e| e.to_string())?;
    }

    blueprint
        .session
        .publish_flags()
        .map_err(|e| e.to_string())?;

    for arg in &actions.sets {
        set_flag(&mut blueprint, arg)?;
    }
    for arg in &actions.raises {
        raise_event(&mut blueprint, arg)?;
    }
    for name in &actions.forces {
        let id = condition(&blueprint, name)?;
        blueprint
            .session
            .registry_mut()
            .force_fulfill(id)
            .map_err(|e| e.to_string())?;
    }

    let registry = blueprint.session.registry();
    let fired: Vec<String> = fulfilled
        .borrow()
        .iter()
        .map(|id| registry.name_of(*id))
        .collect();
    let reports = watched
        .iter()
        .map(|id| registry.report(*id))
        .collect::<Result<Vec<ConditionReport>, _>>()
        .map_err(|e| e.to_string())?;

    if json {
        let out = serde_json::json!({
            "fulfilled": fired,
            "flags": blueprint.session.flags().snapshot(),
            "conditions": reports,
        });
        let text = serde_json::to_string_pretty(&out).map_err(|e| e.to_string())?;
        println!("{text}");
        return Ok(());
    }

    println!("  {}", "Fulfilled".bold().underline());
    if fired.is_empty() {
        println!("  {}", "(none)".dimmed());
    }
    for name in &fired {
        println!("  {} {name}", "*".green().bold());
    }
    println!();

    println!("  {}", "Conditions".bold().underline());
    for report in &reports {
        for line in report.render().lines() {
            let line = if line.trim_start().starts_with("[x]") {
                line.green()
            } else {
                line.normal()
            };
            println!("  {line}");
        }
    }

    let flags = blueprint.session.flags();
    if !flags.is_empty() {
        println!();
        println!("  {}", "Flags".bold().underline());
        for flag in flags.iter() {
            println!("  {} = {}", flag.key(), flag.value());
        }
    }

    Ok(())
}

fn condition(blueprint: &Blueprint, name: &str) -> Result<NodeId, String> {
    blueprint
        .condition(name)
        .ok_or_else(|| format!("unknown condition: \"{name}\""))
}

fn watched_conditions(blueprint: &Blueprint, names: &[String]) -> Result<Vec<NodeId>, String> {
    if names.is_empty() {
        return Ok(blueprint.catalog.roots().map(|(_, id)| id).collect());
    }
    names.iter().map(|name| condition(blueprint, name)).collect()
}

fn set_flag(blueprint: &mut Blueprint, arg: &str) -> Result<(), String> {
    let (key, text) = split_assignment(arg);
    let text = text.ok_or_else(|| format!("expected KEY=VALUE, got \"{arg}\""))?;
    let kind = blueprint
        .session
        .flags()
        .flag(key)
        .map(|flag| flag.kind())
        .ok_or_else(|| format!("unknown flag: {key}"))?;
    let value = match kind {
        FlagKind::Bool => text.trim().parse().map(FlagValue::Bool).ok(),
        FlagKind::Int => text.trim().parse().map(FlagValue::Int).ok(),
    }
    .ok_or_else(|| format!("flag {key} expects a {kind} value, got \"{text}\""))?;

    blueprint
        .session
        .set_flag(key, value)
        .map_err(|e| e.to_string())?;
    Ok(())
}

fn raise_event(blueprint: &mut Blueprint, arg: &str) -> Result<(), String> {
    let (name, text) = split_assignment(arg);
    let source = blueprint
        .event(name)
        .ok_or_else(|| format!("unknown event: \"{name}\""))?;
    let kind = blueprint
        .session
        .registry()
        .source(source)
        .map(|s| s.kind)
        .ok_or_else(|| format!("unknown event: \"{name}\""))?;
    let text = text.unwrap_or_default();
    let value = kind
        .parse(text)
        .ok_or_else(|| format!("event {name} expects a {kind} value, got \"{text}\""))?;

    blueprint
        .session
        .registry_mut()
        .raise(source, value)
        .map_err(|e| e.to_string())
}
