// src/config/validate.rs

use std::collections::HashSet;

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;
use regex::Regex;

use crate::config::model::{ConfigFile, EdgeKindConfig, RawConfigFile};
use crate::dag::task::Edge;
use crate::errors::{Result, SchedError};
use crate::types::{SupplyMode, TaskId};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = SchedError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.config, raw.supply, raw.task))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    ensure_has_tasks(cfg)?;
    validate_global_config(cfg)?;
    validate_task_ids(cfg)?;
    validate_edges(cfg)?;
    validate_bodies(cfg)?;
    ensure_has_root(cfg)?;
    validate_acyclic(cfg)?;
    Ok(())
}

fn ensure_has_tasks(cfg: &RawConfigFile) -> Result<()> {
    if cfg.task.is_empty() {
        return Err(SchedError::ConfigError(
            "config must contain at least one [[task]] entry".to_string(),
        ));
    }
    Ok(())
}

fn validate_global_config(cfg: &RawConfigFile) -> Result<()> {
    if cfg.config.stall_backoff_ms == 0 {
        return Err(SchedError::ConfigError(
            "[config].stall_backoff_ms must be >= 1 (got 0)".to_string(),
        ));
    }
    if cfg.config.max_edges_per_task == 0 {
        return Err(SchedError::ConfigError(
            "[config].max_edges_per_task must be >= 1 (got 0)".to_string(),
        ));
    }
    if cfg.supply.mode == SupplyMode::Trace && cfg.supply.trace.is_empty() {
        return Err(SchedError::ConfigError(
            "[supply].trace must not be empty when mode = \"trace\"".to_string(),
        ));
    }
    Ok(())
}

fn validate_task_ids(cfg: &RawConfigFile) -> Result<()> {
    let mut seen: HashSet<TaskId> = HashSet::new();
    for task in cfg.task.iter() {
        if !seen.insert(task.id) {
            return Err(SchedError::DuplicateTaskId(task.id));
        }
    }
    Ok(())
}

fn validate_edges(cfg: &RawConfigFile) -> Result<()> {
    let ids: HashSet<TaskId> = cfg.task.iter().map(|t| t.id).collect();
    let max_edges = cfg.config.max_edges_per_task;

    for task in cfg.task.iter() {
        if task.edge.len() > max_edges {
            return Err(SchedError::ConfigError(format!(
                "task {} ('{}') declares {} edges; at most {} allowed",
                task.id,
                task.display_name(),
                task.edge.len(),
                max_edges
            )));
        }

        for (index, edge) in task.edge.iter().enumerate() {
            if !ids.contains(&edge.target) {
                return Err(SchedError::UnknownTaskId(
                    edge.target,
                    format!(
                        "edge #{index} of task {} ('{}')",
                        task.id,
                        task.display_name()
                    ),
                ));
            }
            if edge.comparator.is_some() && edge.kind != EdgeKindConfig::ThresholdCompare {
                return Err(SchedError::ConfigError(format!(
                    "edge #{index} of task {}: `comparator` only applies to threshold_compare edges",
                    task.id
                )));
            }
            // Constraint ranges are checked by the same conversion the registry uses.
            Edge::from_config(task.id, index, edge)?;
        }
    }
    Ok(())
}

fn validate_bodies(cfg: &RawConfigFile) -> Result<()> {
    for task in cfg.task.iter() {
        if let Some(pattern) = task.measure_on_stdout.as_deref() {
            let re = Regex::new(pattern).map_err(|e| {
                SchedError::ConfigError(format!(
                    "task {}: invalid measure_on_stdout regex: {e}",
                    task.id
                ))
            })?;
            if re.captures_len() < 2 {
                return Err(SchedError::ConfigError(format!(
                    "task {}: measure_on_stdout needs a capture group for the value",
                    task.id
                )));
            }
        }
    }
    Ok(())
}

fn ensure_has_root(cfg: &RawConfigFile) -> Result<()> {
    if !cfg.task.iter().any(|t| t.is_root) {
        return Err(SchedError::ConfigError(
            "config must mark at least one task with is_root = true".to_string(),
        ));
    }
    Ok(())
}

fn validate_acyclic(cfg: &RawConfigFile) -> Result<()> {
    // Edge direction: parent -> child. A timed_rearm edge pointing back at its
    // own parent is the only permitted cycle and is left out of the graph.
    let mut graph: DiGraphMap<TaskId, ()> = DiGraphMap::new();

    for task in cfg.task.iter() {
        graph.add_node(task.id);
    }

    for task in cfg.task.iter() {
        for edge in task.edge.iter() {
            let sanctioned_self_loop =
                edge.target == task.id && edge.kind == EdgeKindConfig::TimedRearm;
            if sanctioned_self_loop {
                continue;
            }
            if edge.target == task.id {
                return Err(SchedError::DependencyCycleDetected(format!(
                    "task {} ('{}') has a {:?} self-loop; only timed_rearm may target its own task",
                    task.id,
                    task.display_name(),
                    edge.kind
                )));
            }
            graph.add_edge(task.id, edge.target, ());
        }
    }

    match toposort(&graph, None) {
        Ok(_order) => Ok(()),
        Err(cycle) => {
            let node = cycle.node_id();
            Err(SchedError::DependencyCycleDetected(format!(
                "cycle detected in task graph involving task {}",
                node
            )))
        }
    }
}
