// src/dag/builder.rs

//! Turning declared actions into a validated [`Graph`].
//!
//! Checks run in a fixed order so the first reported problem is stable:
//! duplicate names, dangling references (in `needs`, then in `resolves`),
//! and finally cycles.

use std::collections::HashMap;

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;
use tracing::debug;

use crate::dag::action::{Action, ActionId, ActionStatus, DeclaredAction};
use crate::dag::graph::Graph;
use crate::engine::ActionName;
use crate::errors::BuildError;

/// Build a graph from a flat list of declared actions and the resolve targets.
///
/// Every action starts out `Pending`. Duplicate entries inside one `needs`
/// list or inside `resolves` are collapsed.
pub fn build<I, S>(declared: Vec<DeclaredAction>, resolves: I) -> Result<Graph, BuildError>
where
    I: IntoIterator<Item = S>,
    S: Into<ActionName>,
{
    let mut index: HashMap<ActionName, ActionId> = HashMap::with_capacity(declared.len());
    for (i, action) in declared.iter().enumerate() {
        if index.insert(action.name.clone(), ActionId(i)).is_some() {
            return Err(BuildError::DuplicateName(action.name.clone()));
        }
    }

    let mut needs: Vec<Vec<ActionId>> = Vec::with_capacity(declared.len());
    for action in declared.iter() {
        let mut ids = Vec::with_capacity(action.needs.len());
        for dep in action.needs.iter() {
            let id = index
                .get(dep)
                .copied()
                .ok_or_else(|| BuildError::UnknownReference {
                    action: Some(action.name.clone()),
                    reference: dep.clone(),
                })?;
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
        needs.push(ids);
    }

    let mut resolve_ids = Vec::new();
    for target in resolves {
        let target: ActionName = target.into();
        let id = index
            .get(&target)
            .copied()
            .ok_or_else(|| BuildError::UnknownReference {
                action: None,
                reference: target.clone(),
            })?;
        if !resolve_ids.contains(&id) {
            resolve_ids.push(id);
        }
    }

    let topo_order = topological_order(&needs).map_err(|cycle| BuildError::CyclicDependency {
        cycle: cycle
            .into_iter()
            .map(|id| declared[id.0].name.clone())
            .collect(),
    })?;

    let mut dependents: Vec<Vec<ActionId>> = vec![Vec::new(); declared.len()];
    for (i, ids) in needs.iter().enumerate() {
        for dep in ids {
            dependents[dep.0].push(ActionId(i));
        }
    }

    let actions: Vec<Action> = declared
        .into_iter()
        .zip(needs)
        .zip(dependents)
        .map(|((d, needs), dependents)| Action {
            name: d.name,
            operation: d.operation,
            needs,
            dependents,
            status: ActionStatus::Pending,
        })
        .collect();

    debug!(
        actions = actions.len(),
        resolves = resolve_ids.len(),
        "built action graph"
    );

    Ok(Graph {
        actions,
        index,
        resolves: resolve_ids,
        topo_order,
    })
}

impl Graph {
    /// Shorthand for [`build`].
    pub fn build<I, S>(declared: Vec<DeclaredAction>, resolves: I) -> Result<Self, BuildError>
    where
        I: IntoIterator<Item = S>,
        S: Into<ActionName>,
    {
        build(declared, resolves)
    }
}

/// Topologically sort the `needs` relation, prerequisites first.
///
/// On failure returns one full cycle, in `needs` direction.
fn topological_order(needs: &[Vec<ActionId>]) -> Result<Vec<ActionId>, Vec<ActionId>> {
    // Edge direction: prerequisite -> dependent, so the sort yields
    // prerequisites first.
    let mut graph: DiGraphMap<ActionId, ()> = DiGraphMap::new();

    for i in 0..needs.len() {
        graph.add_node(ActionId(i));
    }

    for (i, ids) in needs.iter().enumerate() {
        for dep in ids {
            graph.add_edge(*dep, ActionId(i), ());
        }
    }

    toposort(&graph, None).map_err(|cycle| trace_cycle(cycle.node_id(), needs))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    InProgress,
    Done,
}

/// Recover an ordered cycle with a three-colour depth-first walk along
/// `needs` edges, starting from the node the sort tripped over.
fn trace_cycle(start: ActionId, needs: &[Vec<ActionId>]) -> Vec<ActionId> {
    let mut marks = vec![Mark::Unvisited; needs.len()];
    let mut path = Vec::new();

    if let Some(cycle) = visit(start, needs, &mut marks, &mut path) {
        return cycle;
    }

    for i in 0..needs.len() {
        if marks[i] == Mark::Unvisited {
            if let Some(cycle) = visit(ActionId(i), needs, &mut marks, &mut path) {
                return cycle;
            }
        }
    }

    vec![start]
}

fn visit(
    node: ActionId,
    needs: &[Vec<ActionId>],
    marks: &mut [Mark],
    path: &mut Vec<ActionId>,
) -> Option<Vec<ActionId>> {
    marks[node.0] = Mark::InProgress;
    path.push(node);

    for &next in &needs[node.0] {
        match marks[next.0] {
            Mark::InProgress => {
                let pos = path.iter().position(|&n| n == next)?;
                return Some(path[pos..].to_vec());
            }
            Mark::Unvisited => {
                if let Some(cycle) = visit(next, needs, marks, path) {
                    return Some(cycle);
                }
            }
            Mark::Done => {}
        }
    }

    path.pop();
    marks[node.0] = Mark::Done;
    None
}
