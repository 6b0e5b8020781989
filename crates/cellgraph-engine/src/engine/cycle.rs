//! Recalculation ordering with cycle detection.
//!
//! Starting from an edited cell, walk the dependents relation depth-first and
//! emit every reachable name in reverse post-order. That order is topological:
//! each cell comes after everything it depends on within the affected set, and
//! the edited cell itself comes first. Reaching a name that is still on the
//! walk's path means the edit closed a cycle.

use std::vec;

use thiserror::Error;

use super::deps::{DependencyGraph, NodeId};

/// A dependency cycle, as the chain of names from the first repeated cell back
/// to itself.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("circular dependency: {}", .path.join(" -> "))]
pub struct CycleError {
    pub path: Vec<String>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    OnPath,
    Done,
}

/// Every name reachable from `start` through dependents, `start` first, in an
/// order where each name follows all of its dependees from the same set.
///
/// A name the graph has never seen is its own one-element order.
pub fn recalc_order(graph: &DependencyGraph, start: &str) -> Result<Vec<String>, CycleError> {
    let Some(root) = graph.node_id(start) else {
        return Ok(vec![start.to_string()]);
    };

    let mut marks = vec![Mark::Unvisited; graph.slot_count()];
    let mut post_order: Vec<NodeId> = Vec::new();
    let mut stack: Vec<(NodeId, vec::IntoIter<NodeId>)> = Vec::new();

    marks[index(root)] = Mark::OnPath;
    stack.push((root, children(graph, root)));

    while let Some((node, pending)) = stack.last_mut() {
        let node = *node;
        match pending.next() {
            Some(next) => match marks[index(next)] {
                Mark::Unvisited => {
                    marks[index(next)] = Mark::OnPath;
                    stack.push((next, children(graph, next)));
                }
                Mark::OnPath => return Err(cycle_path(graph, &stack, next)),
                Mark::Done => {}
            },
            None => {
                marks[index(node)] = Mark::Done;
                post_order.push(node);
                stack.pop();
            }
        }
    }

    Ok(post_order
        .into_iter()
        .rev()
        .map(|id| graph.name(id).to_string())
        .collect())
}

fn index(id: NodeId) -> usize {
    id.0
}

fn children(graph: &DependencyGraph, id: NodeId) -> vec::IntoIter<NodeId> {
    graph.dependent_ids(id).collect::<Vec<_>>().into_iter()
}

fn cycle_path(
    graph: &DependencyGraph,
    stack: &[(NodeId, vec::IntoIter<NodeId>)],
    repeated: NodeId,
) -> CycleError {
    let from = stack
        .iter()
        .position(|(id, _)| *id == repeated)
        .unwrap_or(0);
    let mut path: Vec<String> = stack[from..]
        .iter()
        .map(|(id, _)| graph.name(*id).to_string())
        .collect();
    path.push(graph.name(repeated).to_string());
    CycleError { path }
}
