use crate::diagnostics::{DiagnosticKind, Diagnostics};
use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Wire row of the external task tree (WBS). The tree itself belongs to the
/// planning collaborator; only priority, skill requirements, and structure
/// matter to this subsystem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRecord {
    pub id: String,
    #[serde(default)]
    pub name: String,
    /// Higher priority tasks win contested resource slots.
    #[serde(default)]
    pub priority: i64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required_skills: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,
}

/// Per-task facts the detector and leveler need after flattening.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskMeta {
    pub name: String,
    pub priority: i64,
    pub required_skills: Vec<String>,
    /// Set when this task sat on a broken dependency cycle and its ordering
    /// needs a human decision.
    pub manual_override: bool,
}

/// Flattened view of the task tree: lookup table plus a deterministic
/// topological order with cycles already broken.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskIndex {
    entries: BTreeMap<String, TaskMeta>,
    order: Vec<String>,
}

impl TaskIndex {
    pub fn empty() -> Self {
        Self::default()
    }

    /// True when no task tree was supplied; task references are then accepted
    /// without checking.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, task_id: &str) -> bool {
        self.entries.contains_key(task_id)
    }

    pub fn get(&self, task_id: &str) -> Option<&TaskMeta> {
        self.entries.get(task_id)
    }

    /// Priority for ordering; unknown tasks rank neutral.
    pub fn priority_of(&self, task_id: &str) -> i64 {
        self.entries.get(task_id).map(|meta| meta.priority).unwrap_or(0)
    }

    pub fn required_skills_of(&self, task_id: &str) -> &[String] {
        self.entries
            .get(task_id)
            .map(|meta| meta.required_skills.as_slice())
            .unwrap_or(&[])
    }

    /// Topological order of task ids, cycles broken.
    pub fn order(&self) -> &[String] {
        &self.order
    }
}

/// Flatten the task tree into a `TaskIndex`.
///
/// Parent and dependency links both become edges. A cycle is broken at the
/// first repeated node: the offending edge is skipped, the repeated task is
/// flagged `manual_override`, and a `circular_dependency` diagnostic is
/// recorded. Duplicate ids keep the first occurrence; dangling references are
/// reported and ignored.
pub fn flatten_task_tree(records: &[TaskRecord], diagnostics: &mut Diagnostics) -> TaskIndex {
    let mut graph: DiGraph<String, ()> = DiGraph::new();
    let mut id_to_index: HashMap<String, NodeIndex> = HashMap::new();
    let mut entries: BTreeMap<String, TaskMeta> = BTreeMap::new();

    for record in records {
        if id_to_index.contains_key(&record.id) {
            diagnostics.push(
                DiagnosticKind::Validation,
                record.id.clone(),
                format!("duplicate task id {}, keeping first occurrence", record.id),
            );
            continue;
        }
        let node = graph.add_node(record.id.clone());
        id_to_index.insert(record.id.clone(), node);
        let mut skills = record.required_skills.clone();
        skills.sort();
        skills.dedup();
        entries.insert(
            record.id.clone(),
            TaskMeta {
                name: record.name.clone(),
                priority: record.priority,
                required_skills: skills,
                manual_override: false,
            },
        );
    }

    // Edges run source -> dependent so the topological order visits
    // prerequisites first.
    for record in records {
        let Some(&target) = id_to_index.get(&record.id) else {
            continue;
        };
        let mut sources: Vec<&String> = record.depends_on.iter().collect();
        if let Some(parent) = &record.parent_id {
            sources.push(parent);
        }
        for source_id in sources {
            match id_to_index.get(source_id) {
                Some(&source) => {
                    graph.add_edge(source, target, ());
                }
                None => diagnostics.push(
                    DiagnosticKind::MissingReference,
                    record.id.clone(),
                    format!("task {} references unknown task {}", record.id, source_id),
                ),
            }
        }
    }

    // Iterative DFS with coloring. A gray neighbor means a back edge: break
    // the cycle there instead of following it.
    const WHITE: u8 = 0;
    const GRAY: u8 = 1;
    const BLACK: u8 = 2;
    let mut color = vec![WHITE; graph.node_count()];
    let mut finished: Vec<NodeIndex> = Vec::with_capacity(graph.node_count());

    for start in graph.node_indices() {
        if color[start.index()] != WHITE {
            continue;
        }
        let mut stack: Vec<(NodeIndex, Vec<NodeIndex>, usize)> = Vec::new();
        color[start.index()] = GRAY;
        let mut neighbors: Vec<NodeIndex> =
            graph.neighbors_directed(start, Direction::Outgoing).collect();
        neighbors.sort();
        stack.push((start, neighbors, 0));

        while let Some((node, neighbors, cursor)) = stack.last_mut() {
            if *cursor >= neighbors.len() {
                color[node.index()] = BLACK;
                finished.push(*node);
                stack.pop();
                continue;
            }
            let next = neighbors[*cursor];
            *cursor += 1;
            match color[next.index()] {
                WHITE => {
                    color[next.index()] = GRAY;
                    let mut next_neighbors: Vec<NodeIndex> =
                        graph.neighbors_directed(next, Direction::Outgoing).collect();
                    next_neighbors.sort();
                    stack.push((next, next_neighbors, 0));
                }
                GRAY => {
                    let task_id = graph[next].clone();
                    if let Some(meta) = entries.get_mut(&task_id) {
                        if !meta.manual_override {
                            meta.manual_override = true;
                            diagnostics.push(
                                DiagnosticKind::CircularDependency,
                                task_id.clone(),
                                format!(
                                    "task graph cycle broken at {}, ordering needs manual review",
                                    task_id
                                ),
                            );
                        }
                    }
                }
                _ => {}
            }
        }
    }

    finished.reverse();
    let order = finished.into_iter().map(|node| graph[node].clone()).collect();

    TaskIndex { entries, order }
}
