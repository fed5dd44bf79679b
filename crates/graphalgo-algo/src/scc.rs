//! Strongly connected components via Tarjan's algorithm, without recursion.
//!
//! The call stack of recursive Tarjan is replaced by an explicit frame stack
//! so chains of any length run in bounded native stack. Each frame owns a
//! segment of a shared neighbor buffer; segments are pushed and truncated in
//! LIFO order alongside the frames.

use fixedbitset::FixedBitSet;
use graphalgo_core::progress::{NoopProgress, ProgressLogger};
use graphalgo_core::termination::{RunningTrue, TerminationFlag};
use graphalgo_core::{Direction, Graph, GraphError, Lifecycle, NodeId, Outcome};
use tracing::{debug, instrument};

const NAME: &str = "StronglyConnectedComponents";
const UNVISITED: usize = usize::MAX;

/// Simulated recursive call: neighbors of `node` live in
/// `buffer[start..end]`, `cursor` is the next one to examine.
#[derive(Debug, Clone, Copy)]
struct Frame {
    node: NodeId,
    start: usize,
    cursor: usize,
    end: usize,
}

#[derive(Debug, Default)]
struct Working {
    index: Vec<usize>,
    lowlink: Vec<usize>,
    on_stack: FixedBitSet,
    stack: Vec<NodeId>,
    frames: Vec<Frame>,
    buffer: Vec<NodeId>,
}

pub struct StronglyConnectedComponentsBuilder<'a, G> {
    graph: &'a G,
    termination: &'a dyn TerminationFlag,
    progress: &'a dyn ProgressLogger,
}

impl<'a, G: Graph> StronglyConnectedComponentsBuilder<'a, G> {
    #[must_use]
    pub fn termination(mut self, termination: &'a dyn TerminationFlag) -> Self {
        self.termination = termination;
        self
    }

    #[must_use]
    pub fn progress(mut self, progress: &'a dyn ProgressLogger) -> Self {
        self.progress = progress;
        self
    }

    #[must_use]
    pub fn build(self) -> StronglyConnectedComponents<'a, G> {
        let n = self.graph.node_count();
        StronglyConnectedComponents {
            graph: self.graph,
            termination: self.termination,
            progress: self.progress,
            lifecycle: Lifecycle::default(),
            work: Working {
                index: vec![UNVISITED; n],
                lowlink: vec![0; n],
                on_stack: FixedBitSet::with_capacity(n),
                ..Working::default()
            },
        }
    }
}

pub struct StronglyConnectedComponents<'a, G> {
    graph: &'a G,
    termination: &'a dyn TerminationFlag,
    progress: &'a dyn ProgressLogger,
    lifecycle: Lifecycle,
    work: Working,
}

impl<'a, G: Graph> StronglyConnectedComponents<'a, G> {
    #[must_use]
    pub fn builder(graph: &'a G) -> StronglyConnectedComponentsBuilder<'a, G> {
        StronglyConnectedComponentsBuilder {
            graph,
            termination: &RunningTrue,
            progress: &NoopProgress,
        }
    }

    /// # Errors
    ///
    /// [`GraphError::AlreadyComputed`] or [`GraphError::Released`] when the
    /// instance was already used.
    #[instrument(skip(self), fields(nodes = self.graph.node_count()))]
    pub fn compute(&mut self) -> Result<Outcome<Components>, GraphError> {
        self.lifecycle.begin_compute(NAME)?;

        let n = self.graph.node_count();
        let mut components: Vec<Option<usize>> = vec![None; n];
        let mut next_component = 0;
        let mut counter = 0;
        let mut completed = true;

        'roots: for root in 0..n {
            if self.work.index[root] != UNVISITED {
                continue;
            }
            self.enter(root, &mut counter);

            while let Some(frame) = self.work.frames.last_mut() {
                if !self.termination.running() {
                    completed = false;
                    break 'roots;
                }
                let node = frame.node;
                if frame.cursor < frame.end {
                    let neighbor = self.work.buffer[frame.cursor];
                    frame.cursor += 1;
                    if self.work.index[neighbor] == UNVISITED {
                        self.enter(neighbor, &mut counter);
                    } else if self.work.on_stack.contains(neighbor) {
                        let w = &mut self.work;
                        w.lowlink[node] = w.lowlink[node].min(w.index[neighbor]);
                    }
                    continue;
                }

                // Simulated return from `node`.
                let start = frame.start;
                let w = &mut self.work;
                w.frames.pop();
                w.buffer.truncate(start);

                if w.lowlink[node] == w.index[node] {
                    while let Some(member) = w.stack.pop() {
                        w.on_stack.set(member, false);
                        components[member] = Some(next_component);
                        if member == node {
                            break;
                        }
                    }
                    next_component += 1;
                }
                if let Some(parent) = w.frames.last() {
                    let parent = parent.node;
                    w.lowlink[parent] = w.lowlink[parent].min(w.lowlink[node]);
                }
            }
            self.progress.log_progress(counter as f64 / n as f64);
        }

        if completed {
            self.progress.log_done();
        }
        let result = Components::new(components);
        debug!(
            completed,
            set_count = result.set_count(),
            max_set_size = result.max_set_size(),
            "scc finished"
        );
        Ok(Outcome {
            value: result,
            completed,
        })
    }

    /// Push a frame for `node` and number it.
    fn enter(&mut self, node: NodeId, counter: &mut usize) {
        let w = &mut self.work;
        w.index[node] = *counter;
        w.lowlink[node] = *counter;
        *counter += 1;
        w.on_stack.insert(node);
        w.stack.push(node);

        let start = w.buffer.len();
        self.graph
            .for_each_relationship(node, Direction::Outgoing, |_, target, _| {
                w.buffer.push(target);
                true
            });
        let end = w.buffer.len();
        w.frames.push(Frame {
            node,
            start,
            cursor: start,
            end,
        });
    }

    /// Drop index, lowlink, and stack arrays.
    pub fn release(&mut self) {
        self.lifecycle.release();
        self.work = Working::default();
    }
}

/// Component id per mapped node plus size statistics.
///
/// Nodes left unassigned by a cancelled run report `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Components {
    components: Vec<Option<usize>>,
    sizes: Vec<usize>,
}

impl Components {
    fn new(components: Vec<Option<usize>>) -> Self {
        let mut sizes: Vec<usize> = Vec::new();
        for &component in components.iter().flatten() {
            if component >= sizes.len() {
                sizes.resize(component + 1, 0);
            }
            sizes[component] += 1;
        }
        Self { components, sizes }
    }

    #[must_use]
    pub fn component(&self, node: NodeId) -> Option<usize> {
        self.components.get(node).copied().flatten()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[Option<usize>] {
        &self.components
    }

    #[must_use]
    pub fn set_count(&self) -> usize {
        self.sizes.len()
    }

    #[must_use]
    pub fn min_set_size(&self) -> usize {
        self.sizes.iter().copied().min().unwrap_or(0)
    }

    #[must_use]
    pub fn max_set_size(&self) -> usize {
        self.sizes.iter().copied().max().unwrap_or(0)
    }

    /// Nodes of `component` in mapped-id order.
    #[must_use]
    pub fn members(&self, component: usize) -> Vec<NodeId> {
        self.components
            .iter()
            .enumerate()
            .filter_map(|(node, &c)| (c == Some(component)).then_some(node))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use graphalgo_core::{AnyGraph, EdgeListSource, GraphLoader};

    fn load(nodes: u64, edges: &[(u64, u64)]) -> AnyGraph {
        let mut source = EdgeListSource::new();
        for node in 0..nodes {
            source.add_node(node);
        }
        for &(s, t) in edges {
            source.add_edge(s, t);
        }
        GraphLoader::default().load(&source).unwrap()
    }

    fn run(graph: &AnyGraph) -> Components {
        StronglyConnectedComponents::builder(graph)
            .build()
            .compute()
            .unwrap()
            .into_value()
    }

    #[test]
    fn singletons_are_their_own_components() {
        let components = run(&load(3, &[(0, 1), (1, 2)]));
        assert_eq!(components.set_count(), 3);
        assert_eq!(components.min_set_size(), 1);
        assert_eq!(components.max_set_size(), 1);
    }

    #[test]
    fn nested_cycles_collapse() {
        // 0 -> 1 -> 2 -> 0 and 2 -> 3 -> 2, plus tail 3 -> 4
        let components = run(&load(5, &[(0, 1), (1, 2), (2, 0), (2, 3), (3, 2), (3, 4)]));
        assert_eq!(components.set_count(), 2);
        let big = components.component(0).unwrap();
        assert_eq!(components.members(big), vec![0, 1, 2, 3]);
        assert_ne!(components.component(4), Some(big));
        assert_eq!(components.max_set_size(), 4);
    }

    #[test]
    fn self_loop_is_size_one() {
        let components = run(&load(2, &[(0, 0), (0, 1)]));
        assert_eq!(components.set_count(), 2);
    }

    #[test]
    fn long_chain_does_not_overflow() {
        let n = 200_000_u64;
        let edges: Vec<(u64, u64)> = (0..n).map(|i| (i, (i + 1) % n)).collect();
        let components = run(&load(n, &edges));
        assert_eq!(components.set_count(), 1);
        assert_eq!(components.max_set_size(), n as usize);
    }

    #[test]
    fn empty_graph_has_no_sets() {
        let components = run(&load(0, &[]));
        assert_eq!(components.set_count(), 0);
        assert_eq!(components.min_set_size(), 0);
    }
}
