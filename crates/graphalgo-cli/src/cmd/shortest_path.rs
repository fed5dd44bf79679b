//! `galgo shortest-path`: Dijkstra from one source.

use anyhow::Result;
use clap::Args;
use graphalgo_algo::{ShortestPathDijkstra, Target};
use graphalgo_core::export::{DoubleArrayTranslator, NodeRefTranslator};
use graphalgo_core::{AnyGraph, Direction, Graph, GraphError, NodeId, TracingProgress, UNREACHABLE};
use serde::Serialize;

use super::{
    ExportReport, GraphArgs, GraphSummary, Millis, RunContext, WriteArgs, load_graph, measure,
    write_results, write_trailer_pretty, write_trailer_text,
};
use crate::output::{pretty_kv, pretty_section, render_mode, text_kv};

#[derive(Args, Debug)]
pub struct ShortestPathArgs {
    #[command(flatten)]
    pub graph: GraphArgs,

    /// Original id of the start node.
    #[arg(long)]
    pub source: u64,

    /// Original id of the end node; all reachable nodes when omitted.
    #[arg(long)]
    pub target: Option<u64>,

    /// Relationship direction to follow.
    #[arg(long, default_value_t = Direction::Outgoing)]
    pub direction: Direction,

    #[command(flatten)]
    pub write: WriteArgs,
}

#[derive(Debug, Serialize)]
pub struct ShortestPathReport {
    #[serde(flatten)]
    pub graph: GraphSummary,
    pub source: u64,
    pub target: Option<u64>,
    /// `None` when the target was not reached.
    pub total_cost: Option<f64>,
    /// Original ids from source to target.
    pub path: Vec<u64>,
    pub settled: usize,
    pub completed: bool,
    pub millis: Millis,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub export: Option<ExportReport>,
}

fn mapped(graph: &AnyGraph, original: u64) -> Result<NodeId, GraphError> {
    graph
        .to_mapped_id(original)
        .ok_or(GraphError::UnknownOriginalId(original))
}

pub fn run_shortest_path(args: &ShortestPathArgs, ctx: &RunContext) -> Result<()> {
    let (graph, load) = load_graph(ctx, &args.graph)?;
    let source = mapped(&graph, args.source)?;
    let target = match args.target {
        Some(original) => Target::Node(mapped(&graph, original)?),
        None => Target::All,
    };

    let termination = ctx.termination();
    let progress = TracingProgress::new("dijkstra");
    let (outcome, compute) = measure("compute", || -> Result<_> {
        let mut algo = ShortestPathDijkstra::builder(&graph)
            .source(source)
            .target(target)
            .direction(args.direction)
            .termination(&*termination)
            .progress(&progress)
            .build()?;
        Ok(algo.compute()?)
    });
    let outcome = outcome?;
    let paths = &outcome.value;

    // Frontier nodes of an early exit only hold tentative distances.
    let final_distances: Vec<f64> = (0..graph.node_count())
        .map(|n| {
            if paths.is_settled(n) {
                paths.distance(n)
            } else {
                UNREACHABLE
            }
        })
        .collect();
    let final_predecessors: Vec<Option<NodeId>> = paths
        .predecessors()
        .iter()
        .enumerate()
        .map(|(n, &p)| p.filter(|_| paths.is_settled(n)))
        .collect();

    let (export, write) = write_results(&args.write, |file| {
        file.property(
            &graph,
            &*termination,
            "distance",
            &final_distances[..],
            &DoubleArrayTranslator,
        )?;
        file.property(
            &graph,
            &*termination,
            "predecessor",
            &final_predecessors[..],
            &NodeRefTranslator,
        )?;
        Ok(())
    })?;

    let path = paths.path();
    let total_cost = (!path.is_empty()).then(|| path.total_cost());
    let report = ShortestPathReport {
        graph: GraphSummary::of(&graph),
        source: args.source,
        target: args.target,
        total_cost,
        path: path.nodes().iter().map(|&n| graph.to_original_id(n)).collect(),
        settled: final_distances.iter().filter(|&&d| d < UNREACHABLE).count(),
        completed: outcome.completed,
        millis: Millis {
            load,
            compute,
            write,
        },
        export,
    };

    render_mode(
        ctx.output,
        &report,
        |r, w| {
            r.graph.write_text(w)?;
            text_kv(w, "source", r.source)?;
            if let Some(cost) = r.total_cost {
                text_kv(w, "total_cost", cost)?;
                text_kv(w, "path", join(&r.path))?;
            }
            text_kv(w, "settled", r.settled)?;
            write_trailer_text(w, r.completed, r.millis, r.export.as_ref())
        },
        |r, w| {
            pretty_section(w, "Shortest path")?;
            r.graph.write_pretty(w)?;
            pretty_kv(w, "source", r.source.to_string())?;
            match (r.target, r.total_cost) {
                (Some(_), Some(cost)) => {
                    pretty_kv(w, "total cost", cost.to_string())?;
                    pretty_kv(w, "path", join(&r.path))?;
                }
                (Some(target), None) => pretty_kv(w, "path", format!("{target} not reachable"))?,
                (None, _) => {}
            }
            pretty_kv(w, "settled", r.settled.to_string())?;
            write_trailer_pretty(w, r.completed, r.millis, r.export.as_ref())
        },
    )
}

fn join(path: &[u64]) -> String {
    path.iter()
        .map(u64::to_string)
        .collect::<Vec<_>>()
        .join(" -> ")
}
