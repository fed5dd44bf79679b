//! `galgo stats`: load a graph and describe it.

use std::io::Write;

use anyhow::Result;
use clap::Args;
use graphalgo_core::{AnyGraph, Direction, Graph};
use serde::Serialize;

use super::{GraphArgs, GraphSummary, RunContext, load_graph};
use crate::output::{pretty_kv, pretty_section, render_mode, text_kv};

#[derive(Args, Debug)]
pub struct StatsArgs {
    #[command(flatten)]
    pub graph: GraphArgs,
}

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct DegreeStats {
    pub min: usize,
    pub max: usize,
    pub mean: f64,
}

#[derive(Debug, Serialize)]
pub struct GraphStats {
    #[serde(flatten)]
    pub graph: GraphSummary,
    pub out_degree: DegreeStats,
    pub in_degree: DegreeStats,
    pub isolated: usize,
    pub self_loops: u64,
    pub load_millis: u128,
}

fn degree_stats(graph: &AnyGraph, direction: Direction) -> DegreeStats {
    let n = graph.node_count();
    if n == 0 {
        return DegreeStats::default();
    }
    let (mut min, mut max, mut total) = (usize::MAX, 0, 0_usize);
    for node in 0..n {
        let degree = graph.degree(node, direction);
        min = min.min(degree);
        max = max.max(degree);
        total += degree;
    }
    DegreeStats {
        min,
        max,
        mean: total as f64 / n as f64,
    }
}

pub fn collect(graph: &AnyGraph, load_millis: u128) -> GraphStats {
    let mut self_loops = 0;
    let mut isolated = 0;
    for node in 0..graph.node_count() {
        if graph.degree(node, Direction::Both) == 0 {
            isolated += 1;
        }
        graph.for_each_relationship(node, Direction::Outgoing, |source, target, _| {
            if source == target {
                self_loops += 1;
            }
            true
        });
    }
    GraphStats {
        graph: GraphSummary::of(graph),
        out_degree: degree_stats(graph, Direction::Outgoing),
        in_degree: degree_stats(graph, Direction::Incoming),
        isolated,
        self_loops,
        load_millis,
    }
}

pub fn run_stats(args: &StatsArgs, ctx: &RunContext) -> Result<()> {
    let (graph, load_millis) = load_graph(ctx, &args.graph)?;
    let stats = collect(&graph, load_millis);

    render_mode(
        ctx.output,
        &stats,
        |s, w| {
            s.graph.write_text(w)?;
            text_kv(w, "out_degree_max", s.out_degree.max)?;
            text_kv(w, "in_degree_max", s.in_degree.max)?;
            text_kv(w, "isolated", s.isolated)?;
            text_kv(w, "self_loops", s.self_loops)?;
            text_kv(w, "load_millis", s.load_millis)
        },
        |s, w| {
            pretty_section(w, "Graph")?;
            s.graph.write_pretty(w)?;
            write_degrees(w, "out-degree", s.out_degree)?;
            write_degrees(w, "in-degree", s.in_degree)?;
            pretty_kv(w, "isolated", s.isolated.to_string())?;
            pretty_kv(w, "self loops", s.self_loops.to_string())?;
            pretty_kv(w, "load millis", s.load_millis.to_string())
        },
    )
}

fn write_degrees(w: &mut dyn Write, label: &str, d: DegreeStats) -> std::io::Result<()> {
    pretty_kv(
        w,
        label,
        format!("min {} / max {} / mean {:.2}", d.min, d.max, d.mean),
    )
}
