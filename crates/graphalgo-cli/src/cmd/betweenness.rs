//! `galgo betweenness`: Brandes centrality for every node.

use anyhow::Result;
use clap::Args;
use graphalgo_algo::BetweennessCentrality;
use graphalgo_core::export::DoubleArrayTranslator;
use graphalgo_core::{Direction, Graph, TracingProgress};
use serde::Serialize;

use super::{
    ExportReport, GraphArgs, GraphSummary, Millis, RunContext, WriteArgs, load_graph, measure,
    write_results, write_trailer_pretty, write_trailer_text,
};
use crate::output::{pretty_kv, pretty_section, render_mode, text_kv};

#[derive(Args, Debug)]
pub struct BetweennessArgs {
    #[command(flatten)]
    pub graph: GraphArgs,

    /// Relationship direction to follow.
    #[arg(long, default_value_t = Direction::Outgoing)]
    pub direction: Direction,

    /// Number of highest-scoring nodes to list.
    #[arg(long, default_value_t = 5)]
    pub top: usize,

    #[command(flatten)]
    pub write: WriteArgs,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct Scored {
    pub node: u64,
    pub centrality: f64,
}

#[derive(Debug, Serialize)]
pub struct BetweennessReport {
    #[serde(flatten)]
    pub graph: GraphSummary,
    pub direction: Direction,
    pub sum: f64,
    pub top: Vec<Scored>,
    pub completed: bool,
    pub millis: Millis,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub export: Option<ExportReport>,
}

pub fn run_betweenness(args: &BetweennessArgs, ctx: &RunContext) -> Result<()> {
    let (graph, load) = load_graph(ctx, &args.graph)?;

    let termination = ctx.termination();
    let progress = TracingProgress::new("betweenness");
    let (outcome, compute) = measure("compute", || {
        BetweennessCentrality::builder(&graph)
            .direction(args.direction)
            .termination(&*termination)
            .progress(&progress)
            .build()
            .compute()
    });
    let outcome = outcome?;
    let centrality = &outcome.value;

    let (export, write) = write_results(&args.write, |file| {
        file.property(
            &graph,
            &*termination,
            "centrality",
            centrality.as_slice(),
            &DoubleArrayTranslator,
        )?;
        Ok(())
    })?;

    let mut ranked: Vec<Scored> = centrality
        .iter()
        .map(|(node, score)| Scored {
            node: graph.to_original_id(node),
            centrality: score,
        })
        .collect();
    ranked.sort_by(|a, b| {
        b.centrality
            .total_cmp(&a.centrality)
            .then(a.node.cmp(&b.node))
    });
    ranked.truncate(args.top);

    let report = BetweennessReport {
        graph: GraphSummary::of(&graph),
        direction: args.direction,
        sum: centrality.sum(),
        top: ranked,
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
            text_kv(w, "direction", r.direction)?;
            text_kv(w, "sum", r.sum)?;
            for scored in &r.top {
                text_kv(w, "top", format!("{}:{}", scored.node, scored.centrality))?;
            }
            write_trailer_text(w, r.completed, r.millis, r.export.as_ref())
        },
        |r, w| {
            pretty_section(w, "Betweenness centrality")?;
            r.graph.write_pretty(w)?;
            pretty_kv(w, "direction", r.direction.to_string())?;
            pretty_kv(w, "sum", format!("{:.4}", r.sum))?;
            for (rank, scored) in r.top.iter().enumerate() {
                pretty_kv(
                    w,
                    &format!("#{}", rank + 1),
                    format!("node {} ({:.4})", scored.node, scored.centrality),
                )?;
            }
            write_trailer_pretty(w, r.completed, r.millis, r.export.as_ref())
        },
    )
}
