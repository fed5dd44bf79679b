//! `galgo scc`: strongly connected components.

use anyhow::Result;
use clap::Args;
use graphalgo_algo::StronglyConnectedComponents;
use graphalgo_core::export::IntArrayTranslator;
use graphalgo_core::TracingProgress;
use serde::Serialize;

use super::{
    ExportReport, GraphArgs, GraphSummary, Millis, RunContext, WriteArgs, load_graph, measure,
    write_results, write_trailer_pretty, write_trailer_text,
};
use crate::output::{pretty_kv, pretty_section, render_mode, text_kv};

#[derive(Args, Debug)]
pub struct SccArgs {
    #[command(flatten)]
    pub graph: GraphArgs,

    #[command(flatten)]
    pub write: WriteArgs,
}

#[derive(Debug, Serialize)]
pub struct SccReport {
    #[serde(flatten)]
    pub graph: GraphSummary,
    pub set_count: usize,
    pub min_set_size: usize,
    pub max_set_size: usize,
    pub completed: bool,
    pub millis: Millis,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub export: Option<ExportReport>,
}

pub fn run_scc(args: &SccArgs, ctx: &RunContext) -> Result<()> {
    let (graph, load) = load_graph(ctx, &args.graph)?;

    let termination = ctx.termination();
    let progress = TracingProgress::new("scc");
    let (outcome, compute) = measure("compute", || {
        StronglyConnectedComponents::builder(&graph)
            .termination(&*termination)
            .progress(&progress)
            .build()
            .compute()
    });
    let outcome = outcome?;
    let components = &outcome.value;

    let (export, write) = write_results(&args.write, |file| {
        file.property(
            &graph,
            &*termination,
            "partition",
            components.as_slice(),
            &IntArrayTranslator,
        )?;
        Ok(())
    })?;

    let report = SccReport {
        graph: GraphSummary::of(&graph),
        set_count: components.set_count(),
        min_set_size: components.min_set_size(),
        max_set_size: components.max_set_size(),
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
            text_kv(w, "set_count", r.set_count)?;
            text_kv(w, "min_set_size", r.min_set_size)?;
            text_kv(w, "max_set_size", r.max_set_size)?;
            write_trailer_text(w, r.completed, r.millis, r.export.as_ref())
        },
        |r, w| {
            pretty_section(w, "Strongly connected components")?;
            r.graph.write_pretty(w)?;
            pretty_kv(w, "components", r.set_count.to_string())?;
            pretty_kv(
                w,
                "set sizes",
                format!("min {} / max {}", r.min_set_size, r.max_set_size),
            )?;
            write_trailer_pretty(w, r.completed, r.millis, r.export.as_ref())
        },
    )
}
