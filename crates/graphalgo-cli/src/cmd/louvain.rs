//! `galgo louvain`: multilevel community detection.
//!
//! Graphs loaded with weights run the weighted variant on one thread;
//! everything else runs the partitioned variant on the shared pool.

use anyhow::Result;
use clap::Args;
use graphalgo_algo::Louvain;
use graphalgo_core::export::IntArrayTranslator;
use graphalgo_core::{Graph, TracingProgress};
use serde::Serialize;
use tracing::debug;

use super::{
    ExportReport, GraphArgs, GraphSummary, Millis, RunContext, WriteArgs, load_graph, measure,
    write_results, write_trailer_pretty, write_trailer_text,
};
use crate::output::{pretty_kv, pretty_section, render_mode, text_kv};

#[derive(Args, Debug)]
pub struct LouvainArgs {
    #[command(flatten)]
    pub graph: GraphArgs,

    /// Local-move passes per level.
    #[arg(long, value_name = "N")]
    pub max_iterations: Option<usize>,

    /// Coarsening levels.
    #[arg(long, value_name = "N")]
    pub max_levels: Option<usize>,

    /// Worker threads for the unweighted variant.
    #[arg(long, value_name = "N")]
    pub concurrency: Option<usize>,

    #[command(flatten)]
    pub write: WriteArgs,
}

#[derive(Debug, Serialize)]
pub struct LouvainReport {
    #[serde(flatten)]
    pub graph: GraphSummary,
    pub weighted_run: bool,
    pub concurrency: usize,
    pub community_count: usize,
    pub modularity: f64,
    pub modularities: Vec<f64>,
    pub levels: usize,
    pub iterations: usize,
    pub completed: bool,
    pub millis: Millis,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub export: Option<ExportReport>,
}

pub fn run_louvain(args: &LouvainArgs, ctx: &RunContext) -> Result<()> {
    let (graph, load) = load_graph(ctx, &args.graph)?;

    let mut config = ctx.config.louvain.clone();
    config.weighted |= graph.has_relationship_weights();
    if let Some(max_iterations) = args.max_iterations {
        config.max_iterations = max_iterations;
    }
    if let Some(max_levels) = args.max_levels {
        config.max_levels = max_levels;
    }
    if let Some(concurrency) = args.concurrency {
        config.concurrency = concurrency;
    }
    config.validate()?;

    let concurrency = if config.weighted { 1 } else { config.concurrency };
    let executor = (concurrency > 1)
        .then(|| ctx.executor(concurrency))
        .transpose()?;
    debug!(weighted = config.weighted, concurrency, "louvain variant selected");

    let termination = ctx.termination();
    let progress = TracingProgress::new("louvain");
    let (outcome, compute) = measure("compute", || -> Result<_> {
        let mut builder = Louvain::builder(&graph)
            .config(&config)
            .termination(&*termination)
            .progress(&progress);
        if let Some(executor) = &executor {
            builder = builder.executor(executor);
        }
        Ok(builder.build()?.compute()?)
    });
    let outcome = outcome?;
    let communities = &outcome.value;

    let (export, write) = write_results(&args.write, |file| {
        file.property(
            &graph,
            &*termination,
            "community",
            communities.as_slice(),
            &IntArrayTranslator,
        )?;
        Ok(())
    })?;

    let report = LouvainReport {
        graph: GraphSummary::of(&graph),
        weighted_run: config.weighted,
        concurrency,
        community_count: communities.community_count(),
        modularity: communities.modularity(),
        modularities: communities.level_modularities().to_vec(),
        levels: communities.levels(),
        iterations: communities.iterations(),
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
            text_kv(w, "community_count", r.community_count)?;
            text_kv(w, "modularity", r.modularity)?;
            text_kv(w, "levels", r.levels)?;
            text_kv(w, "iterations", r.iterations)?;
            write_trailer_text(w, r.completed, r.millis, r.export.as_ref())
        },
        |r, w| {
            pretty_section(w, "Louvain communities")?;
            r.graph.write_pretty(w)?;
            pretty_kv(
                w,
                "variant",
                if r.weighted_run {
                    "weighted".to_string()
                } else {
                    format!("unweighted, {} threads", r.concurrency)
                },
            )?;
            pretty_kv(w, "communities", r.community_count.to_string())?;
            pretty_kv(w, "modularity", format!("{:.6}", r.modularity))?;
            let per_level: Vec<String> = r.modularities.iter().map(|q| format!("{q:.4}")).collect();
            pretty_kv(
                w,
                "levels",
                format!("{} [{}]", r.levels, per_level.join(", ")),
            )?;
            pretty_kv(w, "iterations", r.iterations.to_string())?;
            write_trailer_pretty(w, r.completed, r.millis, r.export.as_ref())
        },
    )
}
