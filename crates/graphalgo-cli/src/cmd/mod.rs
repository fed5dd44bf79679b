//! Command handlers and the plumbing they share: loading the input graph,
//! stage timings, and JSON-lines export.

pub mod betweenness;
pub mod louvain;
pub mod scc;
pub mod shortest_path;
pub mod stats;

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Args;
use graphalgo_core::export::{
    ExportSummary, Exporter, PropertyTranslator, PropertyValue, PropertyWriter,
};
use graphalgo_core::{
    AnyGraph, Backend, DeadlineFlag, EngineConfig, Executor, Graph, GraphLoader, RunningTrue,
    TerminationFlag, timing,
};
use serde::Serialize;
use tracing::info;

use crate::input;
use crate::output::OutputMode;

/// Input selection shared by every command.
#[derive(Args, Debug, Clone)]
pub struct GraphArgs {
    /// Edge-list file (`source target [weight]` per line).
    #[arg(value_name = "EDGES")]
    pub input: PathBuf,

    /// Storage backend: dense, huge, or auto. Overrides the config file.
    #[arg(long, value_name = "BACKEND")]
    pub backend: Option<Backend>,

    /// Load relationship weights from the third column.
    #[arg(long)]
    pub weighted: bool,

    /// Weight for relationships without one. Implies --weighted.
    #[arg(long, value_name = "WEIGHT")]
    pub default_weight: Option<f64>,
}

/// Result export shared by the algorithm commands.
#[derive(Args, Debug, Clone, Default)]
pub struct WriteArgs {
    /// Write per-node results as JSON lines to FILE.
    #[arg(long, value_name = "FILE")]
    pub write: Option<PathBuf>,
}

/// Everything a command needs besides its own arguments.
pub struct RunContext {
    pub config: EngineConfig,
    pub output: OutputMode,
    pub timeout: Option<Duration>,
}

impl RunContext {
    /// Fresh termination flag; the deadline starts counting now.
    pub fn termination(&self) -> Box<dyn TerminationFlag> {
        match self.timeout {
            Some(timeout) => Box::new(DeadlineFlag::after(timeout)),
            None => Box::new(RunningTrue),
        }
    }

    pub fn executor(&self, concurrency: usize) -> Result<Executor> {
        Executor::new(concurrency).context("Failed to start the worker pool")
    }
}

/// Stage durations reported by every algorithm command.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct Millis {
    pub load: u128,
    pub compute: u128,
    pub write: u128,
}

/// Run `f`, recording it in the timing report and returning its wall time.
pub fn measure<R>(stage: &str, f: impl FnOnce() -> R) -> (R, u128) {
    let start = Instant::now();
    let result = timing::timed(stage, f);
    (result, start.elapsed().as_millis())
}

/// Read the edge list and load it with the configured backend.
pub fn load_graph(ctx: &RunContext, args: &GraphArgs) -> Result<(AnyGraph, u128)> {
    let mut load = ctx.config.load.clone();
    if let Some(backend) = args.backend {
        load.backend = backend;
    }
    if args.weighted || args.default_weight.is_some() {
        let default_weight = args.default_weight.or(load.default_weight);
        load = load.weighted(default_weight);
    }
    load.validate()?;

    let (graph, millis) = measure("load", || -> Result<AnyGraph> {
        let source = input::read_edge_list(&args.input)?;
        Ok(GraphLoader::new(load).load(&source)?)
    });
    let graph = graph?;
    info!(
        backend = graph.backend(),
        nodes = graph.node_count(),
        relationships = graph.relationship_count(),
        millis,
        "graph ready"
    );
    Ok((graph, millis))
}

/// JSON-lines [`PropertyWriter`]: one `{"node": <original>, <property>: <value>}`
/// object per line.
pub struct JsonLinesWriter<W: Write> {
    out: W,
}

impl<W: Write> JsonLinesWriter<W> {
    pub const fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> PropertyWriter for JsonLinesWriter<W> {
    type Error = io::Error;

    fn write(&mut self, original: u64, property: &str, value: PropertyValue) -> io::Result<()> {
        let mut record = serde_json::Map::new();
        record.insert("node".to_string(), original.into());
        record.insert(property.to_string(), serde_json::to_value(value)?);
        serde_json::to_writer(&mut self.out, &record)?;
        self.out.write_all(b"\n")
    }
}

/// Export destination opened from `--write`.
pub struct ExportFile {
    path: PathBuf,
    writer: JsonLinesWriter<BufWriter<File>>,
    written: usize,
    completed: bool,
}

impl ExportFile {
    pub fn create(path: &Path) -> Result<Self> {
        let file =
            File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
        Ok(Self {
            path: path.to_path_buf(),
            writer: JsonLinesWriter::new(BufWriter::new(file)),
            written: 0,
            completed: true,
        })
    }

    /// Write one property for every node.
    pub fn property<T, Tr>(
        &mut self,
        graph: &AnyGraph,
        termination: &dyn TerminationFlag,
        property: &str,
        data: &T,
        translator: &Tr,
    ) -> Result<ExportSummary>
    where
        T: ?Sized,
        Tr: PropertyTranslator<T>,
    {
        let summary = Exporter::new(graph.id_map(), termination)
            .write(property, data, translator, &mut self.writer)
            .with_context(|| format!("Failed to write {}", self.path.display()))?;
        self.written += summary.written;
        self.completed &= summary.completed;
        Ok(summary)
    }

    /// Flush and report how many values were written.
    pub fn finish(self) -> Result<ExportReport> {
        let path = self.path;
        self.writer
            .into_inner()
            .flush()
            .with_context(|| format!("Failed to flush {}", path.display()))?;
        info!(path = %path.display(), written = self.written, "results written");
        Ok(ExportReport {
            path,
            written: self.written,
            completed: self.completed,
        })
    }
}

/// Summary of a `--write` export.
#[derive(Debug, Clone, Serialize)]
pub struct ExportReport {
    pub path: PathBuf,
    pub written: usize,
    pub completed: bool,
}

/// Run `export` against `--write` when given, timing it as the write stage.
pub fn write_results(
    args: &WriteArgs,
    export: impl FnOnce(&mut ExportFile) -> Result<()>,
) -> Result<(Option<ExportReport>, u128)> {
    let Some(path) = &args.write else {
        return Ok((None, 0));
    };
    let (report, millis) = measure("write", || -> Result<ExportReport> {
        let mut file = ExportFile::create(path)?;
        export(&mut file)?;
        file.finish()
    });
    Ok((Some(report?), millis))
}

/// Graph facts repeated at the top of every report.
#[derive(Debug, Clone, Serialize)]
pub struct GraphSummary {
    pub backend: &'static str,
    pub nodes: usize,
    pub relationships: u64,
    pub weighted: bool,
}

impl GraphSummary {
    pub fn of(graph: &AnyGraph) -> Self {
        Self {
            backend: graph.backend(),
            nodes: graph.node_count(),
            relationships: graph.relationship_count(),
            weighted: graph.has_relationship_weights(),
        }
    }

    pub fn write_pretty(&self, w: &mut dyn Write) -> io::Result<()> {
        crate::output::pretty_kv(w, "backend", self.backend)?;
        crate::output::pretty_kv(w, "nodes", self.nodes.to_string())?;
        crate::output::pretty_kv(w, "relationships", self.relationships.to_string())?;
        crate::output::pretty_kv(w, "weighted", self.weighted.to_string())
    }

    pub fn write_text(&self, w: &mut dyn Write) -> io::Result<()> {
        crate::output::text_kv(w, "backend", self.backend)?;
        crate::output::text_kv(w, "nodes", self.nodes)?;
        crate::output::text_kv(w, "relationships", self.relationships)?;
        crate::output::text_kv(w, "weighted", self.weighted)
    }
}

/// Shared trailer: completion flag, timings, and export.
pub fn write_trailer_pretty(
    w: &mut dyn Write,
    completed: bool,
    millis: Millis,
    export: Option<&ExportReport>,
) -> io::Result<()> {
    use crate::output::pretty_kv;

    if !completed {
        pretty_kv(w, "completed", "false (terminated early; partial result)")?;
    }
    pretty_kv(
        w,
        "millis",
        format!(
            "load {} / compute {} / write {}",
            millis.load, millis.compute, millis.write
        ),
    )?;
    if let Some(export) = export {
        pretty_kv(
            w,
            "written",
            format!("{} values to {}", export.written, export.path.display()),
        )?;
    }
    Ok(())
}

pub fn write_trailer_text(
    w: &mut dyn Write,
    completed: bool,
    millis: Millis,
    export: Option<&ExportReport>,
) -> io::Result<()> {
    use crate::output::text_kv;

    text_kv(w, "completed", completed)?;
    text_kv(w, "load_millis", millis.load)?;
    text_kv(w, "compute_millis", millis.compute)?;
    text_kv(w, "write_millis", millis.write)?;
    if let Some(export) = export {
        text_kv(w, "written", export.written)?;
    }
    Ok(())
}
