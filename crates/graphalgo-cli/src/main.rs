#![forbid(unsafe_code)]

mod cmd;
mod input;
mod output;

use std::env;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use graphalgo_core::config::load_engine_config;
use graphalgo_core::{EngineConfig, GraphError, timing};
use output::{CliError, OutputMode, render_error, resolve_output_mode};
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "galgo: in-memory graph analytics over edge-list files",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit stage timing report to stderr.
    #[arg(long, global = true)]
    timing: bool,

    /// Output format: pretty, text, or json.
    #[arg(long, global = true, value_enum)]
    format: Option<OutputMode>,

    /// Shorthand for `--format json`.
    #[arg(long, global = true, hide = true)]
    json: bool,

    /// TOML file with `[load]`, `[louvain]`, and `concurrency` settings.
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Stop the algorithm after this many milliseconds and report the
    /// partial result.
    #[arg(long, global = true, value_name = "MS")]
    timeout_ms: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    fn output_mode(&self) -> OutputMode {
        resolve_output_mode(self.format, self.json)
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        next_help_heading = "Inspect",
        about = "Describe a graph",
        long_about = "Load an edge list and report node, relationship, and degree statistics.",
        after_help = "EXAMPLES:\n    # Summarize a graph\n    galgo stats edges.txt\n\n    # Force the paged backend\n    galgo stats edges.txt --backend huge"
    )]
    Stats(cmd::stats::StatsArgs),

    #[command(
        next_help_heading = "Paths",
        about = "Dijkstra shortest path",
        long_about = "Compute weighted shortest paths from one source node. Requires weights.",
        after_help = "EXAMPLES:\n    # Cheapest path between two nodes\n    galgo shortest-path edges.txt --weighted --source 1 --target 9\n\n    # Distances to every reachable node, written as JSON lines\n    galgo shortest-path edges.txt --weighted --source 1 --write distances.jsonl"
    )]
    ShortestPath(cmd::shortest_path::ShortestPathArgs),

    #[command(
        next_help_heading = "Centrality",
        about = "Betweenness centrality",
        long_about = "Brandes betweenness centrality over unweighted shortest paths.",
        after_help = "EXAMPLES:\n    # Top ten bridging nodes\n    galgo betweenness edges.txt --top 10\n\n    # Treat relationships as undirected\n    galgo betweenness edges.txt --direction both"
    )]
    Betweenness(cmd::betweenness::BetweennessArgs),

    #[command(
        next_help_heading = "Components",
        about = "Strongly connected components",
        long_about = "Partition nodes into strongly connected components.",
        after_help = "EXAMPLES:\n    # Component statistics\n    galgo scc edges.txt\n\n    # Write the partition id of every node\n    galgo scc edges.txt --write partition.jsonl"
    )]
    Scc(cmd::scc::SccArgs),

    #[command(
        next_help_heading = "Communities",
        about = "Louvain community detection",
        long_about = "Multilevel modularity optimization. Weighted when the graph is loaded with weights.",
        after_help = "EXAMPLES:\n    # Unweighted, partitioned across 8 threads\n    galgo louvain edges.txt --concurrency 8\n\n    # Weighted, writing community ids\n    galgo louvain edges.txt --weighted --write communities.jsonl"
    )]
    Louvain(cmd::louvain::LouvainArgs),
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env("GALGO_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if verbose || env::var("DEBUG").is_ok() {
            "galgo=debug,graphalgo_core=debug,graphalgo_algo=debug,info"
        } else {
            "warn"
        })
    });

    let format = env::var("GALGO_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    // Logs go to stderr so stdout stays parseable.
    let registry = tracing_subscriber::registry().with(filter);
    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn engine_config(path: Option<&Path>) -> anyhow::Result<EngineConfig> {
    path.map_or_else(|| Ok(EngineConfig::default()), |path| load_engine_config(path))
}

fn run(cli: &Cli, output: OutputMode) -> anyhow::Result<()> {
    let config = engine_config(cli.config.as_deref()).context("Failed to load configuration")?;
    debug!(?config, "configuration resolved");
    let ctx = cmd::RunContext {
        config,
        output,
        timeout: cli.timeout_ms.map(Duration::from_millis),
    };

    match &cli.command {
        Commands::Stats(args) => timing::timed("cmd.stats", || cmd::stats::run_stats(args, &ctx)),
        Commands::ShortestPath(args) => timing::timed("cmd.shortest_path", || {
            cmd::shortest_path::run_shortest_path(args, &ctx)
        }),
        Commands::Betweenness(args) => timing::timed("cmd.betweenness", || {
            cmd::betweenness::run_betweenness(args, &ctx)
        }),
        Commands::Scc(args) => timing::timed("cmd.scc", || cmd::scc::run_scc(args, &ctx)),
        Commands::Louvain(args) => {
            timing::timed("cmd.louvain", || cmd::louvain::run_louvain(args, &ctx))
        }
    }
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let timing_enabled = cli.timing || timing::timing_enabled_from_env();
    timing::set_timing_enabled(timing_enabled);
    timing::clear_timings();

    if cli.verbose {
        info!("Verbose mode enabled");
    }

    let output = cli.output_mode();
    let command_result = run(&cli, output);

    if timing_enabled {
        let report = timing::collect_report();
        if report.is_empty() {
            eprintln!("timing report: no samples recorded");
        } else {
            eprintln!("timing report:");
            eprintln!("{}", report.display_table());
            eprintln!("timing report (json):");
            eprintln!("{}", serde_json::to_string_pretty(&report.to_json())?);
        }
    }

    match command_result {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(err) => {
            let cli_error = err
                .chain()
                .find_map(|cause| cause.downcast_ref::<GraphError>())
                .map_or_else(
                    || CliError::new(format!("{err:#}")),
                    |graph_error| CliError {
                        message: format!("{err:#}"),
                        ..CliError::from(graph_error)
                    },
                );
            render_error(output, &cli_error)?;
            Ok(ExitCode::FAILURE)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn timing_flag_parses_before_and_after_subcommand() {
        let cli = Cli::parse_from(["galgo", "--timing", "scc", "g.txt"]);
        assert!(cli.timing);
        let cli = Cli::parse_from(["galgo", "scc", "g.txt", "--timing"]);
        assert!(cli.timing);
    }

    #[test]
    fn json_flag_sets_output_mode() {
        let cli = Cli::parse_from(["galgo", "stats", "g.txt", "--json"]);
        assert!(cli.output_mode().is_json());
    }

    #[test]
    fn format_flag_wins() {
        let cli = Cli::parse_from(["galgo", "--format", "text", "stats", "g.txt"]);
        assert_eq!(cli.output_mode(), OutputMode::Text);
    }

    #[test]
    fn shortest_path_requires_source() {
        assert!(Cli::try_parse_from(["galgo", "shortest-path", "g.txt"]).is_err());
        let cli = Cli::parse_from([
            "galgo",
            "shortest-path",
            "g.txt",
            "--source",
            "3",
            "--target",
            "9",
            "--direction",
            "in",
        ]);
        let Commands::ShortestPath(args) = cli.command else {
            panic!("expected shortest-path");
        };
        assert_eq!(args.source, 3);
        assert_eq!(args.target, Some(9));
        assert_eq!(args.direction, graphalgo_core::Direction::Incoming);
    }

    #[test]
    fn backend_accepts_heavy_alias() {
        let cli = Cli::parse_from(["galgo", "stats", "g.txt", "--backend", "heavy"]);
        let Commands::Stats(args) = cli.command else {
            panic!("expected stats");
        };
        assert_eq!(args.graph.backend, Some(graphalgo_core::Backend::Dense));
        assert!(Cli::try_parse_from(["galgo", "stats", "g.txt", "--backend", "tape"]).is_err());
    }

    #[test]
    fn louvain_overrides_parse() {
        let cli = Cli::parse_from([
            "galgo",
            "--timeout-ms",
            "250",
            "louvain",
            "g.txt",
            "--max-iterations",
            "5",
            "--concurrency",
            "2",
            "--write",
            "out.jsonl",
        ]);
        assert_eq!(cli.timeout_ms, Some(250));
        let Commands::Louvain(args) = cli.command else {
            panic!("expected louvain");
        };
        assert_eq!(args.max_iterations, Some(5));
        assert_eq!(args.concurrency, Some(2));
        assert_eq!(args.write.write, Some(PathBuf::from("out.jsonl")));
    }

    #[test]
    fn missing_config_file_is_reported() {
        let err = engine_config(Some(Path::new("/nonexistent/galgo.toml"))).unwrap_err();
        assert!(format!("{err:#}").contains("galgo.toml"));
    }
}
