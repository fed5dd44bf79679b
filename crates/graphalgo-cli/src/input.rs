//! Edge-list files.
//!
//! One record per line, fields separated by whitespace or commas:
//!
//! ```text
//! # comment
//! 7            isolated node
//! 1 2          relationship 1 -> 2 without a weight
//! 1 3 0.5      relationship 1 -> 3 with weight 0.5
//! ```
//!
//! Nodes are declared in order of first appearance.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use anyhow::{Context, Result, bail};
use graphalgo_core::EdgeListSource;
use tracing::debug;

/// Read an edge-list file into an [`EdgeListSource`].
pub fn read_edge_list(path: &Path) -> Result<EdgeListSource> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    parse_edge_list(BufReader::new(file))
        .with_context(|| format!("Failed to read edge list {}", path.display()))
}

pub fn parse_edge_list(reader: impl BufRead) -> Result<EdgeListSource> {
    let mut source = EdgeListSource::new();
    let mut records = 0_usize;
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let line_no = index + 1;
        let record = line.split('#').next().unwrap_or_default().trim();
        if record.is_empty() {
            continue;
        }
        let fields: Vec<&str> = record
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|f| !f.is_empty())
            .collect();
        match fields.as_slice() {
            [node] => {
                source.add_node(parse_id(node, line_no)?);
            }
            [s, t] => {
                source.add_edge(parse_id(s, line_no)?, parse_id(t, line_no)?);
            }
            [s, t, w] => {
                let weight: f64 = w
                    .parse()
                    .with_context(|| format!("line {line_no}: invalid weight '{w}'"))?;
                source.add_weighted_edge(parse_id(s, line_no)?, parse_id(t, line_no)?, weight);
            }
            _ => bail!(
                "line {line_no}: expected 'node', 'source target' or 'source target weight', got {} fields",
                fields.len()
            ),
        }
        records += 1;
    }
    debug!(records, edges = source.edge_count(), "edge list parsed");
    Ok(source)
}

fn parse_id(field: &str, line_no: usize) -> Result<u64> {
    field
        .parse()
        .with_context(|| format!("line {line_no}: invalid node id '{field}'"))
}
