//! Export contract: hand mapped-id-indexed results to an external writer.
//!
//! The engine does not persist anything. [`Exporter::write`] walks mapped ids
//! in order, asks a [`PropertyTranslator`] for each node's value, and passes
//! it to a collaborator-supplied [`PropertyWriter`] keyed by original id.

use serde::Serialize;
use tracing::debug;

use crate::graph::{NodeId, UNREACHABLE};
use crate::ids::IdMap;
use crate::termination::TerminationFlag;

/// Nodes written between termination checks.
pub const EXPORT_BATCH: usize = 10_000;

/// A single exported node property.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Int(i64),
    Double(f64),
    /// Original id of a referenced node.
    Node(u64),
}

/// Maps one entry of a result array to an exported value.
pub trait PropertyTranslator<T: ?Sized> {
    /// `None` means "write nothing for this node".
    fn to_property(&self, data: &T, node: NodeId, ids: &IdMap) -> Option<PropertyValue>;
}

/// Integer arrays such as component or community ids.
#[derive(Debug, Clone, Copy, Default)]
pub struct IntArrayTranslator;

impl PropertyTranslator<[usize]> for IntArrayTranslator {
    fn to_property(&self, data: &[usize], node: NodeId, _: &IdMap) -> Option<PropertyValue> {
        data.get(node).map(|&v| PropertyValue::Int(v as i64))
    }
}

impl PropertyTranslator<[Option<usize>]> for IntArrayTranslator {
    fn to_property(
        &self,
        data: &[Option<usize>],
        node: NodeId,
        _: &IdMap,
    ) -> Option<PropertyValue> {
        data.get(node)
            .copied()
            .flatten()
            .map(|v| PropertyValue::Int(v as i64))
    }
}

/// Double arrays; the unreachable sentinel is not written.
#[derive(Debug, Clone, Copy, Default)]
pub struct DoubleArrayTranslator;

impl PropertyTranslator<[f64]> for DoubleArrayTranslator {
    fn to_property(&self, data: &[f64], node: NodeId, _: &IdMap) -> Option<PropertyValue> {
        data.get(node)
            .copied()
            .filter(|&v| v < UNREACHABLE)
            .map(PropertyValue::Double)
    }
}

/// Mapped-id references, e.g. predecessor tables, written as original ids.
#[derive(Debug, Clone, Copy, Default)]
pub struct NodeRefTranslator;

impl PropertyTranslator<[Option<NodeId>]> for NodeRefTranslator {
    fn to_property(
        &self,
        data: &[Option<NodeId>],
        node: NodeId,
        ids: &IdMap,
    ) -> Option<PropertyValue> {
        let target = data.get(node).copied().flatten()?;
        ids.try_to_original_id(target).ok().map(PropertyValue::Node)
    }
}

/// Collaborator that persists values.
pub trait PropertyWriter {
    type Error;

    fn write(&mut self, original: u64, property: &str, value: PropertyValue)
    -> Result<(), Self::Error>;
}

/// Collects written values; useful for tests and small graphs.
#[derive(Debug, Clone, Default)]
pub struct VecWriter {
    pub values: Vec<(u64, String, PropertyValue)>,
}

impl PropertyWriter for VecWriter {
    type Error = std::convert::Infallible;

    fn write(
        &mut self,
        original: u64,
        property: &str,
        value: PropertyValue,
    ) -> Result<(), Self::Error> {
        self.values.push((original, property.to_string(), value));
        Ok(())
    }
}

/// Result of an export run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportSummary {
    pub written: usize,
    pub completed: bool,
}

/// Drives a translator and writer over every mapped id.
pub struct Exporter<'a> {
    ids: &'a IdMap,
    termination: &'a dyn TerminationFlag,
}

impl<'a> Exporter<'a> {
    #[must_use]
    pub fn new(ids: &'a IdMap, termination: &'a dyn TerminationFlag) -> Self {
        Self { ids, termination }
    }

    /// Write `property` for every node with a translated value.
    ///
    /// # Errors
    ///
    /// Propagates the first writer error.
    pub fn write<T, Tr, W>(
        &self,
        property: &str,
        data: &T,
        translator: &Tr,
        writer: &mut W,
    ) -> Result<ExportSummary, W::Error>
    where
        T: ?Sized,
        Tr: PropertyTranslator<T>,
        W: PropertyWriter,
    {
        let mut written = 0;
        for node in 0..self.ids.node_count() {
            if node % EXPORT_BATCH == 0 && !self.termination.running() {
                debug!(property, written, "export interrupted");
                return Ok(ExportSummary {
                    written,
                    completed: false,
                });
            }
            if let Some(value) = translator.to_property(data, node, self.ids) {
                writer.write(self.ids.to_original_id(node), property, value)?;
                written += 1;
            }
        }
        debug!(property, written, "export finished");
        Ok(ExportSummary {
            written,
            completed: true,
        })
    }
}
