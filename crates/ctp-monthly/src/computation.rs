//! The computation contract shared with the workflow orchestrator.
//!
//! A computation enumerates contexts, resolves a context's inputs from the
//! catalog (`build_task`), and turns those inputs into outputs (`run_task`).

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use hirs_common::{Satellite, TimeInterval, VersionSet};
use storage::ProductRef;

use crate::error::JobResult;

/// Name of the single output dataset.
pub const OUTPUT_DATASET: &str = "out";

/// Labelled task inputs, in registration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskInputs {
    entries: Vec<(String, PathBuf)>,
}

impl TaskInputs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an input. A label registered twice keeps its first position
    /// and takes the new path.
    pub fn insert(&mut self, label: impl Into<String>, path: impl Into<PathBuf>) {
        let label = label.into();
        let path = path.into();
        match self.entries.iter_mut().find(|(l, _)| *l == label) {
            Some(entry) => entry.1 = path,
            None => self.entries.push((label, path)),
        }
    }

    pub fn get(&self, label: &str) -> Option<&Path> {
        self.entries
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, p)| p.as_path())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Path)> {
        self.entries.iter().map(|(l, p)| (l.as_str(), p.as_path()))
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(l, _)| l.as_str())
    }

    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.entries.iter().map(|(_, p)| p.as_path())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Outputs produced by a task, keyed by dataset name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskOutputs {
    pub out: PathBuf,
}

impl TaskOutputs {
    pub fn get(&self, dataset: &str) -> Option<&Path> {
        (dataset == OUTPUT_DATASET).then_some(self.out.as_path())
    }
}

/// A pipeline computation.
#[async_trait]
pub trait Computation: Send + Sync {
    type Context: Clone + Ord + Send + Sync + std::fmt::Display;

    /// Name registered with the orchestrator and the catalog.
    fn name(&self) -> &'static str;

    /// Every context of this computation touched by `interval`, in order.
    fn find_contexts(
        &self,
        interval: &TimeInterval,
        satellite: Satellite,
        versions: &VersionSet,
    ) -> Vec<Self::Context>;

    /// Catalog directory of a context's products.
    fn context_path(&self, context: &Self::Context) -> PathBuf;

    /// File name of a context's output product.
    fn output_filename(&self, context: &Self::Context) -> String;

    /// Catalog handle of a context's output product.
    fn product(&self, context: &Self::Context) -> ProductRef {
        ProductRef::new(
            self.name(),
            self.context_path(context),
            self.output_filename(context),
        )
    }

    /// Resolve the inputs of one context.
    async fn build_task(&self, context: &Self::Context) -> JobResult<TaskInputs>;

    /// Produce the outputs of one context from its resolved inputs.
    async fn run_task(
        &self,
        inputs: &TaskInputs,
        context: &Self::Context,
    ) -> JobResult<TaskOutputs>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inputs_keep_insertion_order() {
        let mut inputs = TaskInputs::new();
        inputs.insert("CTPD-2", "/data/c.nc");
        inputs.insert("CTPD-0", "/data/a.nc");
        inputs.insert("CTPD-1", "/data/b.nc");

        let labels: Vec<_> = inputs.labels().collect();
        assert_eq!(labels, vec!["CTPD-2", "CTPD-0", "CTPD-1"]);
        assert_eq!(inputs.get("CTPD-0"), Some(Path::new("/data/a.nc")));
    }

    #[test]
    fn test_inputs_relabel_replaces_path() {
        let mut inputs = TaskInputs::new();
        inputs.insert("CTPD-0", "/data/a.nc");
        inputs.insert("CTPD-1", "/data/b.nc");
        inputs.insert("CTPD-0", "/data/z.nc");

        assert_eq!(inputs.len(), 2);
        let paths: Vec<_> = inputs.paths().collect();
        assert_eq!(paths, vec![Path::new("/data/z.nc"), Path::new("/data/b.nc")]);
    }

    #[test]
    fn test_outputs_lookup() {
        let outputs = TaskOutputs {
            out: PathBuf::from("/work/ctp.monthly.metop-b.d201706.nc"),
        };
        assert!(outputs.get("out").is_some());
        assert!(outputs.get("other").is_none());
    }
}
