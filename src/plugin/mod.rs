//! Scan observers.
//!
//! Plugins introduce only external side effects and have no control over
//! core state, so composing several of them cannot change a scan's result.
//! Every hook invocation is isolated: a failing hook is recorded and logged,
//! and the scan, the remaining items, and the remaining plugins proceed.

use serde::Serialize;
use tracing::warn;

use crate::item::types::Item;

/// Scan-level context handed to `on_start` and embedded in the output.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanMetadata {
    /// RFC 3339 timestamp of scan start.
    pub created_at: String,
    /// Filesystem path (or VCS URL) of the analyzed tree.
    pub source: String,
}

/// Complete result of a scan: metadata plus the ordered item list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScanOutput {
    #[serde(flatten)]
    pub metadata: ScanMetadata,
    pub data: Vec<Item>,
}

/// A registered scan observer.
///
/// Hooks fire at fixed lifecycle points: `on_start` once before any item,
/// `on_collect` once per surviving item in emission order, `on_end` once
/// with the complete output. Return values never feed back into the scan.
pub trait Plugin: Send {
    /// Name used to attribute recorded faults.
    fn name(&self) -> &str;

    /// Called once, before any item is produced.
    fn on_start(&mut self, _metadata: &ScanMetadata) -> anyhow::Result<()> {
        Ok(())
    }

    /// Called once per finalized, filter-surviving item.
    fn on_collect(&mut self, _item: &Item) -> anyhow::Result<()> {
        Ok(())
    }

    /// Called once, after all projects are processed.
    fn on_end(&mut self, _output: &ScanOutput) -> anyhow::Result<()> {
        Ok(())
    }
}

/// A recorded hook failure.
#[derive(Debug, Clone, PartialEq)]
pub struct PluginFault {
    pub plugin: String,
    pub hook: &'static str,
    pub message: String,
}

/// Drives registered plugins through the scan lifecycle, isolating each
/// hook invocation.
#[derive(Default)]
pub struct PluginRunner {
    plugins: Vec<Box<dyn Plugin>>,
    faults: Vec<PluginFault>,
}

impl PluginRunner {
    pub fn new(plugins: Vec<Box<dyn Plugin>>) -> Self {
        Self {
            plugins,
            faults: Vec::new(),
        }
    }

    /// Notifies every plugin that the scan is starting.
    pub fn start(&mut self, metadata: &ScanMetadata) {
        let Self { plugins, faults } = self;
        for plugin in plugins {
            if let Err(err) = plugin.on_start(metadata) {
                record(faults, plugin.name(), "on_start", err);
            }
        }
    }

    /// Hands one finalized item to every plugin, in registration order.
    pub fn collect(&mut self, item: &Item) {
        let Self { plugins, faults } = self;
        for plugin in plugins {
            if let Err(err) = plugin.on_collect(item) {
                record(faults, plugin.name(), "on_collect", err);
            }
        }
    }

    /// Hands the complete output to every plugin.
    pub fn end(&mut self, output: &ScanOutput) {
        let Self { plugins, faults } = self;
        for plugin in plugins {
            if let Err(err) = plugin.on_end(output) {
                record(faults, plugin.name(), "on_end", err);
            }
        }
    }

    /// Hook failures recorded so far, in occurrence order.
    pub fn faults(&self) -> &[PluginFault] {
        &self.faults
    }
}

fn record(faults: &mut Vec<PluginFault>, plugin: &str, hook: &'static str, err: anyhow::Error) {
    warn!(plugin, hook, %err, "plugin hook failed; continuing");
    faults.push(PluginFault {
        plugin: plugin.to_string(),
        hook,
        message: err.to_string(),
    });
}
