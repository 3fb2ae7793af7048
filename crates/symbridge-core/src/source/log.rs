//! Structured namespace-resolution trace events.
//!
//! The sink is informational only; nothing a sink does can change what a
//! lookup returns.

use std::fmt;

use super::NamespaceMap;
use crate::symbols::NamespaceHandle;
use crate::target::Module;

/// One step of a namespace resolution.
///
/// `invocation` increases by one for every resolution a bridge performs, so
/// events of interleaved (nested) resolutions can be told apart.
#[derive(Debug, Clone, Copy)]
pub enum LookupEvent<'a>
{
    SearchStarted
    {
        invocation: u32,
        name: &'a str,
        parent: Option<&'a NamespaceMap>,
    },
    /// The module has no symbol backend and was skipped.
    ModuleSkipped
    {
        invocation: u32,
        module: &'a Module,
    },
    NamespaceFound
    {
        invocation: u32,
        module: &'a Module,
        namespace: &'a NamespaceHandle,
    },
    SearchFinished
    {
        invocation: u32,
        name: &'a str,
        matches: usize,
    },
}

impl LookupEvent<'_>
{
    pub fn invocation(&self) -> u32
    {
        match *self {
            LookupEvent::SearchStarted { invocation, .. }
            | LookupEvent::ModuleSkipped { invocation, .. }
            | LookupEvent::NamespaceFound { invocation, .. }
            | LookupEvent::SearchFinished { invocation, .. } => invocation,
        }
    }
}

impl fmt::Display for LookupEvent<'_>
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        match self {
            LookupEvent::SearchStarted {
                invocation,
                name,
                parent: Some(parent),
            } => write!(
                f,
                "[{invocation}] searching for namespace {name} in {} parent namespace(s)",
                parent.len()
            ),
            LookupEvent::SearchStarted {
                invocation,
                name,
                parent: None,
            } => write!(f, "[{invocation}] searching for top-level namespace {name}"),
            LookupEvent::ModuleSkipped { invocation, module } => {
                write!(f, "[{invocation}] skipping {}: no symbol backend", module.file_name())
            }
            LookupEvent::NamespaceFound {
                invocation,
                module,
                namespace,
            } => write!(f, "[{invocation}] found namespace {namespace} in {}", module.file_name()),
            LookupEvent::SearchFinished {
                invocation,
                name,
                matches,
            } => write!(f, "[{invocation}] namespace {name}: {matches} match(es)"),
        }
    }
}

/// Receiver of [`LookupEvent`]s.
pub trait LookupLog
{
    fn record(&self, event: &LookupEvent<'_>);
}

/// Discards every event. The default sink.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullLog;

impl LookupLog for NullLog
{
    fn record(&self, _event: &LookupEvent<'_>) {}
}

/// Forwards events to `tracing` at debug level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLog;

impl LookupLog for TracingLog
{
    fn record(&self, event: &LookupEvent<'_>)
    {
        match *event {
            LookupEvent::SearchStarted { invocation, name, parent } => tracing::debug!(
                invocation,
                name,
                parent_entries = parent.map(NamespaceMap::len),
                "Namespace search started"
            ),
            LookupEvent::ModuleSkipped { invocation, module } => tracing::debug!(
                invocation,
                module = %module.file_name(),
                "Module has no symbol backend"
            ),
            LookupEvent::NamespaceFound {
                invocation,
                module,
                namespace,
            } => tracing::debug!(
                invocation,
                module = %module.file_name(),
                namespace = %namespace,
                "Found namespace"
            ),
            LookupEvent::SearchFinished {
                invocation,
                name,
                matches,
            } => tracing::debug!(invocation, name, matches, "Namespace search finished"),
        }
    }
}
