//! Recorded navigation traces and a host that replays them.

use std::{
    fs,
    path::Path,
    sync::{Arc, Mutex, PoisonError},
    time::Duration,
};

use anyhow::{bail, Context};
use presence_core::{FocusListener, HookHandle, HostEventSource, HostIntrospection};
use serde::Deserialize;
use shared::domain::{Address, FocusChange, FunctionInfo};

#[derive(Debug, Clone, Deserialize)]
pub struct Trace {
    pub binary: String,
    #[serde(default)]
    pub functions: Vec<TraceFunction>,
    pub events: Vec<TraceEvent>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TraceFunction {
    pub start: u64,
    pub end: u64,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TraceEvent {
    Focus { at_ms: u64, address: u64 },
    Toggle { at_ms: u64 },
}

impl TraceEvent {
    pub fn at(&self) -> Duration {
        match self {
            Self::Focus { at_ms, .. } | Self::Toggle { at_ms } => Duration::from_millis(*at_ms),
        }
    }
}

pub fn parse_trace(raw: &str) -> anyhow::Result<Trace> {
    let mut trace: Trace = serde_json::from_str(raw).context("invalid trace json")?;

    for function in &trace.functions {
        if function.start >= function.end {
            bail!(
                "function at {:#x} has an empty range (end {:#x})",
                function.start,
                function.end
            );
        }
    }
    trace.events.sort_by_key(TraceEvent::at);
    Ok(trace)
}

pub fn load_trace(path: &Path) -> anyhow::Result<Trace> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read trace '{}'", path.display()))?;
    parse_trace(&raw).with_context(|| format!("failed to load trace '{}'", path.display()))
}

#[derive(Default)]
struct TraceHostState {
    cursor: Option<Address>,
    listeners: Vec<(HookHandle, Arc<dyn FocusListener>)>,
    next_hook: u64,
}

/// Simulated host: a fixed function table and a cursor moved by the trace.
pub struct TraceHost {
    binary: String,
    functions: Vec<TraceFunction>,
    state: Mutex<TraceHostState>,
}

impl TraceHost {
    pub fn new(trace: &Trace) -> Self {
        Self {
            binary: trace.binary.clone(),
            functions: trace.functions.clone(),
            state: Mutex::new(TraceHostState::default()),
        }
    }

    pub fn navigate(&self, address: Address) {
        let (previous, listeners) = {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            let previous = state.cursor.replace(address);
            let listeners: Vec<_> = state
                .listeners
                .iter()
                .map(|(_, listener)| Arc::clone(listener))
                .collect();
            (previous, listeners)
        };

        let change = FocusChange::new(address, previous);
        for listener in listeners {
            listener.screen_address_changed(change);
        }
    }
}

impl HostEventSource for TraceHost {
    fn hook_focus(&self, listener: Arc<dyn FocusListener>) -> HookHandle {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.next_hook += 1;
        let handle = HookHandle(state.next_hook);
        state.listeners.push((handle, listener));
        handle
    }

    fn unhook_focus(&self, handle: HookHandle) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.listeners.retain(|(hook, _)| *hook != handle);
    }
}

impl HostIntrospection for TraceHost {
    fn screen_address(&self) -> Option<Address> {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .cursor
    }

    fn function_containing(&self, address: Address) -> Option<FunctionInfo> {
        self.functions
            .iter()
            .find(|function| (function.start..function.end).contains(&address.0))
            .map(|function| FunctionInfo {
                start: Address(function.start),
            })
    }

    fn name_at(&self, address: Address) -> Option<String> {
        self.functions
            .iter()
            .find(|function| function.start == address.0)
            .and_then(|function| function.name.clone())
    }

    fn root_filename(&self) -> String {
        self.binary.clone()
    }
}

#[cfg(test)]
#[path = "tests/trace_tests.rs"]
mod tests;
