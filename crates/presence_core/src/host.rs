//! The slice of the host application the controller depends on.

use std::sync::Arc;

use shared::domain::{Address, FocusChange, FunctionInfo, StatusSummary};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HookHandle(pub u64);

/// Receives the host's focus-change notifications.
pub trait FocusListener: Send + Sync {
    fn screen_address_changed(&self, change: FocusChange);
}

pub trait HostEventSource: Send + Sync {
    fn hook_focus(&self, listener: Arc<dyn FocusListener>) -> HookHandle;
    fn unhook_focus(&self, handle: HookHandle);
}

pub trait HostIntrospection: Send + Sync {
    /// Address under the user's cursor, if any view is focused.
    fn screen_address(&self) -> Option<Address>;
    fn function_containing(&self, address: Address) -> Option<FunctionInfo>;
    fn name_at(&self, address: Address) -> Option<String>;
    fn root_filename(&self) -> String;
}

pub trait Host: HostEventSource + HostIntrospection {}

impl<T: HostEventSource + HostIntrospection> Host for T {}

pub fn function_label<H: HostIntrospection + ?Sized>(
    host: &H,
    address: Option<Address>,
    no_function_label: &str,
) -> String {
    let Some(function) = address.and_then(|address| host.function_containing(address)) else {
        return no_function_label.to_string();
    };

    host.name_at(function.start)
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| format!("sub_{:X}", function.start.0))
}

pub fn resolve_summary<H: HostIntrospection + ?Sized>(
    host: &H,
    address: Option<Address>,
    no_function_label: &str,
) -> StatusSummary {
    StatusSummary::new(
        host.root_filename(),
        function_label(host, address, no_function_label),
    )
}

#[cfg(test)]
#[path = "tests/host_tests.rs"]
mod tests;
