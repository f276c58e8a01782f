use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! address_newtype {
    ($name:ident) => {
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{:#x}", self.0)
            }
        }
    };
}

address_newtype!(Address);

/// Host notification that the user's cursor moved to a new address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FocusChange {
    pub address: Address,
    pub previous: Option<Address>,
}

impl FocusChange {
    pub fn new(address: Address, previous: Option<Address>) -> Self {
        Self { address, previous }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionInfo {
    pub start: Address,
}

/// What the presence currently says about the analysis session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusSummary {
    pub binary_file_name: String,
    pub function_label: String,
}

impl StatusSummary {
    pub fn new(binary_file_name: impl Into<String>, function_label: impl Into<String>) -> Self {
        Self {
            binary_file_name: binary_file_name.into(),
            function_label: function_label.into(),
        }
    }

    pub fn same_function(&self, other: &StatusSummary) -> bool {
        self.function_label == other.function_label
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresencePayload {
    pub details: String,
    pub state: String,
    pub large_image: String,
    pub large_text: String,
    /// Unix timestamp (seconds) the elapsed-time display counts from.
    pub start: i64,
}

impl PresencePayload {
    pub fn for_summary(
        summary: &StatusSummary,
        large_image: impl Into<String>,
        large_text: impl Into<String>,
        start: i64,
    ) -> Self {
        Self {
            details: format!("Analyzing: {}", summary.binary_file_name),
            state: format!("Function: {}", summary.function_label),
            large_image: large_image.into(),
            large_text: large_text.into(),
            start,
        }
    }
}

#[cfg(test)]
#[path = "tests/domain_tests.rs"]
mod tests;
