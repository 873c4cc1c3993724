//! # Register Error Types
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Register Error Categories                           │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │  Business       │  │  Configuration  │  │  External I/O           │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  Core (refusal) │  │  InvalidConfig  │  │  Io / Json              │ │
//! │  │                 │  │  ConfigParse    │  │  Settings               │ │
//! │  │                 │  │                 │  │  Print / Printer        │ │
//! │  │                 │  │                 │  │  NoPrinter              │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use aura_core::CoreError;
use thiserror::Error;

use crate::printer::PrintError;

pub type RegisterResult<T> = Result<T, RegisterError>;

#[derive(Debug, Error)]
pub enum RegisterError {
    /// The store refused the operation. State is unchanged.
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Invalid register configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Settings storage error: {0}")]
    Settings(String),

    /// The order was created but its receipt did not print.
    #[error("Order {order_id} created but receipt failed to print: {source}")]
    Print {
        order_id: String,
        #[source]
        source: PrintError,
    },

    #[error(transparent)]
    Printer(#[from] PrintError),

    #[error("No receipt printer configured")]
    NoPrinter,
}

impl RegisterError {
    /// True for refusals coming from the store rather than from I/O.
    pub fn is_refusal(&self) -> bool {
        matches!(self, RegisterError::Core(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_refusal_classification() {
        assert!(RegisterError::from(CoreError::EmptyCart).is_refusal());
        assert!(!RegisterError::NoPrinter.is_refusal());
    }

    #[test]
    fn test_print_error_keeps_order_id() {
        let err = RegisterError::Print {
            order_id: "o-1".into(),
            source: PrintError::Offline("10.0.0.9:9100".into()),
        };
        assert!(err.to_string().starts_with("Order o-1 created"));
    }
}
