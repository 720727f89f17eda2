//! # Receipt Printer Seam
//!
//! Flows hand a transaction-type tag and a payload to a [`ReceiptPrinter`]
//! and move on: printing is fire-and-forget, and printer failures are
//! caught and logged by the flow, never surfaced to the user.

use serde_json::Value;
use thiserror::Error;
use tracing::info;

/// Transaction-type tag selecting the receipt template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiptKind {
    /// Regular lay-bye installment receipt.
    LaybyePayment,
    /// Final lay-bye receipt, printed when the contract completes.
    LaybyeFinal,
    /// Till closing slip with the reconciliation variance.
    TillClose,
}

impl ReceiptKind {
    /// Template tag as passed to the printing service.
    pub const fn as_str(&self) -> &'static str {
        match self {
            ReceiptKind::LaybyePayment => "laybye_payment",
            ReceiptKind::LaybyeFinal => "laybye_final",
            ReceiptKind::TillClose => "till_close",
        }
    }
}

/// Receipt printing errors.
#[derive(Debug, Error)]
pub enum ReceiptError {
    /// The printer could not be reached or rejected the job.
    #[error("Printer unavailable: {0}")]
    Unavailable(String),
}

/// The printing seam. Implementations render and dispatch the payload.
pub trait ReceiptPrinter: Send + Sync {
    /// Prints a receipt of the given kind.
    fn print(&self, kind: ReceiptKind, payload: &Value) -> Result<(), ReceiptError>;
}

/// Default printer: writes the job through tracing instead of paper.
///
/// Useful in development and as the fallback when no hardware printer is
/// configured.
#[derive(Debug, Default, Clone)]
pub struct LogPrinter;

impl ReceiptPrinter for LogPrinter {
    fn print(&self, kind: ReceiptKind, payload: &Value) -> Result<(), ReceiptError> {
        info!(kind = kind.as_str(), %payload, "Printing receipt");
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_kind_tags() {
        assert_eq!(ReceiptKind::LaybyePayment.as_str(), "laybye_payment");
        assert_eq!(ReceiptKind::LaybyeFinal.as_str(), "laybye_final");
        assert_eq!(ReceiptKind::TillClose.as_str(), "till_close");
    }

    #[test]
    fn test_log_printer_accepts_jobs() {
        let printer = LogPrinter;
        assert!(printer
            .print(ReceiptKind::LaybyePayment, &json!({"amount": 30000}))
            .is_ok());
    }
}
