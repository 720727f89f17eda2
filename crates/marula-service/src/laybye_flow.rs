//! # Lay-bye Lifecycle Flow
//!
//! Contract creation, payment recording, and cancellation.
//!
//! ## Payment Recording
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    record_payment                                       │
//! │                                                                         │
//! │  1. Fetch contract detail, recompute remaining (pre-submit check)      │
//! │  2. Validate: positive amount, amount ≤ remaining                      │
//! │  3. Storage write → PaymentOutcome { new_status, remaining }           │
//! │  4. Branch on the OUTCOME, never on local math:                        │
//! │     ├── completed → final receipt + presentation CompletionSummary     │
//! │     └── active    → regular payment receipt                            │
//! │  5. Print receipt fire-and-forget (errors logged only)                 │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The local remaining-balance math in step 1 exists to block obviously
//! invalid submissions early. The storage layer recomputes from what it
//! holds; its returned outcome is the decision.

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::ServiceResult;
use crate::receipt::{ReceiptKind, ReceiptPrinter};
use marula_core::laybye::{
    CompletionSummary, LaybyeContract, LaybyeItem, LaybyePayment, LaybyeStatus, PaymentCadence,
    PaymentOutcome,
};
use marula_core::sequence::LAYBYE_PREFIX;
use marula_core::{validation, CoreError, Money, STANDARD_LAYBYE_TERM_DAYS};
use marula_db::{Database, LaybyeDetail};

// =============================================================================
// Request / Response Types
// =============================================================================

/// A line item going onto a new contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewLaybyeItem {
    pub name: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
}

/// Input for contract creation. The contract total is the sum of the line
/// items; the deposit is collected up front.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewLaybye {
    pub customer_id: String,
    pub items: Vec<NewLaybyeItem>,
    pub deposit_cents: i64,
    #[serde(default)]
    pub cadence: PaymentCadence,
}

/// Result of a recorded payment.
#[derive(Debug, Clone)]
pub struct PaymentRecorded {
    /// The authoritative outcome from the storage write.
    pub outcome: PaymentOutcome,
    /// Which receipt template was selected.
    pub receipt: ReceiptKind,
    /// Presentation-only figures, present when the contract completed.
    pub completion: Option<CompletionSummary>,
}

// =============================================================================
// Service
// =============================================================================

/// Orchestrates the lay-bye contract lifecycle.
#[derive(Clone)]
pub struct LaybyeService {
    db: Database,
    printer: Arc<dyn ReceiptPrinter>,
}

impl LaybyeService {
    /// Creates a new LaybyeService.
    pub fn new(db: Database, printer: Arc<dyn ReceiptPrinter>) -> Self {
        LaybyeService { db, printer }
    }

    /// Creates a contract with its line items.
    pub async fn create_contract(&self, req: NewLaybye) -> ServiceResult<LaybyeDetail> {
        if req.items.is_empty() {
            return Err(marula_core::ValidationError::Required {
                field: "items".to_string(),
            }
            .into());
        }
        for item in &req.items {
            validation::validate_name(&item.name)?;
            validation::validate_quantity(item.quantity)?;
            validation::validate_non_negative(
                "unit price",
                Money::from_cents(item.unit_price_cents),
            )?;
        }
        validation::validate_non_negative("deposit", Money::from_cents(req.deposit_cents))?;

        let total_cents: i64 = req
            .items
            .iter()
            .map(|i| i.unit_price_cents * i.quantity)
            .sum();

        let now = Utc::now();
        let contract_number = self.db.sequences().next_number(LAYBYE_PREFIX).await?;
        let contract = LaybyeContract {
            id: Uuid::new_v4().to_string(),
            contract_number,
            customer_id: req.customer_id,
            total_cents,
            deposit_cents: req.deposit_cents,
            cadence: req.cadence,
            status: LaybyeStatus::Active,
            started_at: now,
            completed_at: None,
            created_at: now,
            updated_at: now,
        };

        let items: Vec<LaybyeItem> = req
            .items
            .into_iter()
            .map(|i| LaybyeItem {
                id: Uuid::new_v4().to_string(),
                contract_id: contract.id.clone(),
                name: i.name,
                quantity: i.quantity,
                unit_price_cents: i.unit_price_cents,
                created_at: now,
            })
            .collect();

        self.db.laybyes().create_contract(&contract, &items).await?;

        info!(
            contract_id = %contract.id,
            number = %contract.contract_number,
            total = total_cents,
            "Lay-bye contract created"
        );

        let detail = self
            .db
            .laybyes()
            .get_detail(&contract.id)
            .await?
            .ok_or_else(|| CoreError::ContractNotFound(contract.id.clone()))?;

        Ok(detail)
    }

    /// Records a payment, honoring the storage-returned outcome.
    pub async fn record_payment(
        &self,
        contract_id: &str,
        amount_cents: i64,
        method: &str,
        notes: Option<String>,
    ) -> ServiceResult<PaymentRecorded> {
        let detail = self
            .db
            .laybyes()
            .get_detail(contract_id)
            .await?
            .ok_or_else(|| CoreError::ContractNotFound(contract_id.to_string()))?;

        if detail.contract.status != LaybyeStatus::Active {
            return Err(CoreError::ContractNotActive {
                contract_id: contract_id.to_string(),
                current_status: detail.contract.status.as_str().to_string(),
            }
            .into());
        }

        // Pre-submit validation against the locally recomputed balance
        let amount = Money::from_cents(amount_cents);
        validation::validate_payment_amount(amount)?;
        let remaining = detail.remaining_amount();
        if amount > remaining {
            return Err(CoreError::PaymentExceedsBalance {
                remaining: remaining.cents(),
                requested: amount_cents,
            }
            .into());
        }

        let payment = LaybyePayment {
            id: Uuid::new_v4().to_string(),
            contract_id: contract_id.to_string(),
            amount_cents,
            method: method.to_string(),
            notes,
            paid_at: Utc::now(),
        };

        // The storage layer recomputes and decides; we branch on its answer
        let outcome = self.db.laybyes().record_payment(&payment).await?;

        let (receipt, completion) = if outcome.completed() {
            let completion = CompletionSummary::from_dates(
                detail.contract.started_at,
                Utc::now(),
                STANDARD_LAYBYE_TERM_DAYS,
            );
            (ReceiptKind::LaybyeFinal, Some(completion))
        } else {
            (ReceiptKind::LaybyePayment, None)
        };

        self.print_receipt(receipt, &detail, &payment, &outcome, completion.as_ref());

        info!(
            contract_id = %contract_id,
            amount = amount_cents,
            remaining = outcome.remaining_cents,
            completed = outcome.completed(),
            "Lay-bye payment recorded"
        );

        Ok(PaymentRecorded {
            outcome,
            receipt,
            completion,
        })
    }

    /// Cancels an active contract.
    pub async fn cancel_contract(&self, contract_id: &str) -> ServiceResult<()> {
        self.db.laybyes().cancel_contract(contract_id).await?;
        info!(contract_id = %contract_id, "Lay-bye contract cancelled");
        Ok(())
    }

    /// Fire-and-forget receipt dispatch. Printer failures are logged only.
    fn print_receipt(
        &self,
        kind: ReceiptKind,
        detail: &LaybyeDetail,
        payment: &LaybyePayment,
        outcome: &PaymentOutcome,
        completion: Option<&CompletionSummary>,
    ) {
        let payload = json!({
            "contract_number": detail.contract.contract_number,
            "amount_cents": payment.amount_cents,
            "method": payment.method,
            "remaining_cents": outcome.remaining_cents,
            "days_taken": completion.map(|c| c.days_taken),
            "days_early": completion.map(|c| c.days_early),
        });

        if let Err(e) = self.printer.print(kind, &payload) {
            warn!(
                contract_id = %detail.contract.id,
                error = %e,
                "Receipt printing failed; payment stands"
            );
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::receipt::{LogPrinter, ReceiptError};
    use marula_core::{Customer, CustomerStatus, CustomerType};
    use marula_db::DbConfig;
    use std::sync::Mutex;

    /// Records what was printed; optionally fails every job.
    #[derive(Default)]
    struct SpyPrinter {
        jobs: Mutex<Vec<ReceiptKind>>,
        fail: bool,
    }

    impl ReceiptPrinter for SpyPrinter {
        fn print(&self, kind: ReceiptKind, _payload: &serde_json::Value) -> Result<(), ReceiptError> {
            self.jobs.lock().unwrap().push(kind);
            if self.fail {
                Err(ReceiptError::Unavailable("out of paper".to_string()))
            } else {
                Ok(())
            }
        }
    }

    async fn setup(printer: Arc<dyn ReceiptPrinter>) -> (Database, LaybyeService) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let now = Utc::now();
        db.customers()
            .insert(&Customer {
                id: "c1".to_string(),
                customer_number: "CUST-000001".to_string(),
                name: "Alice".to_string(),
                email: None,
                phone: None,
                status: CustomerStatus::Active,
                customer_type: CustomerType::Regular,
                total_purchases: 0,
                total_spent_cents: 0,
                last_purchase_at: None,
                tags: vec![],
                created_at: now,
                updated_at: now,
            })
            .await
            .unwrap();
        let service = LaybyeService::new(db.clone(), printer);
        (db, service)
    }

    fn thousand_rand_contract() -> NewLaybye {
        NewLaybye {
            customer_id: "c1".to_string(),
            items: vec![NewLaybyeItem {
                name: "Lounge suite".to_string(),
                quantity: 1,
                unit_price_cents: 100_000, // R1000.00
            }],
            deposit_cents: 20_000, // R200.00
            cadence: PaymentCadence::Monthly,
        }
    }

    #[tokio::test]
    async fn test_payment_sequence_to_completion() {
        let printer = Arc::new(SpyPrinter::default());
        let (_db, svc) = setup(printer.clone()).await;

        let detail = svc.create_contract(thousand_rand_contract()).await.unwrap();
        let id = detail.contract.id.clone();
        assert_eq!(detail.contract.total_cents, 100_000);
        assert_eq!(detail.remaining_amount().cents(), 80_000);

        // Payment 1: R300 → remaining R500, regular receipt
        let recorded = svc.record_payment(&id, 30_000, "cash", None).await.unwrap();
        assert_eq!(recorded.outcome.remaining_cents, 50_000);
        assert_eq!(recorded.outcome.new_status, LaybyeStatus::Active);
        assert_eq!(recorded.receipt, ReceiptKind::LaybyePayment);
        assert!(recorded.completion.is_none());

        // Payment 2: R500 → remaining 0, completion honored from the
        // storage outcome, final receipt selected
        let recorded = svc.record_payment(&id, 50_000, "card", None).await.unwrap();
        assert_eq!(recorded.outcome.remaining_cents, 0);
        assert!(recorded.outcome.completed());
        assert_eq!(recorded.receipt, ReceiptKind::LaybyeFinal);
        let completion = recorded.completion.unwrap();
        assert_eq!(completion.days_taken, 0);
        assert_eq!(completion.days_early, STANDARD_LAYBYE_TERM_DAYS);

        let jobs = printer.jobs.lock().unwrap();
        assert_eq!(
            *jobs,
            vec![ReceiptKind::LaybyePayment, ReceiptKind::LaybyeFinal]
        );
    }

    #[tokio::test]
    async fn test_overpayment_blocked_before_write() {
        let (db, svc) = setup(Arc::new(LogPrinter)).await;
        let detail = svc.create_contract(thousand_rand_contract()).await.unwrap();
        let id = detail.contract.id.clone();

        let err = svc.record_payment(&id, 90_000, "cash", None).await.unwrap_err();
        assert!(matches!(
            err,
            crate::ServiceError::Core(CoreError::PaymentExceedsBalance {
                remaining: 80_000,
                requested: 90_000
            })
        ));

        // Nothing was written
        let payments = db.laybyes().get_payments(&id).await.unwrap();
        assert!(payments.is_empty());
    }

    #[tokio::test]
    async fn test_printer_failure_does_not_fail_payment() {
        let printer = Arc::new(SpyPrinter {
            jobs: Mutex::new(vec![]),
            fail: true,
        });
        let (db, svc) = setup(printer).await;
        let detail = svc.create_contract(thousand_rand_contract()).await.unwrap();
        let id = detail.contract.id.clone();

        // Printing fails; the payment still stands
        let recorded = svc.record_payment(&id, 10_000, "cash", None).await.unwrap();
        assert_eq!(recorded.outcome.remaining_cents, 70_000);

        let payments = db.laybyes().get_payments(&id).await.unwrap();
        assert_eq!(payments.len(), 1);
    }

    #[tokio::test]
    async fn test_empty_contract_rejected() {
        let (_db, svc) = setup(Arc::new(LogPrinter)).await;
        let result = svc
            .create_contract(NewLaybye {
                customer_id: "c1".to_string(),
                items: vec![],
                deposit_cents: 0,
                cadence: PaymentCadence::Weekly,
            })
            .await;
        assert!(result.is_err());
    }
}
