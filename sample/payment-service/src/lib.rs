//! A small payment-processing service used as a demo fixture.
//!
//! This crate is what mendbot gets pointed at in demos and evaluations; the
//! demo issues quote its exact error strings. The business rules here are
//! pinned — see DESIGN.md at the workspace root — and the agent core takes
//! no dependency on them.

use std::collections::HashMap;
use std::time::SystemTime;

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum PaymentError {
    #[error("Amount cannot be negative")]
    NegativeAmount,
    #[error("Discount cannot be negative")]
    NegativeDiscount,
    #[error("Discount cannot exceed 100%")]
    DiscountTooLarge,
}

/// Lifecycle of a recorded transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionStatus {
    Pending,
    Completed,
    Failed,
    Refunded,
}

#[derive(Debug, Clone)]
pub struct Transaction {
    pub id: String,
    pub amount: f64,
    pub currency: String,
    pub status: TransactionStatus,
    pub timestamp: SystemTime,
}

/// In-memory payment processor.
pub struct PaymentProcessor {
    tax_rate: f64,
    transactions: HashMap<String, Transaction>,
}

impl Default for PaymentProcessor {
    fn default() -> Self {
        Self::new(0.20)
    }
}

impl PaymentProcessor {
    pub fn new(tax_rate: f64) -> Self {
        Self {
            tax_rate,
            transactions: HashMap::new(),
        }
    }

    /// Total due for `amount` including tax.
    pub fn calculate_total_with_tax(&self, amount: f64) -> Result<f64, PaymentError> {
        if amount < 0.0 {
            return Err(PaymentError::NegativeAmount);
        }
        Ok(amount * (1.0 + self.tax_rate))
    }

    /// Linear percentage discount on `amount`.
    pub fn apply_discount(&self, amount: f64, discount_percent: f64) -> Result<f64, PaymentError> {
        if discount_percent < 0.0 {
            return Err(PaymentError::NegativeDiscount);
        }
        if discount_percent > 100.0 {
            return Err(PaymentError::DiscountTooLarge);
        }
        Ok(amount - (amount * (discount_percent / 100.0)))
    }

    /// Processes a refund against a recorded transaction.
    ///
    /// Returns a status string rather than a `Result`; the demo issues
    /// quote these strings verbatim.
    pub fn process_refund(&mut self, transaction_id: &str, refund_amount: f64) -> String {
        let Some(transaction) = self.transactions.get_mut(transaction_id) else {
            return "ERROR: Transaction not found".to_string();
        };

        // The zero-amount check comes before the refund-amount checks.
        if transaction.amount == 0.0 {
            return "ERROR: Cannot process refund for zero amount".to_string();
        }

        if refund_amount <= 0.0 {
            return "ERROR: Refund amount must be greater than zero".to_string();
        }

        if refund_amount > transaction.amount {
            return "ERROR: Refund exceeds original amount".to_string();
        }

        transaction.status = TransactionStatus::Refunded;
        let ratio = refund_amount / transaction.amount;
        format!("SUCCESS: Refund ratio {ratio:.2} processed")
    }

    pub fn add_transaction(&mut self, id: &str, amount: f64, currency: &str) {
        self.transactions.insert(
            id.to_string(),
            Transaction {
                id: id.to_string(),
                amount,
                currency: currency.to_string(),
                status: TransactionStatus::Pending,
                timestamp: SystemTime::now(),
            },
        );
    }

    pub fn transaction(&self, id: &str) -> Option<&Transaction> {
        self.transactions.get(id)
    }
}
