use crate::domain::installment::InstallmentId;
use crate::domain::loan::LoanId;
use crate::domain::money::Amount;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type PaymentId = Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Cash,
    Transfer,
    Card,
    Other,
}

/// A monetary application recorded against exactly one installment.
///
/// Immutable once created except for soft-deletion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub id: PaymentId,
    pub loan_id: LoanId,
    pub installment_id: InstallmentId,
    pub payment_date: NaiveDate,
    pub amount_paid: Amount,
    pub method: PaymentMethod,
    pub deleted: bool,
}

impl Payment {
    pub fn new(
        loan_id: LoanId,
        installment_id: InstallmentId,
        payment_date: NaiveDate,
        amount_paid: Amount,
        method: PaymentMethod,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            loan_id,
            installment_id,
            payment_date,
            amount_paid,
            method,
            deleted: false,
        }
    }
}
