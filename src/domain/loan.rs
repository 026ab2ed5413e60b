use crate::domain::installment::{Installment, InstallmentStatus};
use crate::domain::money::Money;
use crate::domain::payment::Payment;
use crate::error::{LedgerError, Result};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type LoanId = Uuid;
pub type LenderId = Uuid;
pub type DebtorId = Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoanStatus {
    Active,
    Paid,
    Defaulted,
    Canceled,
}

impl LoanStatus {
    /// Derives the loan status from its full installment set. Pure and
    /// idempotent; never yields Canceled.
    pub fn derive(installments: &[Installment]) -> Self {
        if installments.is_empty() {
            return Self::Active;
        }
        if installments
            .iter()
            .all(|i| i.status == InstallmentStatus::Paid)
        {
            Self::Paid
        } else if installments
            .iter()
            .any(|i| i.status == InstallmentStatus::Late)
        {
            Self::Defaulted
        } else {
            Self::Active
        }
    }

    /// Paid and Canceled are terminal; no transition leaves them.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Paid | Self::Canceled)
    }

    /// Transition table: `Active <-> Defaulted -> Paid`;
    /// `Active | Defaulted -> Canceled`. Self-transitions are allowed.
    pub fn can_transition(self, next: Self) -> bool {
        if self == next {
            return true;
        }
        matches!(self, Self::Active | Self::Defaulted)
    }
}

/// A principal amount lent to a debtor, repaid in fixed installments.
///
/// `total_with_interest` is computed once at creation and is the immutable
/// ceiling for all payments against the loan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Loan {
    pub id: LoanId,
    pub lender_id: LenderId,
    pub debtor_id: DebtorId,
    pub amount: Money,
    /// Simple, non-compounding percentage.
    pub interest_rate: Decimal,
    pub term: u32,
    pub total_with_interest: Money,
    pub start_date: NaiveDate,
    pub due_date: NaiveDate,
    pub status: LoanStatus,
    pub deleted: bool,
}

impl Loan {
    /// Single authorization predicate shared by every operation that
    /// touches a loan, its installments, or its payments.
    pub fn authorize(&self, caller: LenderId) -> Result<()> {
        if self.lender_id == caller {
            Ok(())
        } else {
            Err(LedgerError::Unauthorized)
        }
    }

    /// `total_with_interest` minus the sum of all non-deleted payments.
    pub fn remaining_debt(&self, payments: &[Payment]) -> Money {
        let total_paid = payments
            .iter()
            .filter(|p| !p.deleted)
            .fold(Money::ZERO, |acc, p| acc + p.amount_paid.into());
        self.total_with_interest - total_paid
    }
}
