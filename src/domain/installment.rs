use crate::domain::loan::LoanId;
use crate::domain::money::{Amount, Money};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type InstallmentId = Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstallmentStatus {
    Pending,
    Partial,
    Paid,
    /// Time-based status assigned by the overdue flagging pass, never by
    /// the payment allocator.
    Late,
}

impl InstallmentStatus {
    /// Derives the status from accumulated amounts. Pure and idempotent.
    pub fn from_amounts(amount_paid: Money, amount_due: Money) -> Self {
        if amount_paid >= amount_due {
            Self::Paid
        } else if amount_paid.is_positive() {
            Self::Partial
        } else {
            Self::Pending
        }
    }

    /// Whether this installment is eligible for automatic payment
    /// allocation.
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Pending | Self::Partial)
    }
}

/// One scheduled repayment slice of a loan's total.
///
/// `amount_paid` starts at zero, never decreases, and never exceeds
/// `amount_due`; only the payment allocator mutates it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Installment {
    pub id: InstallmentId,
    pub loan_id: LoanId,
    pub due_date: NaiveDate,
    pub amount_due: Money,
    pub amount_paid: Money,
    pub status: InstallmentStatus,
    pub deleted: bool,
}

impl Installment {
    pub fn new(loan_id: LoanId, due_date: NaiveDate, amount_due: Money) -> Self {
        Self {
            id: Uuid::new_v4(),
            loan_id,
            due_date,
            amount_due,
            amount_paid: Money::ZERO,
            status: InstallmentStatus::Pending,
            deleted: false,
        }
    }

    /// Debt still owed on this installment.
    pub fn remaining(&self) -> Money {
        self.amount_due - self.amount_paid
    }

    /// Applies a payment amount and re-derives the status. The caller must
    /// have validated `amount` against `remaining()`.
    pub fn apply(&mut self, amount: Amount) {
        self.amount_paid += amount.into();
        self.status = InstallmentStatus::from_amounts(self.amount_paid, self.amount_due);
    }
}

/// Selects the first installment by ascending due date whose status is
/// Pending or Partial. Late and Paid installments are skipped; a late
/// installment can still be paid by targeting it explicitly.
pub fn first_open(installments: &[Installment]) -> Option<&Installment> {
    installments
        .iter()
        .filter(|i| i.status.is_open())
        .min_by_key(|i| i.due_date)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn installment(due_date: NaiveDate, due: Money) -> Installment {
        Installment::new(Uuid::new_v4(), due_date, due)
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_status_from_amounts() {
        let due = Money::new(dec!(550));
        assert_eq!(
            InstallmentStatus::from_amounts(Money::ZERO, due),
            InstallmentStatus::Pending
        );
        assert_eq!(
            InstallmentStatus::from_amounts(Money::new(dec!(100)), due),
            InstallmentStatus::Partial
        );
        assert_eq!(
            InstallmentStatus::from_amounts(Money::new(dec!(550)), due),
            InstallmentStatus::Paid
        );
        assert_eq!(
            InstallmentStatus::from_amounts(Money::new(dec!(600)), due),
            InstallmentStatus::Paid
        );
    }

    #[test]
    fn test_status_derivation_is_idempotent() {
        let paid = Money::new(dec!(100));
        let due = Money::new(dec!(550));
        let first = InstallmentStatus::from_amounts(paid, due);
        let second = InstallmentStatus::from_amounts(paid, due);
        assert_eq!(first, second);
    }

    #[test]
    fn test_apply_updates_amount_and_status() {
        let mut inst = installment(date(2024, 2, 15), Money::new(dec!(550)));

        inst.apply(Amount::new(dec!(200)).unwrap());
        assert_eq!(inst.amount_paid, Money::new(dec!(200)));
        assert_eq!(inst.status, InstallmentStatus::Partial);
        assert_eq!(inst.remaining(), Money::new(dec!(350)));

        inst.apply(Amount::new(dec!(350)).unwrap());
        assert_eq!(inst.amount_paid, Money::new(dec!(550)));
        assert_eq!(inst.status, InstallmentStatus::Paid);
        assert!(inst.remaining().is_zero());
    }

    #[test]
    fn test_first_open_picks_earliest_due_date() {
        let due = Money::new(dec!(100));
        let mut first = installment(date(2024, 2, 15), due);
        let second = installment(date(2024, 3, 15), due);
        let third = installment(date(2024, 4, 15), due);

        let schedule = [second.clone(), first.clone(), third.clone()];
        let selected = first_open(&schedule).unwrap();
        assert_eq!(selected.id, first.id);

        // A fully paid installment is skipped.
        first.apply(Amount::new(dec!(100)).unwrap());
        let schedule = [second.clone(), first, third];
        let selected = first_open(&schedule).unwrap();
        assert_eq!(selected.id, second.id);
    }

    #[test]
    fn test_first_open_skips_late_installments() {
        let due = Money::new(dec!(100));
        let mut late = installment(date(2024, 2, 15), due);
        late.status = InstallmentStatus::Late;
        let open = installment(date(2024, 3, 15), due);

        let schedule = [late.clone(), open.clone()];
        let selected = first_open(&schedule).unwrap();
        assert_eq!(selected.id, open.id);

        assert!(first_open(&[late]).is_none());
    }
}
