use crate::domain::installment::{first_open, InstallmentId, InstallmentStatus};
use crate::domain::loan::{DebtorId, LenderId, Loan, LoanId, LoanStatus};
use crate::domain::money::{Amount, Money};
use crate::domain::payment::{Payment, PaymentId, PaymentMethod};
use crate::domain::ports::{LedgerStoreBox, LoanAggregate};
use crate::domain::schedule::{LoanSchedule, LoanTerms};
use crate::error::{DebtScope, LedgerError, Result};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex};
use tokio::sync::Mutex;

/// Request to open a new loan.
#[derive(Debug, Clone)]
pub struct CreateLoan {
    pub debtor_id: DebtorId,
    pub amount: Decimal,
    pub interest_rate: Decimal,
    pub term: u32,
    pub start_date: NaiveDate,
    pub due_date: NaiveDate,
}

/// Request to record a payment against a loan. When `installment_id` is
/// omitted the payment is applied to the first pending or partial
/// installment by due date.
#[derive(Debug, Clone)]
pub struct CreatePayment {
    pub loan_id: LoanId,
    pub installment_id: Option<InstallmentId>,
    pub amount: Decimal,
    pub payment_date: NaiveDate,
    pub method: PaymentMethod,
}

/// Read-only view of a loan's position, for presentation.
#[derive(Debug, Clone, Serialize)]
pub struct LoanSummary {
    pub loan_id: LoanId,
    pub status: LoanStatus,
    pub total_with_interest: Money,
    pub total_paid: Money,
    pub remaining_debt: Money,
    pub installments: Vec<InstallmentSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct InstallmentSummary {
    pub id: InstallmentId,
    pub due_date: NaiveDate,
    pub amount_due: Money,
    pub amount_paid: Money,
    pub status: InstallmentStatus,
}

/// The loan ledger engine.
///
/// Owns the persistence port and serializes mutations per loan: each
/// payment's read-validate-write sequence runs under that loan's mutex, so
/// two concurrent payments against the same loan can never both pass the
/// remaining-debt check against a stale total. Requests against different
/// loans proceed without coordination.
pub struct LoanLedger {
    store: LedgerStoreBox,
    loan_locks: StdMutex<HashMap<LoanId, Arc<Mutex<()>>>>,
}

impl LoanLedger {
    pub fn new(store: LedgerStoreBox) -> Self {
        Self {
            store,
            loan_locks: StdMutex::new(HashMap::new()),
        }
    }

    fn loan_lock(&self, loan_id: LoanId) -> Arc<Mutex<()>> {
        let mut locks = self.loan_locks.lock().expect("loan lock map poisoned");
        locks.entry(loan_id).or_default().clone()
    }

    /// Drops a terminal loan's mutex so the map does not grow without
    /// bound. A straggling request simply creates a fresh one and then
    /// fails the status preconditions.
    fn release_loan_lock(&self, loan_id: LoanId) {
        let mut locks = self.loan_locks.lock().expect("loan lock map poisoned");
        locks.remove(&loan_id);
    }

    async fn require_loan(&self, loan_id: LoanId) -> Result<LoanAggregate> {
        self.store
            .get_loan(loan_id)
            .await?
            .ok_or(LedgerError::NotFound { entity: "loan" })
    }

    /// Creates a loan and its full installment schedule in one atomic
    /// insert.
    pub async fn create_loan(&self, input: CreateLoan, lender_id: LenderId) -> Result<Loan> {
        let schedule = LoanSchedule::generate(LoanTerms {
            lender_id,
            debtor_id: input.debtor_id,
            amount: Money::new(input.amount),
            interest_rate: input.interest_rate,
            term: input.term,
            start_date: input.start_date,
            due_date: input.due_date,
        })?;
        self.store
            .create_loan_with_schedule(schedule.loan, schedule.installments)
            .await
    }

    /// Records a payment: validates the allocator preconditions, resolves
    /// the target installment, persists the payment, updates the
    /// installment, and re-derives the loan status, all under the loan's
    /// mutex.
    pub async fn create_payment(&self, input: CreatePayment, caller: LenderId) -> Result<Payment> {
        let amount = Amount::new(input.amount)?;

        let lock = self.loan_lock(input.loan_id);
        let _guard = lock.lock().await;

        let aggregate = self.require_loan(input.loan_id).await?;
        let loan = &aggregate.loan;
        loan.authorize(caller)?;

        match loan.status {
            LoanStatus::Canceled => {
                return Err(LedgerError::invalid_state(
                    "cannot create payment for a canceled loan",
                ));
            }
            LoanStatus::Paid => {
                return Err(LedgerError::invalid_state("loan is already fully paid"));
            }
            LoanStatus::Active | LoanStatus::Defaulted => {}
        }

        let remaining = loan.remaining_debt(&aggregate.payments);
        if Money::from(amount) > remaining {
            return Err(LedgerError::AmountExceeds {
                scope: DebtScope::Loan,
                requested: amount.value(),
                remaining: remaining.as_decimal(),
            });
        }

        let mut installment = match input.installment_id {
            Some(id) => {
                let installment = self
                    .store
                    .get_installment(id)
                    .await?
                    .ok_or(LedgerError::NotFound {
                        entity: "installment",
                    })?;
                if installment.loan_id != input.loan_id {
                    return Err(LedgerError::InstallmentMismatch);
                }
                if installment.status == InstallmentStatus::Paid {
                    return Err(LedgerError::invalid_state(
                        "installment is already fully paid",
                    ));
                }
                installment
            }
            None => first_open(&aggregate.installments).cloned().ok_or_else(|| {
                LedgerError::invalid_state("no pending or partial installment to apply payment")
            })?,
        };

        // The installment ceiling binds however the target was resolved;
        // amount_paid must never exceed amount_due.
        if Money::from(amount) > installment.remaining() {
            return Err(LedgerError::AmountExceeds {
                scope: DebtScope::Installment,
                requested: amount.value(),
                remaining: installment.remaining().as_decimal(),
            });
        }

        // No mutation happens before this point; everything after must
        // complete as a unit.
        let payment = self
            .store
            .create_payment(Payment::new(
                input.loan_id,
                installment.id,
                input.payment_date,
                amount,
                input.method,
            ))
            .await?;

        installment.apply(amount);
        self.store
            .update_installment(installment.id, installment.amount_paid, installment.status)
            .await?;

        let aggregate = self.require_loan(input.loan_id).await?;
        let status = self.apply_derived_status(&aggregate).await?;
        if status.is_terminal() {
            self.release_loan_lock(input.loan_id);
        }

        Ok(payment)
    }

    /// Soft-deletes a payment. Deliberately non-reversing: the deleted
    /// payment stops counting toward remaining loan debt, but installment
    /// and loan state keep the effect it had when applied.
    pub async fn delete_payment(&self, payment_id: PaymentId, caller: LenderId) -> Result<Payment> {
        let payment = self
            .store
            .get_payment(payment_id)
            .await?
            .ok_or(LedgerError::NotFound { entity: "payment" })?;

        let lock = self.loan_lock(payment.loan_id);
        let _guard = lock.lock().await;

        let aggregate = self.require_loan(payment.loan_id).await?;
        aggregate.loan.authorize(caller)?;

        self.store.soft_delete_payment(payment_id).await?;
        Ok(payment)
    }

    /// Cancels a loan. Canceled is terminal and blocks all further
    /// payments; the transition is only legal from Active or Defaulted.
    pub async fn cancel_loan(&self, loan_id: LoanId, caller: LenderId) -> Result<()> {
        let lock = self.loan_lock(loan_id);
        let _guard = lock.lock().await;

        let aggregate = self.require_loan(loan_id).await?;
        aggregate.loan.authorize(caller)?;

        if !aggregate.loan.status.can_transition(LoanStatus::Canceled) {
            return Err(LedgerError::invalid_state(format!(
                "cannot cancel a loan in status {:?}",
                aggregate.loan.status
            )));
        }
        self.store
            .update_loan_status(loan_id, LoanStatus::Canceled)
            .await?;
        self.release_loan_lock(loan_id);
        Ok(())
    }

    /// Marks installments past their due date as Late and re-derives the
    /// loan status. This is the time-based pass; the payment allocator
    /// never assigns Late.
    pub async fn flag_overdue(&self, loan_id: LoanId, as_of: NaiveDate) -> Result<LoanStatus> {
        let lock = self.loan_lock(loan_id);
        let _guard = lock.lock().await;

        let aggregate = self.require_loan(loan_id).await?;
        if aggregate.loan.status.is_terminal() {
            return Ok(aggregate.loan.status);
        }

        let mut changed = false;
        for installment in &aggregate.installments {
            if installment.status.is_open() && installment.due_date < as_of {
                self.store
                    .update_installment_status(installment.id, InstallmentStatus::Late)
                    .await?;
                changed = true;
            }
        }

        if changed {
            let aggregate = self.require_loan(loan_id).await?;
            self.apply_derived_status(&aggregate).await
        } else {
            Ok(aggregate.loan.status)
        }
    }

    /// Read-only aggregate view for presentation.
    pub async fn loan_summary(&self, loan_id: LoanId, caller: LenderId) -> Result<LoanSummary> {
        let aggregate = self.require_loan(loan_id).await?;
        aggregate.loan.authorize(caller)?;

        let remaining = aggregate.loan.remaining_debt(&aggregate.payments);
        Ok(LoanSummary {
            loan_id: aggregate.loan.id,
            status: aggregate.loan.status,
            total_with_interest: aggregate.loan.total_with_interest,
            total_paid: aggregate.loan.total_with_interest - remaining,
            remaining_debt: remaining,
            installments: aggregate
                .installments
                .iter()
                .map(|i| InstallmentSummary {
                    id: i.id,
                    due_date: i.due_date,
                    amount_due: i.amount_due,
                    amount_paid: i.amount_paid,
                    status: i.status,
                })
                .collect(),
        })
    }

    /// Re-derives the loan status from its installment set and persists it
    /// through the transition table. A derived transition out of a
    /// terminal state is rejected rather than silently overwriting.
    async fn apply_derived_status(&self, aggregate: &LoanAggregate) -> Result<LoanStatus> {
        let current = aggregate.loan.status;
        let derived = LoanStatus::derive(&aggregate.installments);
        if derived == current {
            return Ok(current);
        }
        if !current.can_transition(derived) {
            return Err(LedgerError::invalid_state(format!(
                "refusing to move loan from terminal status {current:?} to {derived:?}"
            )));
        }
        self.store
            .update_loan_status(aggregate.loan.id, derived)
            .await?;
        Ok(derived)
    }
}
