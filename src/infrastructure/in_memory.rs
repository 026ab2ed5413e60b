use crate::domain::installment::{Installment, InstallmentId, InstallmentStatus};
use crate::domain::loan::{Loan, LoanId, LoanStatus};
use crate::domain::money::Money;
use crate::domain::payment::{Payment, PaymentId};
use crate::domain::ports::{LedgerStore, LoanAggregate};
use crate::error::{LedgerError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// A thread-safe in-memory adapter for the ledger store port.
///
/// Uses `Arc<RwLock<HashMap<..>>>` for shared concurrent access. Multi-row
/// inserts happen under a single write lock, so a loan is never visible
/// without its full installment set.
#[derive(Default, Clone)]
pub struct InMemoryLedgerStore {
    loans: Arc<RwLock<HashMap<LoanId, Loan>>>,
    installments: Arc<RwLock<HashMap<InstallmentId, Installment>>>,
    payments: Arc<RwLock<HashMap<PaymentId, Payment>>>,
}

impl InMemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LedgerStore for InMemoryLedgerStore {
    async fn create_loan_with_schedule(
        &self,
        loan: Loan,
        installments: Vec<Installment>,
    ) -> Result<Loan> {
        let mut loans = self.loans.write().await;
        let mut stored = self.installments.write().await;
        loans.insert(loan.id, loan.clone());
        for installment in installments {
            stored.insert(installment.id, installment);
        }
        Ok(loan)
    }

    async fn get_loan(&self, loan_id: LoanId) -> Result<Option<LoanAggregate>> {
        let loans = self.loans.read().await;
        let Some(loan) = loans.get(&loan_id).filter(|l| !l.deleted).cloned() else {
            return Ok(None);
        };

        let mut installments: Vec<Installment> = self
            .installments
            .read()
            .await
            .values()
            .filter(|i| i.loan_id == loan_id && !i.deleted)
            .cloned()
            .collect();
        installments.sort_by_key(|i| i.due_date);

        let payments: Vec<Payment> = self
            .payments
            .read()
            .await
            .values()
            .filter(|p| p.loan_id == loan_id && !p.deleted)
            .cloned()
            .collect();

        Ok(Some(LoanAggregate {
            loan,
            installments,
            payments,
        }))
    }

    async fn get_installment(&self, id: InstallmentId) -> Result<Option<Installment>> {
        let installments = self.installments.read().await;
        Ok(installments.get(&id).filter(|i| !i.deleted).cloned())
    }

    async fn update_installment(
        &self,
        id: InstallmentId,
        amount_paid: Money,
        status: InstallmentStatus,
    ) -> Result<()> {
        let mut installments = self.installments.write().await;
        let installment = installments.get_mut(&id).ok_or(LedgerError::NotFound {
            entity: "installment",
        })?;
        installment.amount_paid = amount_paid;
        installment.status = status;
        Ok(())
    }

    async fn update_installment_status(
        &self,
        id: InstallmentId,
        status: InstallmentStatus,
    ) -> Result<()> {
        let mut installments = self.installments.write().await;
        let installment = installments.get_mut(&id).ok_or(LedgerError::NotFound {
            entity: "installment",
        })?;
        installment.status = status;
        Ok(())
    }

    async fn create_payment(&self, payment: Payment) -> Result<Payment> {
        let mut payments = self.payments.write().await;
        payments.insert(payment.id, payment.clone());
        Ok(payment)
    }

    async fn get_payment(&self, id: PaymentId) -> Result<Option<Payment>> {
        let payments = self.payments.read().await;
        Ok(payments.get(&id).filter(|p| !p.deleted).cloned())
    }

    async fn soft_delete_payment(&self, id: PaymentId) -> Result<()> {
        let mut payments = self.payments.write().await;
        let payment = payments
            .get_mut(&id)
            .ok_or(LedgerError::NotFound { entity: "payment" })?;
        payment.deleted = true;
        Ok(())
    }

    async fn update_loan_status(&self, loan_id: LoanId, status: LoanStatus) -> Result<()> {
        let mut loans = self.loans.write().await;
        let loan = loans
            .get_mut(&loan_id)
            .ok_or(LedgerError::NotFound { entity: "loan" })?;
        loan.status = status;
        Ok(())
    }
}
