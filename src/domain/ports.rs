use crate::domain::installment::{Installment, InstallmentId, InstallmentStatus};
use crate::domain::loan::{Loan, LoanId, LoanStatus};
use crate::domain::money::Money;
use crate::domain::payment::{Payment, PaymentId};
use crate::error::Result;
use async_trait::async_trait;

pub type LedgerStoreBox = Box<dyn LedgerStore>;

/// A loan together with its non-deleted installments (ascending due date)
/// and its non-deleted payments.
#[derive(Debug, Clone)]
pub struct LoanAggregate {
    pub loan: Loan,
    pub installments: Vec<Installment>,
    pub payments: Vec<Payment>,
}

/// Persistence contract consumed by the ledger engine.
///
/// `create_loan_with_schedule` must be atomic: a failure partway must not
/// leave a loan without its full installment set.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    async fn create_loan_with_schedule(
        &self,
        loan: Loan,
        installments: Vec<Installment>,
    ) -> Result<Loan>;

    async fn get_loan(&self, loan_id: LoanId) -> Result<Option<LoanAggregate>>;

    async fn get_installment(&self, id: InstallmentId) -> Result<Option<Installment>>;

    async fn update_installment(
        &self,
        id: InstallmentId,
        amount_paid: Money,
        status: InstallmentStatus,
    ) -> Result<()>;

    async fn update_installment_status(
        &self,
        id: InstallmentId,
        status: InstallmentStatus,
    ) -> Result<()>;

    async fn create_payment(&self, payment: Payment) -> Result<Payment>;

    async fn get_payment(&self, id: PaymentId) -> Result<Option<Payment>>;

    async fn soft_delete_payment(&self, id: PaymentId) -> Result<()>;

    async fn update_loan_status(&self, loan_id: LoanId, status: LoanStatus) -> Result<()>;
}
