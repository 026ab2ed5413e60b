use crate::domain::installment::Installment;
use crate::domain::loan::{DebtorId, LenderId, Loan, LoanStatus};
use crate::domain::money::Money;
use crate::error::{LedgerError, Result};
use chrono::{Months, NaiveDate};
use rust_decimal::{Decimal, RoundingStrategy};
use uuid::Uuid;

/// Terms for a new loan, as accepted at creation time.
#[derive(Debug, Clone)]
pub struct LoanTerms {
    pub lender_id: LenderId,
    pub debtor_id: DebtorId,
    pub amount: Money,
    /// Simple, non-compounding percentage.
    pub interest_rate: Decimal,
    pub term: u32,
    pub start_date: NaiveDate,
    pub due_date: NaiveDate,
}

/// A loan together with its full installment schedule, ready to be
/// persisted atomically.
#[derive(Debug, Clone)]
pub struct LoanSchedule {
    pub loan: Loan,
    pub installments: Vec<Installment>,
}

impl LoanSchedule {
    /// Generates the amortization schedule for a new loan.
    ///
    /// `total_with_interest = amount + amount * rate / 100`, split equally
    /// over `term` installments due one calendar month apart starting one
    /// month after `start_date`. Each installment is rounded down to 2
    /// decimal places and the final installment absorbs the remainder, so
    /// the amounts due always sum exactly to `total_with_interest` and no
    /// installment is ever negative.
    pub fn generate(terms: LoanTerms) -> Result<Self> {
        if !terms.amount.is_positive() {
            return Err(LedgerError::Validation(
                "loan amount must be positive".to_string(),
            ));
        }
        if terms.interest_rate < Decimal::ZERO {
            return Err(LedgerError::Validation(
                "interest rate must not be negative".to_string(),
            ));
        }
        if terms.term == 0 {
            return Err(LedgerError::Validation(
                "term must be at least one installment".to_string(),
            ));
        }

        let principal = terms.amount.as_decimal();
        let total = principal + principal * terms.interest_rate / Decimal::ONE_HUNDRED;
        let total_with_interest = Money::new(total.round_dp(2));

        // Floored to 2 decimal places so the final installment absorbs a
        // non-negative remainder.
        let split = Money::new(
            (total_with_interest.as_decimal() / Decimal::from(terms.term))
                .round_dp_with_strategy(2, RoundingStrategy::ToZero),
        );

        let loan = Loan {
            id: Uuid::new_v4(),
            lender_id: terms.lender_id,
            debtor_id: terms.debtor_id,
            amount: terms.amount,
            interest_rate: terms.interest_rate,
            term: terms.term,
            total_with_interest,
            start_date: terms.start_date,
            due_date: terms.due_date,
            status: LoanStatus::Active,
            deleted: false,
        };

        let mut installments = Vec::with_capacity(terms.term as usize);
        let mut allocated = Money::ZERO;
        for i in 0..terms.term {
            let due_date = terms
                .start_date
                .checked_add_months(Months::new(i + 1))
                .ok_or_else(|| {
                    LedgerError::Validation("installment due date out of range".to_string())
                })?;
            let amount_due = if i + 1 == terms.term {
                // Remainder lands on the last installment.
                total_with_interest - allocated
            } else {
                split
            };
            allocated += amount_due;
            installments.push(Installment::new(loan.id, due_date, amount_due));
        }

        Ok(Self { loan, installments })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn terms(amount: Decimal, rate: Decimal, term: u32, start: NaiveDate) -> LoanTerms {
        LoanTerms {
            lender_id: Uuid::new_v4(),
            debtor_id: Uuid::new_v4(),
            amount: Money::new(amount),
            interest_rate: rate,
            term,
            start_date: start,
            due_date: start
                .checked_add_months(Months::new(term))
                .unwrap(),
        }
    }

    #[test]
    fn test_simple_interest_split() {
        // 1000 at 10% over 2 installments: total 1100, two slices of 550.
        let schedule =
            LoanSchedule::generate(terms(dec!(1000), dec!(10), 2, date(2024, 1, 15))).unwrap();

        assert_eq!(schedule.loan.total_with_interest, Money::new(dec!(1100)));
        assert_eq!(schedule.installments.len(), 2);
        for inst in &schedule.installments {
            assert_eq!(inst.amount_due, Money::new(dec!(550)));
            assert!(inst.amount_paid.is_zero());
        }
        assert_eq!(schedule.installments[0].due_date, date(2024, 2, 15));
        assert_eq!(schedule.installments[1].due_date, date(2024, 3, 15));
    }

    #[test]
    fn test_rounding_remainder_goes_to_last_installment() {
        let schedule =
            LoanSchedule::generate(terms(dec!(1000), dec!(0), 3, date(2024, 1, 15))).unwrap();

        assert_eq!(schedule.installments[0].amount_due, Money::new(dec!(333.33)));
        assert_eq!(schedule.installments[1].amount_due, Money::new(dec!(333.33)));
        assert_eq!(schedule.installments[2].amount_due, Money::new(dec!(333.34)));
    }

    #[test]
    fn test_floored_split_never_mints_negative_installment() {
        // 0.10 over 12: a half-up split of 0.01 each would overshoot and
        // drive the last installment below zero.
        let schedule =
            LoanSchedule::generate(terms(dec!(0.10), dec!(0), 12, date(2024, 1, 15))).unwrap();

        for inst in &schedule.installments {
            assert!(inst.amount_due >= Money::ZERO);
        }
        assert_eq!(
            schedule.installments.last().unwrap().amount_due,
            Money::new(dec!(0.10))
        );
        let sum = schedule
            .installments
            .iter()
            .fold(Money::ZERO, |acc, i| acc + i.amount_due);
        assert_eq!(sum, schedule.loan.total_with_interest);
    }

    #[test]
    fn test_amounts_due_sum_to_total() {
        for (amount, rate, term) in [
            (dec!(1000), dec!(10), 2u32),
            (dec!(1000), dec!(0), 3),
            (dec!(999.99), dec!(7.5), 7),
            (dec!(0.03), dec!(0), 2),
            (dec!(0.10), dec!(0), 12),
        ] {
            let schedule =
                LoanSchedule::generate(terms(amount, rate, term, date(2024, 1, 15))).unwrap();
            let sum = schedule
                .installments
                .iter()
                .fold(Money::ZERO, |acc, i| acc + i.amount_due);
            assert_eq!(sum, schedule.loan.total_with_interest);
        }
    }

    #[test]
    fn test_due_dates_clamp_to_end_of_month() {
        let schedule =
            LoanSchedule::generate(terms(dec!(1200), dec!(0), 3, date(2024, 1, 31))).unwrap();
        assert_eq!(schedule.installments[0].due_date, date(2024, 2, 29));
        assert_eq!(schedule.installments[1].due_date, date(2024, 3, 31));
        assert_eq!(schedule.installments[2].due_date, date(2024, 4, 30));
    }

    #[test]
    fn test_invalid_terms_rejected() {
        let start = date(2024, 1, 15);
        assert!(matches!(
            LoanSchedule::generate(terms(dec!(0), dec!(10), 2, start)),
            Err(LedgerError::Validation(_))
        ));
        assert!(matches!(
            LoanSchedule::generate(terms(dec!(1000), dec!(-1), 2, start)),
            Err(LedgerError::Validation(_))
        ));
        assert!(matches!(
            LoanSchedule::generate(terms(dec!(1000), dec!(10), 0, start)),
            Err(LedgerError::Validation(_))
        ));
    }
}
