use crate::domain::payment::PaymentMethod;
use crate::error::{LedgerError, Result};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::io::Read;

/// One row of the ledger command CSV. Loans are referenced by a
/// caller-chosen label; installments by their 1-based position in the
/// schedule.
#[derive(Debug, Clone, PartialEq)]
pub enum LedgerCommand {
    CreateLoan {
        loan: String,
        amount: Decimal,
        rate: Decimal,
        term: u32,
        start_date: NaiveDate,
    },
    Payment {
        loan: String,
        installment: Option<u32>,
        amount: Decimal,
        date: NaiveDate,
        method: PaymentMethod,
    },
    Cancel {
        loan: String,
    },
    FlagOverdue {
        loan: String,
        as_of: NaiveDate,
    },
}

#[derive(Debug, Deserialize)]
struct RawCommand {
    op: String,
    loan: String,
    installment: Option<u32>,
    amount: Option<Decimal>,
    rate: Option<Decimal>,
    term: Option<u32>,
    date: Option<NaiveDate>,
    method: Option<PaymentMethod>,
}

fn required<T>(value: Option<T>, column: &str, op: &str) -> Result<T> {
    value.ok_or_else(|| LedgerError::Validation(format!("{op} command requires a {column}")))
}

impl TryFrom<RawCommand> for LedgerCommand {
    type Error = LedgerError;

    fn try_from(raw: RawCommand) -> Result<Self> {
        match raw.op.as_str() {
            "loan" => Ok(Self::CreateLoan {
                amount: required(raw.amount, "amount", "loan")?,
                rate: required(raw.rate, "rate", "loan")?,
                term: required(raw.term, "term", "loan")?,
                start_date: required(raw.date, "date", "loan")?,
                loan: raw.loan,
            }),
            "payment" => Ok(Self::Payment {
                installment: raw.installment,
                amount: required(raw.amount, "amount", "payment")?,
                date: required(raw.date, "date", "payment")?,
                method: required(raw.method, "method", "payment")?,
                loan: raw.loan,
            }),
            "cancel" => Ok(Self::Cancel { loan: raw.loan }),
            "flag_overdue" => Ok(Self::FlagOverdue {
                as_of: required(raw.date, "date", "flag_overdue")?,
                loan: raw.loan,
            }),
            other => Err(LedgerError::Validation(format!(
                "unknown command op: {other}"
            ))),
        }
    }
}

/// Reads ledger commands from a CSV source.
///
/// Wraps `csv::Reader` and yields an iterator over `Result<LedgerCommand>`,
/// trimming whitespace and tolerating flexible record lengths.
pub struct CommandReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> CommandReader<R> {
    /// Creates a new `CommandReader` from any `Read` source.
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    /// Returns an iterator that lazily reads and parses commands.
    pub fn commands(self) -> impl Iterator<Item = Result<LedgerCommand>> {
        self.reader
            .into_deserialize::<RawCommand>()
            .map(|result| result.map_err(LedgerError::from).and_then(TryInto::try_into))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const HEADER: &str = "op, loan, installment, amount, rate, term, date, method";

    #[test]
    fn test_reader_parses_loan_and_payment() {
        let data = format!(
            "{HEADER}\nloan, L1, , 1000, 10, 2, 2024-01-15, \npayment, L1, 1, 550, , , 2024-02-15, cash"
        );
        let reader = CommandReader::new(data.as_bytes());
        let commands: Vec<Result<LedgerCommand>> = reader.commands().collect();

        assert_eq!(commands.len(), 2);
        assert_eq!(
            *commands[0].as_ref().unwrap(),
            LedgerCommand::CreateLoan {
                loan: "L1".to_string(),
                amount: dec!(1000),
                rate: dec!(10),
                term: 2,
                start_date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            }
        );
        assert_eq!(
            *commands[1].as_ref().unwrap(),
            LedgerCommand::Payment {
                loan: "L1".to_string(),
                installment: Some(1),
                amount: dec!(550),
                date: NaiveDate::from_ymd_opt(2024, 2, 15).unwrap(),
                method: PaymentMethod::Cash,
            }
        );
    }

    #[test]
    fn test_reader_rejects_missing_columns() {
        let data = format!("{HEADER}\nloan, L1, , 1000, , 2, 2024-01-15, ");
        let reader = CommandReader::new(data.as_bytes());
        let commands: Vec<Result<LedgerCommand>> = reader.commands().collect();
        assert!(matches!(commands[0], Err(LedgerError::Validation(_))));
    }

    #[test]
    fn test_reader_rejects_unknown_op() {
        let data = format!("{HEADER}\nrefinance, L1, , , , , , ");
        let reader = CommandReader::new(data.as_bytes());
        let commands: Vec<Result<LedgerCommand>> = reader.commands().collect();
        assert!(matches!(commands[0], Err(LedgerError::Validation(_))));
    }
}
