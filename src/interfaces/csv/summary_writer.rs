use crate::application::ledger::LoanSummary;
use crate::domain::loan::LoanStatus;
use crate::error::Result;
use rust_decimal::Decimal;
use serde::Serialize;
use std::io::Write;

#[derive(Debug, Serialize)]
struct SummaryRow<'a> {
    loan: &'a str,
    status: LoanStatus,
    total_with_interest: Decimal,
    total_paid: Decimal,
    remaining_debt: Decimal,
}

/// Writes labeled loan summaries as CSV to any `Write` sink.
pub struct SummaryWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> SummaryWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(sink),
        }
    }

    pub fn write_summaries(&mut self, summaries: &[(String, LoanSummary)]) -> Result<()> {
        for (label, summary) in summaries {
            self.writer.serialize(SummaryRow {
                loan: label,
                status: summary.status,
                total_with_interest: summary.total_with_interest.as_decimal().normalize(),
                total_paid: summary.total_paid.as_decimal().normalize(),
                remaining_debt: summary.remaining_debt.as_decimal().normalize(),
            })?;
        }
        self.writer.flush()?;
        Ok(())
    }
}
