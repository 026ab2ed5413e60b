use clap::Parser;
use loan_ledger::application::ledger::{CreateLoan, CreatePayment, LoanLedger};
use loan_ledger::domain::loan::{DebtorId, LenderId, LoanId};
use loan_ledger::domain::ports::LedgerStoreBox;
use loan_ledger::error::LedgerError;
use loan_ledger::infrastructure::in_memory::InMemoryLedgerStore;
use loan_ledger::interfaces::csv::command_reader::{CommandReader, LedgerCommand};
use loan_ledger::interfaces::csv::summary_writer::SummaryWriter;
use miette::{IntoDiagnostic, Result};
use std::collections::BTreeMap;
use std::fs::File;
use std::io;
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Input ledger commands CSV file
    input: PathBuf,

    /// Print full loan state as JSON instead of the summary CSV
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let store: LedgerStoreBox = Box::new(InMemoryLedgerStore::new());
    let ledger = LoanLedger::new(store);

    // The CLI drives a single-lender, single-debtor book.
    let lender = LenderId::new_v4();
    let debtor = DebtorId::new_v4();

    let file = File::open(cli.input).into_diagnostic()?;
    let reader = CommandReader::new(file);
    let mut loans: Vec<(String, LoanId)> = Vec::new();

    for command in reader.commands() {
        match command {
            Ok(command) => {
                if let Err(e) = apply(&ledger, &mut loans, lender, debtor, command).await {
                    eprintln!("Error applying command: {e}");
                }
            }
            Err(e) => {
                eprintln!("Error reading command: {e}");
            }
        }
    }

    let mut summaries = Vec::new();
    for (label, loan_id) in &loans {
        let summary = ledger
            .loan_summary(*loan_id, lender)
            .await
            .into_diagnostic()?;
        summaries.push((label.clone(), summary));
    }

    if cli.json {
        let labeled: BTreeMap<_, _> = summaries.iter().map(|(l, s)| (l.as_str(), s)).collect();
        println!(
            "{}",
            serde_json::to_string_pretty(&labeled).into_diagnostic()?
        );
    } else {
        let stdout = io::stdout();
        let mut writer = SummaryWriter::new(stdout.lock());
        writer.write_summaries(&summaries).into_diagnostic()?;
    }

    Ok(())
}

fn lookup(loans: &[(String, LoanId)], label: &str) -> Result<LoanId, LedgerError> {
    loans
        .iter()
        .find(|(l, _)| l == label)
        .map(|(_, id)| *id)
        .ok_or_else(|| LedgerError::Validation(format!("unknown loan label: {label}")))
}

async fn apply(
    ledger: &LoanLedger,
    loans: &mut Vec<(String, LoanId)>,
    lender: LenderId,
    debtor: DebtorId,
    command: LedgerCommand,
) -> Result<(), LedgerError> {
    match command {
        LedgerCommand::CreateLoan {
            loan,
            amount,
            rate,
            term,
            start_date,
        } => {
            if lookup(loans, &loan).is_ok() {
                return Err(LedgerError::Validation(format!(
                    "duplicate loan label: {loan}"
                )));
            }
            let due_date = start_date
                .checked_add_months(chrono::Months::new(term))
                .ok_or_else(|| LedgerError::Validation("loan due date out of range".to_string()))?;
            let created = ledger
                .create_loan(
                    CreateLoan {
                        debtor_id: debtor,
                        amount,
                        interest_rate: rate,
                        term,
                        start_date,
                        due_date,
                    },
                    lender,
                )
                .await?;
            loans.push((loan, created.id));
            Ok(())
        }
        LedgerCommand::Payment {
            loan,
            installment,
            amount,
            date,
            method,
        } => {
            let loan_id = lookup(loans, &loan)?;
            let installment_id = match installment {
                Some(number) => {
                    let summary = ledger.loan_summary(loan_id, lender).await?;
                    let target = summary
                        .installments
                        .get(number.checked_sub(1).unwrap_or(u32::MAX) as usize)
                        .ok_or_else(|| {
                            LedgerError::Validation(format!(
                                "loan {loan} has no installment {number}"
                            ))
                        })?;
                    Some(target.id)
                }
                None => None,
            };
            ledger
                .create_payment(
                    CreatePayment {
                        loan_id,
                        installment_id,
                        amount,
                        payment_date: date,
                        method,
                    },
                    lender,
                )
                .await?;
            Ok(())
        }
        LedgerCommand::Cancel { loan } => {
            let loan_id = lookup(loans, &loan)?;
            ledger.cancel_loan(loan_id, lender).await
        }
        LedgerCommand::FlagOverdue { loan, as_of } => {
            let loan_id = lookup(loans, &loan)?;
            ledger.flag_overdue(loan_id, as_of).await.map(|_| ())
        }
    }
}
