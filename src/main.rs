use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result};
use opsflow::application::fanout::PostApprovalFanout;
use opsflow::application::orchestrator::{Orchestrator, OrchestratorConfig};
use opsflow::application::payments::PaymentWorkflow;
use opsflow::application::report::WorkflowReport;
use opsflow::application::scheduler::Scheduler;
use opsflow::domain::approval::ApprovalGate;
use opsflow::domain::ports::{
    LedgerStoreRef, PaymentStoreRef, ProcessingLogRef, WorkItemQueueRef,
};
use opsflow::infrastructure::collaborators::{
    FileReceiptGenerator, LogNotificationSink, LogPublishBackend,
};
use opsflow::infrastructure::in_memory::{
    InMemoryLedgerStore, InMemoryPaymentStore, InMemoryProcessingLog, InMemoryQueue,
};
use opsflow::infrastructure::json_file::{
    FileLedgerStore, FilePaymentStore, FileProcessingLog, FileQueue,
};
use opsflow::interfaces::csv::report_writer::ReportWriter;
use rust_decimal::Decimal;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory holding persisted workflow state. Omit for in-memory
    /// (useful for dry runs; nothing survives the process).
    #[arg(long)]
    state_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Submit a payment request for approval
    Submit {
        amount: Decimal,
        vendor: String,
        description: String,
        requester: String,
    },
    /// Approve a pending payment request (executes the payment)
    Approve { id: u64, approver: String },
    /// Reject a pending payment request
    Reject {
        id: u64,
        approver: String,
        #[arg(long, default_value = "")]
        reason: String,
    },
    /// List pending payment requests
    Pending,
    /// Show the full payment history
    History,
    /// Show one payment request
    Show { id: u64 },
    /// Run post-approval processing for a paid payment
    Fanout { id: u64 },
    /// Print the workflow report (or export payment history as CSV)
    Report {
        #[arg(long)]
        csv: bool,
    },
    /// Run the orchestrator and scheduler until interrupted
    Run {
        /// Seconds between queue polls
        #[arg(long, default_value_t = 10)]
        poll_interval: u64,
        /// Seconds between status report updates
        #[arg(long, default_value_t = 30)]
        housekeeping_interval: u64,
    },
}

struct Stores {
    payments: PaymentStoreRef,
    ledger: LedgerStoreRef,
    log: ProcessingLogRef,
    queue: WorkItemQueueRef,
    receipts_dir: PathBuf,
}

fn open_stores(state_dir: Option<&Path>) -> Result<Stores> {
    match state_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir).into_diagnostic()?;
            Ok(Stores {
                payments: Arc::new(FilePaymentStore::new(dir)),
                ledger: Arc::new(FileLedgerStore::new(dir)),
                log: Arc::new(FileProcessingLog::new(dir)),
                queue: Arc::new(FileQueue::open(&dir.join("mailboxes")).into_diagnostic()?),
                receipts_dir: dir.join("receipts"),
            })
        }
        None => Ok(Stores {
            payments: Arc::new(InMemoryPaymentStore::new()),
            ledger: Arc::new(InMemoryLedgerStore::new()),
            log: Arc::new(InMemoryProcessingLog::new()),
            queue: Arc::new(InMemoryQueue::new()),
            receipts_dir: std::env::temp_dir().join("opsflow-receipts"),
        }),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let stores = open_stores(cli.state_dir.as_deref())?;
    let workflow = PaymentWorkflow::new(Arc::clone(&stores.payments));

    match cli.command {
        Command::Submit {
            amount,
            vendor,
            description,
            requester,
        } => {
            let payment = workflow
                .submit(amount, &vendor, &description, &requester)
                .await
                .into_diagnostic()?;
            println!(
                "Payment request #{} submitted (${} to {}, status: pending)",
                payment.id,
                payment.amount.value(),
                payment.vendor
            );
        }
        Command::Approve { id, approver } => {
            let payment = workflow.approve(id, &approver).await.into_diagnostic()?;
            println!(
                "Payment #{} approved by {} and processed (${} to {})",
                payment.id,
                approver,
                payment.amount.value(),
                payment.vendor
            );
        }
        Command::Reject {
            id,
            approver,
            reason,
        } => {
            let payment = workflow
                .reject(id, &approver, &reason)
                .await
                .into_diagnostic()?;
            println!("Payment #{} rejected by {}", payment.id, approver);
        }
        Command::Pending => {
            let pending = workflow.pending().await.into_diagnostic()?;
            if pending.is_empty() {
                println!("No pending payments.");
            }
            for payment in pending {
                println!(
                    "#{}: ${} to {} (requested by {})",
                    payment.id,
                    payment.amount.value(),
                    payment.vendor,
                    payment.requester
                );
            }
        }
        Command::History => {
            let history = workflow.history().await.into_diagnostic()?;
            for payment in history {
                println!(
                    "#{}: ${} to {} [{:?}] (requested by {})",
                    payment.id,
                    payment.amount.value(),
                    payment.vendor,
                    payment.status,
                    payment.requester
                );
            }
        }
        Command::Show { id } => {
            let payment = workflow.get(id).await.into_diagnostic()?;
            println!("{}", serde_json::to_string_pretty(&payment).into_diagnostic()?);
        }
        Command::Fanout { id } => {
            let receipts =
                Arc::new(FileReceiptGenerator::new(&stores.receipts_dir).into_diagnostic()?);
            let fanout = PostApprovalFanout::new(
                Arc::clone(&stores.payments),
                Arc::clone(&stores.ledger),
                Arc::clone(&stores.log),
                Arc::new(LogNotificationSink),
                receipts,
            );
            let report = fanout.run(id).await.into_diagnostic()?;
            println!("{}", serde_json::to_string_pretty(&report).into_diagnostic()?);
        }
        Command::Report { csv } => {
            let history = workflow.history().await.into_diagnostic()?;
            if csv {
                let stdout = io::stdout();
                ReportWriter::new(stdout.lock())
                    .write_payments(&history)
                    .into_diagnostic()?;
            } else {
                let report = WorkflowReport::build(&history);
                println!("{}", serde_json::to_string_pretty(&report).into_diagnostic()?);
            }
        }
        Command::Run {
            poll_interval,
            housekeeping_interval,
        } => {
            let orchestrator = Arc::new(Orchestrator::new(
                Arc::clone(&stores.queue),
                ApprovalGate::default(),
                Arc::new(LogPublishBackend),
                Arc::new(LogNotificationSink),
                OrchestratorConfig {
                    poll_interval: Duration::from_secs(poll_interval),
                    housekeeping_interval: Duration::from_secs(housekeeping_interval),
                },
            ));
            let scheduler = Scheduler::with_default_rules(Arc::clone(&stores.queue));

            let (stop_tx, stop_rx) = watch::channel(false);
            let orchestrator_task = tokio::spawn(orchestrator.run(stop_rx.clone()));
            let scheduler_task = tokio::spawn(scheduler.run(stop_rx));

            tokio::signal::ctrl_c().await.into_diagnostic()?;
            println!("shutting down...");
            let _ = stop_tx.send(true);
            let _ = tokio::join!(orchestrator_task, scheduler_task);
        }
    }

    Ok(())
}
