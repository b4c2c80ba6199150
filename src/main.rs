use arzeka_pay::application::channels::{PollChannel, PushAck, PushChannel};
use arzeka_pay::application::engine::ReconciliationEngine;
use arzeka_pay::application::submission::{NewPayment, SubmissionService};
use arzeka_pay::config::AppConfig;
use arzeka_pay::domain::reference::ReferenceGenerator;
use arzeka_pay::domain::report::StatusReport;
use arzeka_pay::error::Result as PaymentResult;
use arzeka_pay::infrastructure::in_memory::InMemoryPaymentStore;
use arzeka_pay::infrastructure::mock_gateway::MockGateway;
use arzeka_pay::interfaces::csv::attempt_writer::AttemptWriter;
use arzeka_pay::interfaces::csv::event_reader::{EventKind, EventReader, ReplayEvent};
use clap::Parser;
use miette::{IntoDiagnostic, Result};
use serde_json::json;
use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Replays a recorded stream of payment events (creations, polls, pushes)
/// through the reconciliation stack and prints final attempt states as CSV.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Input events CSV file
    input: PathBuf,
}

struct Replay {
    store: Arc<InMemoryPaymentStore>,
    gateway: Arc<MockGateway>,
    submissions: SubmissionService,
    poll: PollChannel,
    push: PushChannel,
}

impl Replay {
    fn new(config: &AppConfig) -> Self {
        let store = Arc::new(InMemoryPaymentStore::new());
        let gateway = Arc::new(MockGateway::new());
        let engine = ReconciliationEngine::new(store.clone());
        Self {
            submissions: SubmissionService::new(
                store.clone(),
                gateway.clone(),
                Arc::new(ReferenceGenerator::new()),
                config.credentials(),
                config.status_update_url.clone(),
                config.return_url.clone(),
            ),
            poll: PollChannel::new(gateway.clone(), engine.clone(), config.check_timeout),
            push: PushChannel::new(engine),
            store,
            gateway,
        }
    }

    async fn apply(&self, event: ReplayEvent) -> PaymentResult<()> {
        match event.event {
            EventKind::Create => {
                self.submissions
                    .submit_with_reference(
                        event.reference,
                        NewPayment {
                            firstname: event.firstname.unwrap_or_default(),
                            lastname: event.lastname.unwrap_or_default(),
                            phone: event.phone.unwrap_or_default(),
                            amount: event.amount.unwrap_or_default(),
                        },
                    )
                    .await?;
            }
            EventKind::Poll => {
                // The recorded report is what the gateway answered at the
                // time; script it, then run the real poll flow.
                self.gateway
                    .enqueue_check(&event.reference, report_fields(&event))
                    .await;
                self.poll.poll(&event.reference).await?;
            }
            EventKind::Push => {
                let mut fields = report_fields(&event);
                fields["third_party_mapped_order_id"] = json!(event.reference);
                if self.push.notify(StatusReport::from(fields)).await == PushAck::Retry {
                    eprintln!("push for {} asked for redelivery", event.reference);
                }
            }
        }
        Ok(())
    }
}

fn report_fields(event: &ReplayEvent) -> serde_json::Value {
    let mut fields = json!({});
    if let Some(status) = &event.status {
        fields["status"] = json!(status);
    }
    if let Some(transaction_id) = &event.transaction_id {
        fields["third_party_trans_id"] = json!(transaction_id);
    }
    fields
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let config = AppConfig::from_env();
    let replay = Replay::new(&config);

    let file = File::open(cli.input).into_diagnostic()?;
    let reader = EventReader::new(file);
    for event_result in reader.events() {
        match event_result {
            Ok(event) => {
                if let Err(e) = replay.apply(event).await {
                    eprintln!("Error applying event: {}", e);
                }
            }
            Err(e) => {
                eprintln!("Error reading event: {}", e);
            }
        }
    }

    let attempts = replay.store.all_attempts().await;
    let stdout = io::stdout();
    let mut writer = AttemptWriter::new(stdout.lock());
    writer.write_attempts(attempts).into_diagnostic()?;

    Ok(())
}
