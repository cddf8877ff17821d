use std::sync::Arc;

use anyhow::Context;
use chrono::Utc;
use clap::Parser;

use inbox_digest::classify::{Classify, LlmClassifier};
use inbox_digest::config::DigestConfig;
use inbox_digest::llm::create_provider;
use inbox_digest::mail::{AuthStatus, HttpMailClient, MailGateway, OutgoingEmail};
use inbox_digest::pipeline::Orchestrator;
use inbox_digest::report::DigestReport;

/// Analyze the latest emails in an inbox and mail back a digest.
#[derive(Debug, Parser)]
#[command(name = "inbox-digest", version)]
struct Cli {
    /// Mail account to analyze (also receives the digest).
    #[arg(short = 'u', long = "account")]
    account: String,

    /// Number of recent emails to process.
    #[arg(short = 'n', long = "count", value_parser = clap::value_parser!(u32).range(1..))]
    count: u32,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let config = DigestConfig::from_env().context("invalid configuration")?;

    eprintln!("inbox-digest v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Account: {}", cli.account);
    eprintln!("   Emails: {}", cli.count);
    eprintln!("   Model: {}\n", config.llm.model);

    let llm = create_provider(&config.llm).context("failed to create LLM provider")?;
    let classifier = Arc::new(LlmClassifier::new(llm));
    let gateway = HttpMailClient::new(&config.mail_api_base, config.mail_api_key.clone());

    // The handshake must reach completed status before any mail call.
    let auth = gateway
        .authorize(&cli.account)
        .await
        .context("authorization handshake failed to start")?;
    if auth.status == AuthStatus::Pending {
        if let Some(ref url) = auth.url {
            println!("Click this link to authorize: {url}");
        }
    }
    gateway
        .wait_for_authorization(&auth)
        .await
        .context("authorization did not complete")?;

    let emails = gateway
        .list_recent(&cli.account, cli.count as usize)
        .await
        .context("failed to retrieve emails")?;

    let total_requested = cli.count as usize;
    let orchestrator = Orchestrator::new(Arc::clone(&classifier) as Arc<dyn Classify>)
        .with_concurrency(config.concurrency)
        .with_progress(Box::new(|done, total, subject| {
            println!("Processing email ({done}/{total}): {subject}");
        }));
    let results = orchestrator.process(emails).await;

    let report = DigestReport::build(&results, total_requested, Utc::now());
    let outgoing = OutgoingEmail {
        subject: report.subject(),
        body: report.render(),
        recipient: cli.account.clone(),
    };
    gateway
        .send(&cli.account, &outgoing)
        .await
        .context("failed to deliver the digest")?;

    let usage = classifier.usage();
    tracing::info!(
        input_tokens = usage.input_tokens,
        output_tokens = usage.output_tokens,
        estimated_cost_usd = %classifier.estimated_cost(),
        "Digest run complete"
    );

    Ok(())
}
