use anyhow::Result;
use clap::{Parser, Subcommand};
use sage::config::SageConfig;
use sage::pipeline::InboundMessage;
use sage::stats::UsageFilter;
use sage::storage::SqliteStore;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sage", version, about = "Community-support bot core")]
struct Cli {
    /// Path to sage.toml (defaults to the platform config dir).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the webhook event server.
    Serve,
    /// Run one message through the pipeline and print the outcome (debugging).
    Ask {
        /// The message text.
        text: String,
        /// User id to attribute the message to.
        #[arg(long, default_value = "cli-user")]
        user: String,
        /// Channel id the message pretends to come from.
        #[arg(long, default_value = "cli")]
        channel: String,
    },
    /// Print the FAQ usage summary.
    Stats {
        /// Filter to one category path.
        #[arg(long)]
        category: Option<String>,
        /// Cap for the top-FAQ listing.
        #[arg(long, default_value_t = 10)]
        limit: u32,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("sage=info")),
        )
        .init();

    let cli = Cli::parse();
    let config = SageConfig::load(cli.config.as_deref())?;
    let store = Arc::new(SqliteStore::open(&config.db_path())?);
    let responder = Arc::new(sage::build_responder(store, &config.responder));

    match cli.command {
        Command::Serve => sage::server::serve(responder, &config.bind_addr()).await,
        Command::Ask {
            text,
            user,
            channel,
        } => {
            let msg = InboundMessage {
                text,
                user_id: user.clone(),
                user_name: user,
                channel_id: channel,
                from_bot: false,
            };
            let outcome = responder.handle_message(&msg, chrono::Utc::now()).await;
            println!("{}", serde_json::to_string_pretty(&outcome)?);
            Ok(())
        }
        Command::Stats { category, limit } => {
            let filter = UsageFilter {
                category,
                limit: Some(limit),
                ..Default::default()
            };
            let summary = responder.usage().summary(&filter).await?;

            println!(
                "{} uses across {} FAQs  (+{} / -{})",
                summary.total_uses,
                summary.faq_count,
                summary.feedback.positive,
                summary.feedback.negative
            );
            if !summary.by_category.is_empty() {
                println!("\nBy category:");
                for (category, uses) in &summary.by_category {
                    println!("  {uses:>6}  {category}");
                }
            }
            if !summary.top_faqs.is_empty() {
                println!("\nTop FAQs:");
                for row in &summary.top_faqs {
                    println!(
                        "  {:>6}  (+{} / -{})  [{}] {}",
                        row.usage_count,
                        row.feedback.positive,
                        row.feedback.negative,
                        row.category,
                        row.question
                    );
                }
            }
            Ok(())
        }
    }
}
