use std::io::{BufRead, Write as _};

use chrono::Utc;
use clap::{Parser, Subcommand};

use vivenda_chat::{extract, sentiment, ChatEngine, LeadSaveClient, MemoryStorage};

#[derive(Debug, Parser)]
#[command(name = "vivenda-cli")]
#[command(about = "Vivenda lead engine command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run one follow-up batch now and print the JSON summary.
    Followup,
    /// Print what the extractors and scorer see in a message.
    Inspect {
        /// The visitor message to analyse.
        text: String,
    },
    /// Interactive chat session against the configured completion endpoint.
    Chat {
        /// Completion endpoint URL.
        #[arg(long, env = "VIVENDA_CHAT_ENDPOINT", default_value = "http://localhost:3000/api/chat")]
        endpoint: String,
        /// Lead-save endpoint URL.
        #[arg(long, env = "VIVENDA_LEADS_ENDPOINT", default_value = "http://localhost:3000/api/leads")]
        leads_endpoint: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Followup => run_followup_batch().await,
        Commands::Inspect { text } => {
            inspect(&text);
            Ok(())
        }
        Commands::Chat {
            endpoint,
            leads_endpoint,
        } => chat_repl(&endpoint, &leads_endpoint).await,
    }
}

async fn run_followup_batch() -> anyhow::Result<()> {
    let config = vivenda_core::load_app_config()?;
    let pool = vivenda_db::connect_pool(&config.database_url, vivenda_db::PoolConfig::from_env())
        .await?;
    vivenda_db::run_migrations(&pool).await?;

    let ai = vivenda_ai::ProviderClient::new(
        &config.ai_base_url,
        config.ai_api_key.clone(),
        &config.ai_model,
        config.ai_request_timeout_secs,
    )?;
    let whatsapp = vivenda_whatsapp::WhatsappClient::with_base_url(
        config.whatsapp_token.as_deref().unwrap_or_default(),
        config.whatsapp_request_timeout_secs,
        config.whatsapp_max_retries,
        config.whatsapp_retry_backoff_base_ms,
        &config.whatsapp_base_url,
    )?;

    let summary = vivenda_followup::run_followups(&pool, &ai, &whatsapp, Utc::now()).await?;
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

fn inspect(text: &str) {
    let delta = sentiment::classify(text).delta();
    println!("name:          {:?}", extract::extract_name(text));
    println!("phone:         {:?}", extract::extract_phone(text));
    println!("property_type: {:?}", extract::extract_property_type(text));
    println!("interest:      {:?}", extract::extract_interest(text));
    println!("sentiment:     {delta:+}");
}

async fn chat_repl(endpoint: &str, leads_endpoint: &str) -> anyhow::Result<()> {
    let lead_client = LeadSaveClient::new(leads_endpoint, 15)?;
    let completion = vivenda_ai::ChatCompletionClient::new(endpoint, 60)?;
    let mut engine = ChatEngine::new(MemoryStorage::new(), lead_client, completion, "cli");

    println!("vivenda chat (ctrl-d to quit)");
    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout();
    loop {
        print!("> ");
        stdout.flush()?;
        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let text = line.trim();
        if text.is_empty() {
            continue;
        }
        let reply = engine.handle_message(text).await;
        println!("{reply}");
        println!(
            "  [score {} | saved {}]",
            engine.lead_score().await,
            engine.lead_saved().await
        );
    }
    Ok(())
}
