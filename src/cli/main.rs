use clap::{Parser, Subcommand};
use reqwest::Client;
use serde_json::json;
use std::error::Error;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "incident-cli")]
#[command(about = "Smart Incident Service CLI", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    endpoint: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Report an incident
    Create {
        #[arg(short, long)]
        description: String,

        #[arg(short, long)]
        reported_by: String,
    },

    /// Get incident details
    Get {
        #[arg(value_name = "INCIDENT_ID")]
        id: String,

        /// Poll until AI enrichment has settled
        #[arg(short, long)]
        wait: bool,

        /// Give up polling after this many seconds
        #[arg(long, default_value = "60")]
        wait_secs: u64,
    },

    /// Check server health
    Health,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let client = Client::new();

    match cli.command {
        Commands::Create {
            description,
            reported_by,
        } => {
            let response = client
                .post(format!("{}/v1/incidents", cli.endpoint))
                .json(&json!({
                    "description": description,
                    "reportedBy": reported_by,
                }))
                .send()
                .await?;

            let body: serde_json::Value = response.json().await?;
            println!("{}", serde_json::to_string_pretty(&body)?);
        }

        Commands::Get {
            id,
            wait,
            wait_secs,
        } => {
            let url = format!("{}/v1/incidents/{}", cli.endpoint, id);
            let deadline = tokio::time::Instant::now() + Duration::from_secs(wait_secs);

            let body = loop {
                let body: serde_json::Value = client.get(&url).send().await?.json().await?;

                let pending = body.get("aiStatus").and_then(|s| s.as_str()) == Some("PENDING");
                if !wait || !pending || tokio::time::Instant::now() >= deadline {
                    break body;
                }

                tokio::time::sleep(Duration::from_secs(1)).await;
            };

            println!("{}", serde_json::to_string_pretty(&body)?);
        }

        Commands::Health => {
            let response = client
                .get(format!("{}/health", cli.endpoint))
                .send()
                .await?;

            let body: serde_json::Value = response.json().await?;
            println!("{}", serde_json::to_string_pretty(&body)?);
        }
    }

    Ok(())
}
