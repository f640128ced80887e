use clap::{Parser, Subcommand};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "siteguard-cli")]
#[command(about = "Management CLI for the SiteGuard gateway", long_about = None)]
struct Cli {
    /// Base URL of the running gateway.
    #[arg(short, long, default_value = "http://localhost:5000")]
    url: String,

    /// Dashboard path prefix the gateway was configured with.
    #[arg(short, long, default_value = "/siteguard_dashboard")]
    prefix: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check gateway status
    Status,
    /// Show block/audit statistics
    Stats,
    /// List currently blocked IPs
    Blocked,
    /// Show recent suspicious events
    Events,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = format!("{}{}", cli.url, cli.prefix);

    match cli.command {
        Commands::Status => {
            let res = client.get(format!("{}/", base)).send().await?;
            print_response(res, None).await?;
        }
        Commands::Stats => {
            let res = client.get(format!("{}/data", base)).send().await?;
            print_response(res, Some("stats")).await?;
        }
        Commands::Blocked => {
            let res = client.get(format!("{}/data", base)).send().await?;
            print_response(res, Some("blocked_ips")).await?;
        }
        Commands::Events => {
            let res = client.get(format!("{}/data", base)).send().await?;
            print_response(res, Some("logs")).await?;
        }
    }

    Ok(())
}

async fn print_response(
    res: reqwest::Response,
    field: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: dashboard API returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    let selected = match field {
        Some(field) => json.get(field).cloned().unwrap_or(Value::Null),
        None => json,
    };
    println!("{}", serde_json::to_string_pretty(&selected)?);
    Ok(())
}
