//! Converter CLI
//!
//! Command-line interface for the Currency Converter API.

use anyhow::Result;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;

use converter_client::ConverterClient;

#[derive(Parser)]
#[command(name = "converter")]
#[command(author, version, about = "Currency Converter API CLI client", long_about = None)]
struct Cli {
    /// Base URL of the Currency Converter API
    #[arg(
        long,
        env = "CONVERTER_API_URL",
        default_value = "http://localhost:5014"
    )]
    api_url: String,

    /// Bearer token for authentication
    #[arg(long, env = "CONVERTER_TOKEN")]
    token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check API health
    Health,
    /// Request a development token
    Token {
        #[arg(long)]
        client_id: String,
        /// Role to grant (repeatable)
        #[arg(long = "role")]
        roles: Vec<String>,
    },
    /// Convert an amount at the latest rate
    Convert {
        amount: Decimal,
        from: String,
        to: String,
    },
    /// Latest rates for a base currency
    Latest { base: String },
    /// Historical rates for a base currency
    Historical {
        base: String,
        /// First day (YYYY-MM-DD)
        #[arg(long)]
        start: NaiveDate,
        /// Last day (YYYY-MM-DD)
        #[arg(long)]
        end: NaiveDate,
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, default_value_t = 30)]
        page_size: u32,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let mut client = ConverterClient::new(&cli.api_url);
    if let Some(token) = cli.token {
        client = client.with_token(token);
    }

    match cli.command {
        Commands::Health => {
            let healthy = client.health().await?;
            if healthy {
                println!("✓ API is healthy");
            } else {
                println!("✗ API is not healthy");
                std::process::exit(1);
            }
        }

        Commands::Token { client_id, roles } => {
            let token = client.dev_token(&client_id, roles).await?;
            println!("{}", token);
        }

        Commands::Convert { amount, from, to } => {
            let result = client.convert(amount, &from, &to).await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }

        Commands::Latest { base } => {
            let rates = client.latest(&base).await?;
            println!("{}", serde_json::to_string_pretty(&rates)?);
        }

        Commands::Historical {
            base,
            start,
            end,
            page,
            page_size,
        } => {
            let rates = client
                .historical(&base, start, end, page, page_size)
                .await?;
            println!("{}", serde_json::to_string_pretty(&rates)?);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_historical() {
        let cli = Cli::try_parse_from([
            "converter",
            "--api-url",
            "http://example",
            "historical",
            "EUR",
            "--start",
            "2024-01-01",
            "--end",
            "2024-01-31",
            "--page-size",
            "10",
        ])
        .unwrap();

        assert_eq!(cli.api_url, "http://example");
        match cli.command {
            Commands::Historical { base, page, page_size, .. } => {
                assert_eq!(base, "EUR");
                assert_eq!(page, 1);
                assert_eq!(page_size, 10);
            }
            _ => panic!("expected historical"),
        }
    }

    #[test]
    fn test_parse_token_roles() {
        let cli = Cli::try_parse_from([
            "converter", "token", "--client-id", "cli", "--role", "convert", "--role", "rates.read",
        ])
        .unwrap();

        match cli.command {
            Commands::Token { client_id, roles } => {
                assert_eq!(client_id, "cli");
                assert_eq!(roles, vec!["convert", "rates.read"]);
            }
            _ => panic!("expected token"),
        }
    }
}
