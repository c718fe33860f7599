//! Seedbot binary.
//!
//! Start the bot with:
//! ```bash
//! TELEGRAM_TOKEN=xxx JACKETT_URL=http://jackett:9117 JACKETT_TOKEN=xxx OMDB_TOKEN=xxx \
//!     cargo run -p seedbot-telegram
//! ```

use clap::Parser;
use seedbot_core::{load_dotenv, BotConfig};
use seedbot_telegram::SeedBot;
use tracing_subscriber::EnvFilter;

/// Seedbot - manage a Transmission daemon from Telegram
#[derive(Parser, Debug)]
#[command(name = "seedbot")]
#[command(about = "Telegram bot for Transmission with Jackett search")]
struct Args {
    /// Verbose logging (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

const CRATES: &[&str] = &[
    "seedbot_telegram",
    "seedbot_tracker",
    "seedbot_transmission",
    "seedbot_search",
    "seedbot_core",
];

fn log_filter(verbose: u8) -> String {
    let (ours, teloxide) = match verbose {
        0 => ("info", "warn"),
        1 => ("debug", "info"),
        2 => ("trace", "debug"),
        _ => return "trace".to_string(),
    };
    let mut directives: Vec<String> = CRATES.iter().map(|c| format!("{}={}", c, ours)).collect();
    directives.push(format!("teloxide={}", teloxide));
    directives.join(",")
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    load_dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_new(log_filter(args.verbose)).unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = BotConfig::from_env()?;
    let bot = SeedBot::new(config).await?;

    match bot.get_me().await {
        Ok(username) => {
            tracing::info!(username = %username, "Bot initialized successfully");
            println!("\nSeedbot");
            println!("   Bot: @{}", username);
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to get bot info");
            return Err(e.into());
        }
    }

    println!("\nOpen Telegram and send /help to begin");
    println!("   Press Ctrl+C to stop\n");

    bot.start_polling().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_filter_levels() {
        assert!(log_filter(0).contains("seedbot_tracker=info"));
        assert!(log_filter(0).ends_with("teloxide=warn"));
        assert!(log_filter(1).contains("seedbot_telegram=debug"));
        assert_eq!(log_filter(3), "trace");
    }

    #[test]
    fn test_args_count_verbosity() {
        let args = Args::parse_from(["seedbot", "-vv"]);
        assert_eq!(args.verbose, 2);
    }
}
