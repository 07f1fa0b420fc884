mod config;

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use config::Config;
use downscope_auth::{claims, decode_claims, get_actor_token, Orchestrator};

#[derive(Parser)]
#[command(name = "downscope")]
#[command(about = "Delegated token orchestration for autonomous agents")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the full delegation flow: orchestrator token, then one
    /// downscoped token per configured worker
    Run,
    /// Run the three-step handshake for a single configured agent
    ActorToken {
        /// Agent to authenticate: "orchestrator" or a worker roster name
        agent: String,
    },
    /// Pretty-print the unverified display claims of a token
    Decode {
        /// Raw JWT
        token: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run => run_orchestration().await,
        Commands::ActorToken { agent } => run_actor_token(&agent).await,
        Commands::Decode { token } => {
            let claims = decode_claims(&token);
            println!("{}", serde_json::to_string_pretty(&claims)?);
            Ok(())
        }
    }
}

async fn run_orchestration() -> Result<()> {
    let config = Config::from_env()?;

    let orchestrator = Orchestrator::new(
        config.provider,
        config.orchestrator,
        config.orchestrator_app,
        config.token_exchanger_app,
    )
    .with_workers(config.workers);

    let report = orchestrator.run().await?;

    println!("orchestrator token: {}", truncate(&report.orchestrator_token.raw));
    println!("  {}", report.orchestrator_token.summary());

    for worker in &report.workers {
        match &worker.result {
            Ok(token) => {
                println!(
                    "{}: delegated token {} (scope: {})",
                    worker.agent_id,
                    truncate(&token.raw),
                    token.scope.join(" ")
                );
                println!("  {}", token.summary());
            }
            Err(e) => println!("{}: FAILED - {}", worker.agent_id, e),
        }
    }
    println!(
        "{} succeeded, {} failed",
        report.succeeded(),
        report.failed()
    );

    if report.succeeded() == 0 && !report.workers.is_empty() {
        return Err(anyhow!("all worker delegations failed"));
    }
    Ok(())
}

async fn run_actor_token(agent: &str) -> Result<()> {
    let config = Config::from_env()?;

    let (identity, app) = if agent.eq_ignore_ascii_case("orchestrator") {
        (&config.orchestrator, &config.orchestrator_app)
    } else {
        let worker = config
            .find_worker(agent)
            .ok_or_else(|| anyhow!("no configured worker named '{agent}'"))?;
        (worker, &config.token_exchanger_app)
    };

    let token = get_actor_token(&config.provider, identity, app).await?;
    println!("actor token: {}", truncate(&token.raw));
    println!("  {}", claims::display_summary(&token.claims));
    Ok(())
}

/// Keep printed tokens readable; full values stay in memory only.
///
/// Counts characters, not bytes: provider output is not guaranteed to be
/// ASCII and slicing mid-codepoint would panic.
fn truncate(token: &str) -> String {
    match token.char_indices().nth(60) {
        Some((idx, _)) => format!("{}...", &token[..idx]),
        None => token.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_short_token_unchanged() {
        assert_eq!(truncate("tok-short"), "tok-short");
    }

    #[test]
    fn test_truncate_long_token() {
        let token = "a".repeat(100);
        let shown = truncate(&token);
        assert_eq!(shown.len(), 63);
        assert!(shown.ends_with("..."));
    }

    #[test]
    fn test_truncate_is_char_boundary_safe() {
        // Multibyte content right at the cut point must not panic
        let token = "é".repeat(100);
        let shown = truncate(&token);
        assert!(shown.ends_with("..."));
        assert_eq!(shown.chars().count(), 63);
    }

    #[test]
    fn test_truncate_exactly_sixty_chars_unchanged() {
        let token = "b".repeat(60);
        assert_eq!(truncate(&token), token);
    }
}
