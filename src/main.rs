//! Resilience simulator.
//!
//! Replays scripted outcomes against a health advisor and exercises the retry
//! executor, printing one JSON document per step.
//!
//! ```text
//! resilience-sim advisor --outcomes fffcwcs
//! resilience-sim backoff --attempts 6
//! resilience-sim retry --failures 2
//! ```

use std::path::PathBuf;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use serde_json::json;

use service_resilience::clock::ManualClock;
use service_resilience::config::{load_config, ResilienceConfig};
use service_resilience::health::{AdvisorRegistry, AdvisorSettings};
use service_resilience::lifecycle::{signals, Shutdown};
use service_resilience::observability::{logging, metrics};
use service_resilience::resilience::{BackoffRetryExecutor, RetryError, RetryPolicy};

#[derive(Parser)]
#[command(name = "resilience-sim")]
#[command(about = "Exercise the health advisor and backoff retry executor", long_about = None)]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay outcomes: f=failure, s=success, c=check, w=wait out the cooldown
    Advisor {
        #[arg(short, long, default_value = "default")]
        resource: String,

        #[arg(short, long)]
        outcomes: String,
    },
    /// Print the delay schedule of the configured retry policy
    Backoff {
        /// Overrides the configured max_attempts.
        #[arg(short, long)]
        attempts: Option<u32>,
    },
    /// Retry a simulated operation that fails a fixed number of times
    Retry {
        #[arg(short, long, default_value = "default")]
        resource: String,

        #[arg(short, long, default_value_t = 2)]
        failures: u32,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ResilienceConfig::default(),
    };

    logging::init_logging(&config.observability)?;

    if config.observability.metrics_enabled {
        metrics::init_metrics(config.observability.metrics_address.parse()?)?;
    }

    tracing::debug!(
        max_attempts = config.retry.max_attempts,
        resources = config.resources.len(),
        "Configuration loaded"
    );

    match cli.command {
        Commands::Advisor { resource, outcomes } => replay(&config, &resource, &outcomes)?,
        Commands::Backoff { attempts } => print_schedule(&config, attempts)?,
        Commands::Retry { resource, failures } => retry(&config, &resource, failures).await?,
    }

    Ok(())
}

fn replay(config: &ResilienceConfig, resource: &str, outcomes: &str) -> Result<(), Box<dyn std::error::Error>> {
    let clock = ManualClock::new();
    let registry = AdvisorRegistry::from_config_with_clock(config, Arc::new(clock.clone()));
    let advisor = registry.get_or_create(resource);
    let cooldown = AdvisorSettings::from(config.health_for(resource)).unhealthy_duration;

    for step in outcomes.chars().filter(|c| !c.is_whitespace()) {
        let healthy = match step {
            'f' => {
                advisor.record_failure();
                None
            }
            's' => {
                advisor.record_success();
                None
            }
            'c' => Some(advisor.is_healthy()),
            'w' => {
                clock.advance(cooldown);
                None
            }
            other => return Err(format!("unknown step '{other}', expected one of f, s, c, w").into()),
        };

        let line = json!({
            "step": step.to_string(),
            "elapsed_ms": millis(clock.elapsed()),
            "healthy": healthy,
            "advisor": advisor.snapshot(),
        });
        println!("{}", serde_json::to_string(&line)?);
    }

    Ok(())
}

/// Whole milliseconds, saturating at `u64::MAX`.
fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

fn print_schedule(config: &ResilienceConfig, attempts: Option<u32>) -> Result<(), Box<dyn std::error::Error>> {
    let mut policy = RetryPolicy::from(&config.retry);
    if let Some(attempts) = attempts {
        policy.max_attempts = attempts;
    }

    // One delay between each pair of attempts.
    let waits = policy.max_attempts.saturating_sub(1) as usize;
    let delays: Vec<u64> = policy.backoff().take(waits).map(millis).collect();

    let line = json!({
        "max_attempts": policy.max_attempts,
        "initial_backoff_ms": millis(policy.initial_backoff),
        "max_backoff_ms": millis(policy.max_backoff),
        "delays_ms": delays,
    });
    println!("{}", serde_json::to_string_pretty(&line)?);
    Ok(())
}

async fn retry(config: &ResilienceConfig, resource: &str, failures: u32) -> Result<(), Box<dyn std::error::Error>> {
    let registry = AdvisorRegistry::from_config(config);
    let advisor = registry.get_or_create(resource);
    let executor = BackoffRetryExecutor::new(RetryPolicy::from(&config.retry));

    let shutdown = Arc::new(Shutdown::new());
    let mut shutdown_rx = shutdown.subscribe();
    let signal_shutdown = shutdown.clone();
    tokio::spawn(async move { signals::shutdown_on_ctrl_c(&signal_shutdown).await });

    let calls = AtomicU32::new(0);
    let result = executor
        .execute_until_shutdown(
            || {
                let call = calls.fetch_add(1, Ordering::SeqCst) + 1;
                async move {
                    if call <= failures {
                        Err(format!("simulated failure {call}"))
                    } else {
                        Ok(call)
                    }
                }
            },
            &mut shutdown_rx,
        )
        .await;

    let outcome = match &result {
        Ok(call) => {
            advisor.record_success();
            json!({ "ok": true, "succeeded_on_attempt": call })
        }
        Err(RetryError::Operation(e)) => {
            advisor.record_failure();
            json!({ "ok": false, "error": e })
        }
        Err(RetryError::Cancelled) => json!({ "ok": false, "error": "cancelled" }),
    };

    let line = json!({
        "attempts": calls.load(Ordering::SeqCst),
        "outcome": outcome,
        "health": registry.snapshot(),
    });
    println!("{}", serde_json::to_string_pretty(&line)?);
    Ok(())
}
