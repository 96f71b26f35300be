use std::io::Write;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::broadcast::error::RecvError;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use wayfarer::agents::{AgentEvent, DeliveryStatus, TravelAgent};
use wayfarer::cli::Cli;
use wayfarer::config::Settings;

type Input = Lines<BufReader<Stdin>>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Best effort: a missing .env is normal
    let _ = dotenvy::dotenv();

    // Logs go to stderr so the conversation on stdout stays readable
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let settings = Settings::load(&cli)?;
    let agent = wayfarer::build_agent(&settings)?;
    let thread_id = cli.thread_id();

    info!(thread_id = %thread_id, "Starting conversation");
    spawn_event_printer(&agent);

    println!("Wayfarer travel planner (thread {}). Type /quit to exit.", thread_id);
    let mut input = BufReader::new(tokio::io::stdin()).lines();

    loop {
        prompt("> ");
        let Some(line) = input.next_line().await? else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == "/quit" {
            break;
        }

        match agent.send_message(&thread_id, line).await {
            Ok(round) => {
                println!("\n{}\n", round.answer);
                finalization_gate(&agent, &thread_id, cli.auto_approve, &mut input).await?;
            }
            Err(e) => {
                error!(thread_id = %thread_id, error = %e, "Round failed");
                eprintln!("Error: {}", e);
            }
        }
    }

    Ok(())
}

async fn finalization_gate(
    agent: &TravelAgent,
    thread_id: &str,
    auto_approve: bool,
    input: &mut Input,
) -> anyhow::Result<()> {
    let approved = if auto_approve {
        true
    } else {
        prompt("Send this plan by email? [y/N] ");
        let answer = input.next_line().await?.unwrap_or_default();
        matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
    };

    if !approved {
        agent.decline(thread_id).await?;
        return Ok(());
    }

    match agent.resume(thread_id).await {
        Ok(outcome) => match outcome.delivery {
            DeliveryStatus::Sent { .. } => {
                println!("Plan sent to {}.", outcome.payload.recipient)
            }
            DeliveryStatus::Failed { error } => eprintln!("Email not sent: {}", error),
        },
        Err(e) => eprintln!("Could not prepare the email: {}", e),
    }
    Ok(())
}

fn spawn_event_printer(agent: &TravelAgent) {
    let mut events = agent.events().subscribe();
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(AgentEvent::Warning { message, .. }) => eprintln!("warning: {}", message),
                Ok(AgentEvent::ToolCall { name, .. }) => eprintln!("  [calling {}]", name),
                Ok(_) => {}
                Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => break,
            }
        }
    });
}

fn prompt(text: &str) {
    print!("{}", text);
    let _ = std::io::stdout().flush();
}
