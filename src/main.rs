//! botcmd - console front end for the command dispatcher.
//!
//! Reads lines from stdin, dispatches them and prints replies to stdout.

mod console;

use std::sync::Arc;

use botcmd::config::{self, Config};
use botcmd::{Dispatcher, metrics};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::console::demo::DemoCommands;
use crate::console::{ConsoleMessage, ConsoleTransport};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config_path = std::env::args().nth(1);
    let config = match &config_path {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true);
    if config.logging.json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    if let Err(errors) = config::validate(&config) {
        for e in &errors {
            error!(error = %e, "Invalid configuration");
        }
        return Err(anyhow::anyhow!(
            "Refusing to start with {} configuration error(s)",
            errors.len()
        ));
    }

    metrics::init();

    let transport = Arc::new(ConsoleTransport::new(
        config.reader.name.clone(),
        &config.console,
    ));
    let dispatcher = Dispatcher::from_config(transport, &config)?;
    dispatcher.register(&DemoCommands::new()?)?;

    info!(
        name = %config.reader.name,
        prefix = %dispatcher.prefix(),
        commands = dispatcher.commands().commands().len(),
        config = config_path.as_deref().unwrap_or("<defaults>"),
        "Starting botcmd console"
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                let message = ConsoleMessage::parse(&config.console.author, &line);
                if let Err(e) = dispatcher.handle(&message) {
                    warn!(error = %e, code = e.error_code(), "Broken command");
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                break;
            }
        }
    }

    for (command, uses) in dispatcher.usage_stats() {
        info!(command = %command, uses, "Command usage");
    }
    info!("Shutting down");
    Ok(())
}
