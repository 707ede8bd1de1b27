//! Application startup and the demo command loop
//!
//! Wires configuration, logging and a broker with two demo subscriptions:
//! `steady` always succeeds, `flaky` rejects every other delivery so the
//! retry and dead-letter paths are visible interactively.

use crate::app::cli::args::Args;
use crate::app::cli::commands::{self, Command};
use crate::app::cli::config;
use crate::broker::Broker;
use crate::core::logging::init_logging;
use crate::queue::Consumer;
use clap::Parser;
use std::io::BufRead;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Initialize application startup
pub fn startup() {
    let args = Args::parse();

    let file_config = match config::load(args.config_file.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let log_settings = args.log_settings(&file_config);
    if let Err(e) = init_logging(
        Some(&log_settings.level),
        Some(&log_settings.format),
        log_settings.file.as_deref(),
        log_settings.color,
    ) {
        eprintln!("Error initialising logging: {}", e);
        std::process::exit(1);
    }

    let queue_config = args.queue_config(&file_config);
    log::info!(
        "dispatchq starting (max_retries={}, visibility_timeout={:?})",
        queue_config.max_retries,
        queue_config.visibility_timeout
    );

    let broker = Broker::new(queue_config);
    if let Err(e) = register_demo_subscriptions(&broker) {
        eprintln!("Error registering demo subscriptions: {}", e);
        std::process::exit(1);
    }

    println!("commands: pub <body> [priority] [delayMs] [intervalMs] | stats | dlq | reset <subscription> <offset> | exit");
    run_command_loop(&broker);

    broker.shutdown();
    log::info!("dispatchq stopped");
}

fn register_demo_subscriptions(broker: &Broker) -> crate::queue::QueueResult<()> {
    broker.register_subscription(
        "steady",
        vec![Arc::new(|body: &str| {
            log::info!("[steady] processing: {}", body);
            true
        }) as Arc<dyn Consumer>],
    )?;

    // Rejects every other delivery so retries and backoff show up in the
    // log; under bursts the retry interleaving can dead-letter a message.
    let calls = AtomicU64::new(0);
    broker.register_subscription(
        "flaky",
        vec![Arc::new(move |body: &str| {
            if calls.fetch_add(1, Ordering::SeqCst) % 2 == 0 {
                log::warn!("[flaky] rejecting: {}", body);
                false
            } else {
                log::info!("[flaky] processing: {}", body);
                true
            }
        }) as Arc<dyn Consumer>],
    )?;

    Ok(())
}

fn run_command_loop(broker: &Broker) {
    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                log::error!("failed to read input: {}", e);
                break;
            }
        };

        match commands::parse(&line) {
            Ok(None) => continue,
            Ok(Some(Command::Exit)) => break,
            Ok(Some(command)) => dispatch(broker, command),
            Err(message) => eprintln!("{}", message),
        }
    }
}

fn dispatch(broker: &Broker, command: Command) {
    match command {
        Command::Publish {
            body,
            priority,
            delay,
            interval,
        } => {
            if let Err(e) = broker.publish(&body, priority, delay, interval) {
                eprintln!("publish failed: {}", e);
            }
        }
        Command::Stats => print_stats(broker),
        Command::DeadLetters => print_dead_letters(broker),
        Command::ResetOffset {
            subscription,
            offset,
        } => {
            if let Err(e) = broker.reset_offset(&subscription, offset) {
                eprintln!("reset failed: {}", e);
            }
        }
        Command::Exit => unreachable!("handled by the command loop"),
    }
}

fn print_stats(broker: &Broker) {
    let names = match broker.subscription_names() {
        Ok(names) => names,
        Err(e) => {
            eprintln!("stats failed: {}", e);
            return;
        }
    };
    for name in names {
        match broker.stats(&name) {
            Ok(stats) => println!(
                "[{}] pending: {}, in-flight: {}, acknowledged: {}, retried: {}, reclaimed: {}, dead-lettered: {}",
                name,
                stats.pending,
                stats.in_flight,
                stats.acknowledged,
                stats.retried,
                stats.reclaimed,
                stats.dead_lettered
            ),
            Err(e) => eprintln!("stats for '{}' failed: {}", name, e),
        }
    }
}

fn print_dead_letters(broker: &Broker) {
    let names = match broker.subscription_names() {
        Ok(names) => names,
        Err(e) => {
            eprintln!("dlq failed: {}", e);
            return;
        }
    };
    for name in names {
        match broker.dead_letters(&name) {
            Ok(dead) => {
                println!("--- Dead Letter Queue [{}] ---", name);
                for message in dead {
                    println!(
                        "ID: {}, Body: {}, Attempts: {}",
                        message.id,
                        message.body,
                        message.attempt + 1
                    );
                }
            }
            Err(e) => eprintln!("dlq for '{}' failed: {}", name, e),
        }
    }
}
