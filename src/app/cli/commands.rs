//! Line-oriented command reader for the demo broker
//!
//! Accepted commands:
//!
//! ```text
//! pub <body> [priority] [delayMs] [intervalMs]   publish (intervalMs > 0 = recurring)
//! stats                                          per-subscription counters
//! dlq                                            list dead letters
//! reset <subscription> <offset>                  replay from a retained offset
//! exit                                           shut down and leave
//! ```

use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Publish {
        body: String,
        priority: i32,
        delay: Duration,
        interval: Option<Duration>,
    },
    Stats,
    DeadLetters,
    ResetOffset {
        subscription: String,
        offset: usize,
    },
    Exit,
}

/// Parse one input line; empty lines parse to `None`
pub fn parse(line: &str) -> Result<Option<Command>, String> {
    let mut tokens = line.split_whitespace();
    let Some(operation) = tokens.next() else {
        return Ok(None);
    };

    match operation {
        "pub" => {
            let body = tokens
                .next()
                .ok_or_else(|| "usage: pub <body> [priority] [delayMs] [intervalMs]".to_string())?
                .to_string();
            let priority = parse_or_default(tokens.next(), 0i32, "priority")?;
            let delay_ms = parse_or_default(tokens.next(), 0u64, "delayMs")?;
            let interval_ms = parse_or_default(tokens.next(), 0u64, "intervalMs")?;
            Ok(Some(Command::Publish {
                body,
                priority,
                delay: Duration::from_millis(delay_ms),
                interval: (interval_ms > 0).then(|| Duration::from_millis(interval_ms)),
            }))
        }
        "stats" => Ok(Some(Command::Stats)),
        "dlq" => Ok(Some(Command::DeadLetters)),
        "reset" => {
            let subscription = tokens
                .next()
                .ok_or_else(|| "usage: reset <subscription> <offset>".to_string())?
                .to_string();
            let offset = tokens
                .next()
                .ok_or_else(|| "usage: reset <subscription> <offset>".to_string())?
                .parse::<usize>()
                .map_err(|_| "offset must be a non-negative integer".to_string())?;
            Ok(Some(Command::ResetOffset {
                subscription,
                offset,
            }))
        }
        "exit" => Ok(Some(Command::Exit)),
        other => Err(format!("unknown command: {}", other)),
    }
}

fn parse_or_default<T: std::str::FromStr>(
    token: Option<&str>,
    default: T,
    field: &str,
) -> Result<T, String> {
    match token {
        Some(raw) => raw
            .parse::<T>()
            .map_err(|_| format!("invalid {}: {}", field, raw)),
        None => Ok(default),
    }
}
