use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::signal;
use tokio::sync::broadcast;

use toast_store::binding::NotificationBinding;
use toast_store::config::Settings;
use toast_store::notification::{NotificationId, RenderedNotification};
use toast_store::store::NotificationStore;
use toast_store::telemetry::init_tracing;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Load configuration
    let settings = Settings::new().context("Failed to load configuration")?;

    // Initialize tracing
    init_tracing(&settings.logging);
    tracing::info!("Configuration loaded");

    let store = Arc::new(NotificationStore::new());
    let binding = NotificationBinding::new(store, &settings);
    let (shutdown_tx, _) = broadcast::channel::<()>(1);

    // Keep mounted units in sync with the store in the background
    let binding_task = {
        let binding = binding.clone();
        let shutdown = shutdown_tx.subscribe();
        tokio::spawn(async move { binding.run(shutdown).await })
    };

    let mut rendered = binding.subscribe_rendered();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            line = lines.next_line() => {
                match line? {
                    Some(line) => {
                        if !handle_command(&binding, line.trim()) {
                            break;
                        }
                    }
                    None => break,
                }
            }
            changed = rendered.changed() => {
                if changed.is_err() {
                    break;
                }
                print_notifications(&rendered.borrow_and_update());
            }
            _ = &mut shutdown => break,
        }
    }

    tracing::info!("Shutting down");
    let _ = shutdown_tx.send(());
    let _ = binding_task.await;

    Ok(())
}

/// Handle one input line. Returns false when the user asked to quit.
fn handle_command(binding: &NotificationBinding, line: &str) -> bool {
    if line.is_empty() {
        return true;
    }

    if line.starts_with('{') {
        match binding.add_json(line) {
            Ok(id) => tracing::info!(notification_id = %id, "Notification added"),
            Err(e) => tracing::warn!(error = %e, "Rejected notification"),
        }
        return true;
    }

    let mut parts = line.split_whitespace();
    match (parts.next(), parts.next()) {
        (Some("click"), Some(id)) => match parse_id(id) {
            Some(id) => {
                if !binding.click(id) {
                    tracing::info!(notification_id = %id, "Click produced no action");
                }
            }
            None => tracing::warn!(input = %id, "Invalid notification id"),
        },
        (Some("remove"), Some(id)) => match parse_id(id) {
            Some(id) => {
                if let Err(e) = binding.remove_notification(id) {
                    tracing::warn!(notification_id = %id, error = %e, "Removal callback failed");
                }
            }
            None => tracing::warn!(input = %id, "Invalid notification id"),
        },
        (Some("clear"), None) => {
            if let Err(e) = binding.clear() {
                tracing::warn!(error = %e, "Removal callback failed");
            }
        }
        (Some("list"), None) => print_notifications(&binding.render()),
        (Some("quit"), None) | (Some("exit"), None) => return false,
        _ => tracing::warn!(input = %line, "Unknown command"),
    }
    true
}

fn parse_id(input: &str) -> Option<NotificationId> {
    input.parse::<u64>().ok().map(NotificationId)
}

fn print_notifications(notifications: &[RenderedNotification]) {
    println!("-- {} active --", notifications.len());
    for notification in notifications {
        println!("[{}] {}", notification.id, notification.to_html());
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating shutdown");
        }
        _ = terminate => {
            tracing::info!("Received terminate signal, initiating shutdown");
        }
    }
}
