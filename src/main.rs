use clap::{Parser, Subcommand};
use std::sync::Arc;
use trade_notifications::configuration::LayeredSettings;
use trade_notifications::notification_dispatcher::NotificationDispatcher;
use trade_notifications::telemetry::{get_subscriber, init_subscriber};

/// Manage email notifications for the trading history service.
#[derive(Parser, Debug)]
#[command(name = "trade_notifications", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Subscribe an email address to broadcast notifications.
    Subscribe {
        /// The address that should receive notifications.
        email: String,
    },
    /// Cancel a subscription using the handle returned by `subscribe`.
    Unsubscribe {
        /// Subscription identifier, or "pending confirmation".
        handle: String,
    },
    /// Broadcast a message to every confirmed subscriber.
    Publish {
        /// Subject line of the email.
        #[arg(short, long)]
        subject: String,
        /// Category used by subscribers to filter messages.
        #[arg(short, long)]
        category: Option<String>,
        /// Message body.
        body: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let subscriber = get_subscriber(
        "trade_notifications".into(),
        "info".into(),
        std::io::stdout,
    );
    init_subscriber(subscriber);

    let cli = Cli::parse();
    let settings = LayeredSettings::from_current_dir()?;
    let dispatcher = NotificationDispatcher::new(Arc::new(settings));

    match cli.command {
        Command::Subscribe { email } => {
            let handle = dispatcher.subscribe_email(&email).await?;
            println!("{}", handle);
        }
        Command::Unsubscribe { handle } => {
            dispatcher.unsubscribe(Some(handle.as_str())).await;
        }
        Command::Publish {
            subject,
            category,
            body,
        } => {
            let message_id = dispatcher
                .publish(&body, &subject, category.as_deref())
                .await?;
            println!("{}", message_id);
        }
    }

    Ok(())
}
