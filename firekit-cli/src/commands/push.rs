//! Send one push message.

use anyhow::{Context, Result};
use clap::Args;
use firekit_client::{Messaging, MockMessaging, Sender};
use firekit_types::{Message, Notification};

use super::Backend;

/// Arguments of the `push` command.
#[derive(Args, Debug)]
pub struct PushArgs {
    /// Device registration token
    #[arg(
        long,
        required_unless_present_any = ["topic", "condition"],
        conflicts_with_all = ["topic", "condition"]
    )]
    pub token: Option<String>,

    /// Topic name
    #[arg(long, conflicts_with = "condition")]
    pub topic: Option<String>,

    /// Topic condition, e.g. "'a' in topics && 'b' in topics"
    #[arg(long)]
    pub condition: Option<String>,

    /// Notification title
    #[arg(long)]
    pub title: Option<String>,

    /// Notification body
    #[arg(long)]
    pub body: Option<String>,

    /// Notification image URL
    #[arg(long)]
    pub image: Option<String>,

    /// Data entry as key=value (repeatable)
    #[arg(long = "data", value_name = "KEY=VALUE")]
    pub data: Vec<String>,

    /// Validate only, do not deliver
    #[arg(long)]
    pub dry_run: bool,
}

/// Run the push command.
pub async fn run(backend: &Backend, args: &PushArgs) -> Result<()> {
    let message = build_message(args)?;

    match backend {
        Backend::Mock => send(Sender::new(MockMessaging::new()), &message, args.dry_run).await,
        Backend::Platform(app) => {
            let client = app.messaging().context("Failed to create messaging client")?;
            send(Sender::new(client), &message, args.dry_run).await
        }
    }
}

async fn send<M: Messaging>(sender: Sender<M>, message: &Message, dry_run: bool) -> Result<()> {
    if dry_run {
        let id = sender
            .validate(message)
            .await
            .context("Message validation failed")?;
        println!("Valid: {}", id);
        return Ok(());
    }

    let id = sender.send_push(message).await.context("Push failed")?;
    println!("Sent: {}", id);
    println!("Push count: {}", sender.push_count());
    Ok(())
}

/// Build the message from the command-line flags.
pub fn build_message(args: &PushArgs) -> Result<Message> {
    let mut message = if let Some(token) = &args.token {
        Message::to_token(token)
    } else if let Some(topic) = &args.topic {
        Message::to_topic(topic)
    } else if let Some(condition) = &args.condition {
        Message::to_condition(condition)
    } else {
        anyhow::bail!("Must specify --token, --topic or --condition");
    };

    if args.title.is_some() || args.body.is_some() || args.image.is_some() {
        message.notification = Some(Notification {
            title: args.title.clone(),
            body: args.body.clone(),
            image: args.image.clone(),
        });
    }

    for entry in &args.data {
        let (key, value) = entry
            .split_once('=')
            .with_context(|| format!("Data entry must be KEY=VALUE: {}", entry))?;
        message = message.with_data(key.trim(), value);
    }

    Ok(message)
}
