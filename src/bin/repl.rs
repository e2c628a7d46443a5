//! Terminal chat REPL for the assistant widget.
//!
//! Wires the HTTP query/history services and the null voice capabilities
//! into one widget instance and drives it from stdin. Useful for
//! exercising a running study-app backend without the web front end.
//!
//! All tracing output goes to stderr so stdout stays a clean chat view.

use sage::capability::{HttpHistoryService, HttpQueryService};
use sage::conversation::Role;
use sage::{
    AssistantConfig, AssistantWidget, ConversationScope, PageContext, WidgetCommand, WidgetEvent,
};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("sage=info")),
        )
        .init();

    let config = match AssistantConfig::default_path() {
        Some(path) if path.exists() => AssistantConfig::from_file(&path)?,
        _ => AssistantConfig::default(),
    };

    let query = Arc::new(HttpQueryService::new(&config.query)?);
    let history = Arc::new(HttpHistoryService::new(&config.query)?);
    let scope = ConversationScope::Global {
        page: PageContext::Other,
    };

    let handle = AssistantWidget::new(config, scope, query)
        .with_history(history)
        .spawn();
    let mut events = handle.subscribe();
    handle.send(WidgetCommand::Open);

    let greeting = handle.snapshot().await?;
    if let Some(message) = greeting.transcript.first() {
        println!("assistant> {}", message.text);
    }
    println!("(type a question, /clear to reset, /quit to exit)");

    // Event printer: assistant answers, notices and the thinking indicator.
    let printer = tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            match event {
                WidgetEvent::MessageAppended(message) if message.role == Role::Assistant => {
                    match message.source_provider {
                        Some(provider) => {
                            println!("assistant ({provider})> {}", message.text);
                        }
                        None => println!("assistant> {}", message.text),
                    }
                }
                WidgetEvent::Pending { active: true } => println!("(thinking...)"),
                WidgetEvent::Notice(text) => println!("! {text}"),
                _ => {}
            }
        }
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        match line {
            "" => {}
            "/quit" | "/exit" => break,
            "/clear" => {
                handle.send(WidgetCommand::Clear);
            }
            text => {
                handle.send(WidgetCommand::SetInput(text.to_owned()));
                handle.send(WidgetCommand::Submit);
            }
        }
    }

    handle.shutdown();
    printer.abort();
    Ok(())
}
