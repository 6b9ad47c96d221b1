use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info, warn};

use webhook_chat::api::WebhookClient;
use webhook_chat::config::Config;
use webhook_chat::envelope::Draft;
use webhook_chat::models::AttachmentKind;
use webhook_chat::session::{establish_session, FileSessionStore, FIXED_SESSION_ID};
use webhook_chat::sync::ChatSession;
use webhook_chat::terminal::{parse_command, read_attachment, Command, Transcript};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present (development convenience)
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "webhook_chat=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = Config::from_env()?;

    // ── Session ───────────────────────────────────────────────────────────────
    let mut store = FileSessionStore::new(&config.session_file);
    let session_id = establish_session(&mut store).unwrap_or_else(|e| {
        warn!("Could not persist session id: {e}");
        FIXED_SESSION_ID
    });

    // ── Polling ───────────────────────────────────────────────────────────────
    let session = ChatSession::new(WebhookClient::new(&config.base_url)?, session_id);
    let poller = session.start_polling(config.poll_interval);
    info!("Chatting as {session_id} via {}", config.base_url);

    let mut updates = session.subscribe();
    let printer = tokio::spawn(async move {
        let mut transcript = Transcript::new();
        while updates.changed().await.is_ok() {
            let (lines, thinking) = {
                let thread = updates.borrow_and_update();
                (transcript.updates(thread.messages()), thread.is_agent_thinking())
            };
            for line in lines {
                println!("{line}");
            }
            if thinking {
                println!("  … thinking");
            }
        }
    });

    // ── Input ─────────────────────────────────────────────────────────────────
    println!("Type a message, /image <path> [caption], /audio <path>, or /quit.");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut draft = Draft::default();

    while let Some(line) = lines.next_line().await? {
        match parse_command(&line) {
            Command::Quit => break,
            Command::Empty => continue,
            Command::Text(text) => draft.text = text,
            Command::Image { path, caption } => {
                match read_attachment(AttachmentKind::Image, &path).await {
                    Ok(attachment) => {
                        draft.text = caption;
                        draft.attachment = Some(attachment);
                    }
                    Err(e) => {
                        error!("{e}");
                        continue;
                    }
                }
            }
            Command::Audio { path } => match read_attachment(AttachmentKind::Audio, &path).await {
                Ok(attachment) => draft.attachment = Some(attachment),
                Err(e) => {
                    error!("{e}");
                    continue;
                }
            },
        }
        session.send(&mut draft);
    }

    poller.stop();
    printer.abort();
    Ok(())
}
