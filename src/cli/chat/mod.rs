pub mod controller;
pub mod conversation_state;
pub mod prompt;
pub mod render;
pub mod reply;

use std::future::Future;
use std::io::Write;
use std::process::ExitCode;
use std::sync::Arc;

use controller::ConversationController;
use conversation_state::ConversationState;
use eyre::Result;
use prompt::generate_prompt;
use render::Transcript;
use rustyline::error::ReadlineError;
use tokio::sync::watch;
use tracing::{debug, error, info};

use crate::config::ChatConfig;
use crate::webhook_client::{ReplyService, WebhookClient};

const HELP_TEXT: &str = "
Type a message and press Enter to send it.

/help         Show this help dialogue
/quit         Quit the application
";

pub struct ChatContext {
    transcript: Transcript,
    input: Option<String>,
    interactive: bool,
    config: ChatConfig,
}

impl ChatContext {
    pub fn new(
        output: Box<dyn Write + Send>,
        input: Option<String>,
        interactive: bool,
        config: ChatConfig,
    ) -> Self {
        // A single message passed on the command line never shows up at a
        // prompt, so the transcript has to print it.
        let echo_user = input.is_some();

        Self {
            transcript: Transcript::new(output, &config, echo_user),
            input,
            interactive,
            config,
        }
    }

    pub async fn run(&mut self) -> Result<ExitCode> {
        let client = match WebhookClient::new(&self.config.webhook_url) {
            Ok(client) => client,
            Err(e) => {
                self.transcript
                    .note(&format!("Failed to initialize webhook client: {}", e))?;
                return Ok(ExitCode::FAILURE);
            }
        };

        self.run_with(Arc::new(client)).await
    }

    async fn run_with(&mut self, service: Arc<dyn ReplyService>) -> Result<ExitCode> {
        let controller = ConversationController::new(&self.config, service);
        let mut updates = controller.subscribe();

        if self.interactive {
            self.transcript.header(&self.config)?;
        }
        self.render_latest(&mut updates)?;

        // Handle non-interactive mode (single message)
        if let Some(input) = self.input.take() {
            self.follow(&mut updates, controller.send(&input)).await?;
            return Ok(ExitCode::SUCCESS);
        }

        if self.interactive {
            self.run_interactive(&controller, &mut updates).await?;
        }

        Ok(ExitCode::SUCCESS)
    }

    async fn run_interactive(
        &mut self,
        controller: &ConversationController,
        updates: &mut watch::Receiver<ConversationState>,
    ) -> Result<()> {
        let mut rl = prompt::rl()?;

        loop {
            // The prompt is only offered once the previous reply has fully
            // landed, so reading here never races a delivery.
            let prompt_text = generate_prompt(None);
            let readline = rl.readline(&prompt_text);

            match readline {
                Ok(line) => {
                    if line.trim().is_empty() {
                        continue;
                    }

                    rl.add_history_entry(line.as_str());

                    match line.trim() {
                        "/quit" => break,
                        "/help" => self.transcript.note(HELP_TEXT)?,
                        _ => {
                            controller.set_input(&line);
                            self.follow(updates, controller.submit()).await?;
                        }
                    }
                }
                Err(ReadlineError::Interrupted | ReadlineError::Eof) => {
                    info!("Session ended by user");
                    break;
                }
                Err(e) => {
                    error!("Failed to read input: {}", e);
                    self.transcript.note(&format!("Error: {}", e))?;
                    break;
                }
            }
        }

        Ok(())
    }

    /// Drives `exchange` to completion while rendering every state change
    /// it publishes.
    async fn follow(
        &mut self,
        updates: &mut watch::Receiver<ConversationState>,
        exchange: impl Future<Output = ()>,
    ) -> Result<()> {
        tokio::pin!(exchange);

        loop {
            tokio::select! {
                _ = &mut exchange => break,
                changed = updates.changed() => {
                    if changed.is_err() {
                        debug!("Conversation closed while an exchange was running");
                        break;
                    }
                    self.render_latest(updates)?;
                }
            }
        }

        self.render_latest(updates)
    }

    fn render_latest(&mut self, updates: &mut watch::Receiver<ConversationState>) -> Result<()> {
        let state = updates.borrow_and_update().clone();
        self.transcript.render(&state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Mutex;

    use async_trait::async_trait;

    use crate::config::ERROR_MARKER;
    use crate::webhook_client::{ReplyError, ReplyResponse};

    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().write(buf)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    struct StaticReply(u16, &'static str);

    #[async_trait]
    impl ReplyService for StaticReply {
        async fn exchange(&self, _message: &str) -> Result<ReplyResponse, ReplyError> {
            Ok(ReplyResponse::new(self.0, self.1))
        }
    }

    fn output_of(buf: &SharedBuf) -> String {
        String::from_utf8_lossy(&buf.0.lock().unwrap()).to_string()
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_message_prints_every_segment() {
        let buf = SharedBuf::default();
        let mut chat = ChatContext::new(
            Box::new(buf.clone()),
            Some("hello".to_string()),
            false,
            ChatConfig::default(),
        );

        let service = Arc::new(StaticReply(200, r#"{"output":"Hi there. Nice to meet you!"}"#));
        chat.run_with(service).await.unwrap();

        let output = output_of(&buf);
        let greeting = output.find(crate::config::GREETING).unwrap();
        let user = output.find("hello").unwrap();
        let first = output.find("Hi there.").unwrap();
        let second = output.find("Nice to meet you!").unwrap();
        assert!(greeting < user && user < first && first < second);
    }

    #[tokio::test]
    async fn test_single_message_service_error() {
        let buf = SharedBuf::default();
        let mut chat = ChatContext::new(
            Box::new(buf.clone()),
            Some("hello".to_string()),
            false,
            ChatConfig::default(),
        );

        let service = Arc::new(StaticReply(500, r#"{"message":"workflow crashed"}"#));
        chat.run_with(service).await.unwrap();

        let output = output_of(&buf);
        assert!(output.contains(&format!("{}workflow crashed", ERROR_MARKER)));
    }

    #[tokio::test]
    async fn test_invalid_webhook_url_fails_cleanly() {
        let buf = SharedBuf::default();
        let config = ChatConfig {
            webhook_url: "::not a url::".to_string(),
            ..ChatConfig::default()
        };
        let mut chat = ChatContext::new(Box::new(buf.clone()), Some("hi".to_string()), false, config);

        chat.run().await.unwrap();
        assert!(output_of(&buf).contains("Failed to initialize webhook client"));
    }
}
