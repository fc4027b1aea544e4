use std::io::Write;

use color_print::cformat;
use crossterm::cursor::MoveToColumn;
use crossterm::terminal::{Clear, ClearType};
use crossterm::QueueableCommand;
use eyre::Result;

use super::conversation_state::{ConversationState, Message, Sender};
use crate::config::ChatConfig;

const LOADING_INDICATOR: &str = "• • •";

/// Writes conversation snapshots to a terminal as they change.
///
/// Only messages not yet printed are written, so coalesced snapshots still
/// produce every bubble in order.
pub struct Transcript {
    output: Box<dyn Write + Send>,
    assistant_name: String,
    echo_user: bool,
    rendered: usize,
    indicator_shown: bool,
}

impl Transcript {
    pub fn new(output: Box<dyn Write + Send>, config: &ChatConfig, echo_user: bool) -> Self {
        Self {
            output,
            assistant_name: config.assistant_name.clone(),
            echo_user,
            rendered: 0,
            indicator_shown: false,
        }
    }

    pub fn header(&mut self, config: &ChatConfig) -> Result<()> {
        writeln!(
            self.output,
            "{}",
            cformat!(
                "<bold>{}</> <green>● online</>\n<dim>avatar: {}\nbackground: {}</>\n",
                config.assistant_name,
                config.profile_image_url,
                config.background_url
            )
        )?;
        self.output.flush()?;
        Ok(())
    }

    /// Plain text outside the conversation, e.g. help output.
    pub fn note(&mut self, text: &str) -> Result<()> {
        self.clear_indicator()?;
        writeln!(self.output, "{}", text)?;
        self.output.flush()?;
        Ok(())
    }

    pub fn render(&mut self, state: &ConversationState) -> Result<()> {
        let new_messages = &state.messages()[self.rendered.min(state.messages().len())..];

        if !new_messages.is_empty() {
            self.clear_indicator()?;
            for message in new_messages {
                self.bubble(message)?;
            }
            self.rendered = state.messages().len();
        }

        if state.busy && !self.indicator_shown {
            write!(self.output, "{}", cformat!("<dim>{}</>", LOADING_INDICATOR))?;
            self.indicator_shown = true;
        } else if !state.busy {
            self.clear_indicator()?;
        }

        self.output.flush()?;
        Ok(())
    }

    fn bubble(&mut self, message: &Message) -> Result<()> {
        match message.sender {
            Sender::User if self.echo_user => {
                writeln!(self.output, "{}", cformat!("<green><bold>you</></>: {}", message.text))?;
            }
            Sender::User => {}
            Sender::Assistant => {
                writeln!(
                    self.output,
                    "{}",
                    cformat!("<cyan><bold>{}</></>: {}", self.assistant_name, message.text)
                )?;
            }
        }
        Ok(())
    }

    fn clear_indicator(&mut self) -> Result<()> {
        if self.indicator_shown {
            self.output
                .queue(MoveToColumn(0))?
                .queue(Clear(ClearType::CurrentLine))?;
            self.indicator_shown = false;
        }
        Ok(())
    }
}
