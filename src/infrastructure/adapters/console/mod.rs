//! Console adapter for development/testing

use async_trait::async_trait;
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::Mutex;

use crate::domain::traits::{Bot, BotInfo};
use crate::application::errors::BotError;

/// Chat and owner id used for everything typed on the console
pub const CONSOLE_CHAT_ID: &str = "0";

/// Console bot adapter for local development
pub struct ConsoleAdapter {
    info: BotInfo,
    input: Mutex<Lines<BufReader<Stdin>>>,
}

impl ConsoleAdapter {
    pub fn new() -> Self {
        Self {
            info: BotInfo {
                id: "console".to_string(),
                name: "vehicle-care-bot".to_string(),
                username: "console".to_string(),
            },
            input: Mutex::new(BufReader::new(tokio::io::stdin()).lines()),
        }
    }

    /// Next line from stdin, `None` at end of input
    pub async fn read_line(&self, prompt: &str) -> Option<String> {
        print!("{}", prompt);
        let _ = std::io::stdout().flush();
        match self.input.lock().await.next_line().await {
            Ok(line) => line.map(|l| l.trim().to_string()),
            Err(e) => {
                tracing::error!("Failed to read stdin: {}", e);
                None
            }
        }
    }
}

impl Default for ConsoleAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Bot for ConsoleAdapter {
    async fn start(&self) -> Result<(), BotError> {
        tracing::info!("Starting console bot (dev mode)");
        Ok(())
    }

    async fn send_message(&self, chat_id: &str, text: &str) -> Result<String, BotError> {
        if chat_id != CONSOLE_CHAT_ID {
            return Err(BotError::Network(format!("No console session for chat {}", chat_id)));
        }
        println!("[BOT] {}", text);
        Ok("console_msg".to_string())
    }

    fn bot_info(&self) -> BotInfo {
        self.info.clone()
    }
}
