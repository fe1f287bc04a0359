//! Telegram adapter

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::domain::entities::{Message as BotMessage, User as BotUser};
use crate::domain::traits::{Bot, BotInfo};
use crate::application::errors::BotError;
use crate::application::messaging::MessageParser;

/// Telegram API base URL
const API_BASE: &str = "https://api.telegram.org";

/// Telegram update type
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Message {
    pub message_id: i64,
    pub from: Option<User>,
    pub chat: Chat,
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct User {
    pub id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Chat {
    pub id: i64,
}

/// Envelope of every Bot API response
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

impl<T> ApiResponse<T> {
    fn into_result(self) -> Result<T, BotError> {
        match (self.ok, self.result) {
            (true, Some(result)) => Ok(result),
            _ => Err(BotError::Network(
                self.description.unwrap_or_else(|| "Telegram API error".to_string()),
            )),
        }
    }
}

impl Update {
    /// Convert the update into a domain message, if it carries text
    pub fn to_message(&self, parser: &MessageParser) -> Option<BotMessage> {
        let msg = self.message.as_ref()?;
        let text = msg.text.as_deref()?;

        let sender = msg.from.as_ref().map(|u| {
            let mut user = BotUser::new(u.id.to_string());
            if let Some(name) = &u.username {
                user = user.with_username(name.clone());
            }
            if let Some(first) = &u.first_name {
                user = user.with_first_name(first.clone());
            }
            user
        });

        Some(parser.parse(msg.chat.id.to_string(), text, sender).with_platform("telegram"))
    }
}

/// Telegram bot adapter
pub struct TelegramAdapter {
    token: String,
    client: Client,
    info: BotInfo,
}

impl TelegramAdapter {
    /// First characters of the token, safe to log
    fn token_hint(&self) -> String {
        self.token.chars().take(8).collect()
    }

    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            client: Client::new(),
            info: BotInfo {
                id: "unknown".to_string(),
                name: "vehicle-care-bot".to_string(),
                username: "vehicle_care_bot".to_string(),
            },
        }
    }

    /// Get the API URL for a method
    fn api_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", API_BASE, self.token, method)
    }

    async fn call<Req, Resp>(&self, method: &str, request: &Req) -> Result<Resp, BotError>
    where
        Req: Serialize + ?Sized,
        Resp: for<'de> Deserialize<'de>,
    {
        let response = self.client
            .post(self.api_url(method))
            .json(request)
            .send()
            .await
            .map_err(|e| BotError::Network(e.to_string()))?;

        let status = response.status();
        let data: ApiResponse<Resp> = response
            .json()
            .await
            .map_err(|e| BotError::Parse(format!("{} ({})", e, status)))?;

        data.into_result()
    }

    /// Fetch bot info from Telegram API
    pub async fn fetch_bot_info(&mut self) -> Result<(), BotError> {
        #[derive(Deserialize)]
        struct BotInfoResponse {
            id: i64,
            first_name: String,
            username: String,
        }

        let data: BotInfoResponse = self.call("getMe", &serde_json::json!({})).await?;

        self.info = BotInfo {
            id: data.id.to_string(),
            name: data.first_name,
            username: data.username,
        };

        Ok(())
    }

    /// Get updates from Telegram using getUpdates API
    pub async fn get_updates(&self, offset: i64, timeout: i64) -> Result<Vec<Update>, BotError> {
        #[derive(Serialize)]
        struct GetUpdatesRequest {
            offset: i64,
            timeout: i64,
            allowed_updates: Vec<String>,
        }

        let request = GetUpdatesRequest {
            offset,
            timeout,
            allowed_updates: vec!["message".to_string()],
        };

        self.call("getUpdates", &request).await
    }

    /// Get the next update offset
    pub fn get_next_offset(current: i64, updates: &[Update]) -> i64 {
        updates.iter()
            .map(|u| u.update_id + 1)
            .max()
            .unwrap_or(current)
    }

    /// Register bot commands with Telegram
    pub async fn register_commands(&self, commands: &[(String, String)]) -> Result<(), BotError> {
        #[derive(Serialize)]
        struct Command<'a> {
            command: &'a str,
            description: &'a str,
        }

        #[derive(Serialize)]
        struct SetMyCommandsRequest<'a> {
            commands: Vec<Command<'a>>,
        }

        let request = SetMyCommandsRequest {
            commands: commands
                .iter()
                .map(|(command, description)| Command { command, description })
                .collect(),
        };

        let _: bool = self.call("setMyCommands", &request).await?;

        tracing::info!("Registered {} bot commands with Telegram", commands.len());
        Ok(())
    }
}

#[async_trait]
impl Bot for TelegramAdapter {
    async fn start(&self) -> Result<(), BotError> {
        tracing::info!("Starting Telegram bot (token: {}...)", self.token_hint());
        Ok(())
    }

    async fn send_message(&self, chat_id: &str, text: &str) -> Result<String, BotError> {
        #[derive(Serialize)]
        struct SendMessageRequest<'a> {
            chat_id: &'a str,
            text: &'a str,
        }

        #[derive(Deserialize)]
        struct MessageResult {
            message_id: i64,
        }

        tracing::debug!("Sending to {}: {}", chat_id, text);

        let result: MessageResult = self
            .call("sendMessage", &SendMessageRequest { chat_id, text })
            .await?;

        Ok(result.message_id.to_string())
    }

    fn bot_info(&self) -> BotInfo {
        self.info.clone()
    }
}
