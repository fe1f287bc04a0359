//! Message parser - Parses raw messages into structured messages

use crate::domain::entities::{Message, Content, User};

/// Parses incoming messages into structured Message objects
pub struct MessageParser {
    command_prefix: String,
}

impl MessageParser {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            command_prefix: prefix.into(),
        }
    }

    /// Parse a text message
    pub fn parse(&self, chat_id: impl Into<String>, text: impl Into<String>, sender: Option<User>) -> Message {
        let text = text.into();
        let chat_id = chat_id.into();

        if text.trim().is_empty() {
            return Message::new(chat_id, Content::Empty).with_sender_opt(sender);
        }

        // Check if it's a command
        if text.starts_with('/') || text.starts_with(&self.command_prefix) {
            return self.parse_command(chat_id, &text, sender);
        }

        // Regular text message
        Message::from_text(chat_id, text).with_sender_opt(sender)
    }

    /// Parse a command message
    fn parse_command(&self, chat_id: String, text: &str, sender: Option<User>) -> Message {
        // Remove the command prefix (either / or custom prefix)
        let cmd_text = if let Some(rest) = text.strip_prefix('/') {
            rest
        } else {
            text.strip_prefix(self.command_prefix.as_str()).unwrap_or(text)
        };

        // Split command and arguments
        let mut parts = cmd_text.split_whitespace();
        let head = parts.next().unwrap_or("");
        // Group chats address commands as /name@botname
        let name = head.split('@').next().unwrap_or(head).to_string();
        let args = parts.map(|s| s.to_string()).collect();

        Message::new(chat_id, Content::Command { name, args })
            .with_sender_opt(sender)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_command_with_args() {
        let parser = MessageParser::new("/");
        let msg = parser.parse("1", "/update My Car fuel 40", None);
        assert_eq!(
            msg.content,
            Content::Command {
                name: "update".to_string(),
                args: vec!["My", "Car", "fuel", "40"].into_iter().map(String::from).collect(),
            }
        );
    }

    #[test]
    fn test_parse_strips_bot_mention() {
        let parser = MessageParser::new("/");
        let msg = parser.parse("-5", "/list@vehicle_care_bot", Some(User::new("9")));
        assert_eq!(msg.content, Content::Command { name: "list".to_string(), args: vec![] });
        assert_eq!(msg.owner_id(), Some(9));
    }

    #[test]
    fn test_parse_custom_prefix() {
        let parser = MessageParser::new("!");
        let msg = parser.parse("1", "!add  Red   Bike ", None);
        assert_eq!(msg.args(), &["Red".to_string(), "Bike".to_string()]);
    }

    #[test]
    fn test_parse_plain_text_and_empty() {
        let parser = MessageParser::new("/");
        assert_eq!(parser.parse("1", "hello", None).content, Content::Text("hello".to_string()));
        assert_eq!(parser.parse("1", "   ", None).content, Content::Empty);
    }
}
