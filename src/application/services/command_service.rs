use crate::domain::entities::{Command, CommandRegistry, Message, Content};
use crate::application::errors::CommandError;

/// Service for managing and executing commands
pub struct CommandService {
    registry: CommandRegistry,
    prefix: String,
}

impl CommandService {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            registry: CommandRegistry::new(),
            prefix: prefix.into(),
        }
    }

    pub fn register(&mut self, command: Command) {
        self.registry.register(command);
    }

    /// Run the command named by a message.
    ///
    /// `Ok(None)` for messages that are not commands. A `CommandError::Usage` carries
    /// text meant for the user; other errors are not.
    pub fn handle(&self, message: &Message) -> Result<Option<String>, CommandError> {
        let Content::Command { name, .. } = &message.content else {
            return Ok(None);
        };

        // Find command (without prefix)
        let cmd = self.registry.find(name)
            .ok_or_else(|| CommandError::NotFound(name.clone()))?;

        let sender = message.sender.as_ref()
            .map(|u| u.display_name())
            .unwrap_or_else(|| message.chat_id.clone());
        tracing::debug!("[{}] /{} from {} via {}", message.id, cmd.name, sender, message.platform);

        // A command without a handler is treated as unknown
        let handler = cmd.handler.as_ref()
            .ok_or_else(|| CommandError::NotFound(cmd.name.clone()))?;
        Ok(Some(handler(message)?))
    }

    /// Resolve a message to the reply that should be sent, if any.
    ///
    /// Usage errors become the reply. Unknown commands are ignored. Storage failures
    /// are logged and produce no reply.
    pub fn respond(&self, message: &Message) -> Option<String> {
        match self.handle(message) {
            Ok(reply) => reply,
            Err(CommandError::Usage(text)) => Some(text),
            Err(CommandError::NotFound(name)) => {
                tracing::debug!("Ignoring unknown command /{}", name);
                None
            }
            Err(e) => {
                tracing::error!("Command failed for chat {}: {}", message.chat_id, e);
                None
            }
        }
    }

    /// (name, description) pairs for platform command menus
    pub fn menu(&self) -> Vec<(String, String)> {
        self.registry
            .all()
            .map(|c| (c.name.clone(), c.description.clone().unwrap_or_default()))
            .collect()
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }
}
