/// Greeting sent for a chat context.
///
/// The bot does not read what the user wrote; every reply is this template.
pub fn welcome_message(chat_id: &str) -> String {
    format!("Welcome to {chat_id}! How can I help you today?")
}
