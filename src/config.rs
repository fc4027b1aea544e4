use std::time::Duration;

/// Endpoint of the automation webhook that produces the assistant replies.
pub const WEBHOOK_URL: &str =
    "https://n8n-n8n-start.cvhx2u.easypanel.host/webhook/cae11428-77e5-4a33-9282-f8c9a97a4f55";

pub const PROFILE_IMAGE_URL: &str =
    "https://znrkkfmbjdtrgcovoeuq.supabase.co/storage/v1/object/public/midias/download.jpeg";

pub const CHAT_BACKGROUND_URL: &str =
    "https://znrkkfmbjdtrgcovoeuq.supabase.co/storage/v1/object/public/midias/e7d30a649104448116bdb716e83cbb9d.jpg";

pub const ASSISTANT_NAME: &str = "PsicologIA";

pub const GREETING: &str = "Hi! I'm PsicologIA, how can I help?";

/// Pause before each reply segment after the first one.
pub const DELIVERY_DELAY: Duration = Duration::from_millis(3000);

pub const ERROR_MARKER: &str = "❌ ";

pub const SERVICE_ERROR_TEXT: &str = "Error communicating with the service";

pub const CONNECTION_ERROR_TEXT: &str = "Connection error. Check your internet and try again.";

/// Fixed settings of a chat session.
///
/// Nothing here is read from the environment; `ChatConfig::default()` is
/// the configuration the binary runs with.
#[derive(Debug, Clone)]
pub struct ChatConfig {
    pub webhook_url: String,
    pub assistant_name: String,
    pub greeting: String,
    pub profile_image_url: String,
    pub background_url: String,
    pub delivery_delay: Duration,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            webhook_url: WEBHOOK_URL.to_string(),
            assistant_name: ASSISTANT_NAME.to_string(),
            greeting: GREETING.to_string(),
            profile_image_url: PROFILE_IMAGE_URL.to_string(),
            background_url: CHAT_BACKGROUND_URL.to_string(),
            delivery_delay: DELIVERY_DELAY,
        }
    }
}

/// Text of an error bubble: the marker followed by the error description.
pub fn error_bubble(text: &str) -> String {
    format!("{}{}", ERROR_MARKER, text)
}
