use async_trait::async_trait;

/// Produces the bot reply for one inbound message.
#[async_trait]
pub trait ReplyGenerator: Send + Sync {
    async fn generate(&self, user_id: &str, platform: &str, message: &str) -> String;
}

/// Stand-in for the NLP/LLM engine: always answers with the same text.
pub struct StaticReplyGenerator {
    reply: String,
}

impl StaticReplyGenerator {
    pub fn new(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
        }
    }
}

#[async_trait]
impl ReplyGenerator for StaticReplyGenerator {
    async fn generate(&self, _user_id: &str, _platform: &str, _message: &str) -> String {
        self.reply.clone()
    }
}
