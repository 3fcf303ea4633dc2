mod command_registry;
mod intent_parser;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::AssessmentError;

pub use command_registry::chat_help;
pub use intent_parser::{parse_intent, Intent};

pub const CHAT_GREETING: &str = "Hello! I'm your SkinAI health assistant. I can help answer questions about skin conditions, provide general health information, and assist with your skin analysis results. How can I help you today?";

/// Number of prior turns forwarded with each chat call.
pub const CHAT_CONTEXT_WINDOW: usize = 10;

pub const HEALTH_SYSTEM_PROMPT: &str = "You are SkinAI Health Assistant, a knowledgeable and empathetic AI assistant specializing in dermatology and skin health. Your role is to provide helpful, accurate, and supportive information while maintaining appropriate medical boundaries.

CAPABILITIES:
- Answer questions about skin conditions, symptoms, and general skin health
- Provide general skincare advice and prevention tips
- Explain skin analysis results in understandable terms
- Offer lifestyle recommendations for skin health
- Discuss when to seek professional medical care

LIMITATIONS & SAFETY:
- NEVER provide specific medical diagnoses or replace professional medical advice
- ALWAYS recommend consulting healthcare professionals for serious concerns
- Do not prescribe medications or specific treatments
- Acknowledge limitations and uncertainties in responses
- Be especially careful with symptoms that could indicate serious conditions

TONE & APPROACH:
- Warm, supportive, and professional
- Use clear, accessible language
- Show empathy for user concerns
- Encourage healthy skepticism and professional consultation
- Be encouraging while maintaining medical safety

RESPONSE FORMAT:
- Keep responses concise but informative (2-4 paragraphs max)
- Use bullet points for lists when helpful
- Include disclaimers when appropriate
- Offer to clarify or expand on topics";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
    /// Any other role a client sends. Accepted, never rendered.
    #[serde(other)]
    Other,
}

impl ChatRole {
    /// Speaker label in the rendered prompt; `None` for turns that are skipped.
    pub fn label(self) -> Option<&'static str> {
        match self {
            Self::User => Some("User"),
            Self::Assistant => Some("Assistant"),
            Self::Other => None,
        }
    }
}

/// A turn as kept in the local transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

/// A turn as sent upstream; timestamps are dropped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl From<&ChatTurn> for ChatMessage {
    fn from(turn: &ChatTurn) -> Self {
        Self {
            role: turn.role,
            content: turn.content.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub conversation_history: Vec<ChatMessage>,
}

impl ChatRequest {
    pub fn validate(&self) -> Result<(), AssessmentError> {
        if self.message.trim().is_empty() {
            return Err(AssessmentError::Validation("message is required".to_string()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatReply {
    pub response: String,
    pub timestamp: DateTime<Utc>,
}

/// Trailing window of a transcript, role and content only.
pub fn context_window(turns: &[ChatTurn]) -> Vec<ChatMessage> {
    let start = turns.len().saturating_sub(CHAT_CONTEXT_WINDOW);
    turns[start..].iter().map(ChatMessage::from).collect()
}

/// Persona, then the user and assistant turns among the last ten prior
/// turns, then the new message.
pub fn render_chat_prompt(history: &[ChatMessage], message: &str) -> String {
    let start = history.len().saturating_sub(CHAT_CONTEXT_WINDOW);
    let mut prompt = String::from(HEALTH_SYSTEM_PROMPT);
    prompt.push_str("\n\n");
    for turn in &history[start..] {
        let Some(label) = turn.role.label() else {
            continue;
        };
        prompt.push_str(label);
        prompt.push_str(": ");
        prompt.push_str(&turn.content);
        prompt.push('\n');
    }
    prompt.push_str("User: ");
    prompt.push_str(message);
    prompt.push_str("\nAssistant:");
    prompt
}

/// In-memory transcript for an interactive session. Never persisted.
#[derive(Debug, Clone, Default)]
pub struct Conversation {
    turns: Vec<ChatTurn>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Transcript opened by the assistant greeting, as the chat window starts.
    pub fn with_greeting() -> Self {
        let mut conversation = Self::new();
        conversation.push(ChatRole::Assistant, CHAT_GREETING);
        conversation
    }

    pub fn turns(&self) -> &[ChatTurn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Request for `message` carrying the window of turns before it.
    pub fn request_for(&self, message: &str) -> ChatRequest {
        ChatRequest {
            message: message.to_string(),
            conversation_history: context_window(&self.turns),
        }
    }

    pub fn push(&mut self, role: ChatRole, content: impl Into<String>) {
        self.turns.push(ChatTurn {
            role,
            content: content.into(),
            timestamp: Utc::now(),
        });
    }
}
