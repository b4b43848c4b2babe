// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Scripted awareness assistant

use serde::Serialize;
use std::time::Duration;

use crate::config::ChatConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    User,
    Bot,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    pub speaker: Speaker,
    pub content: String,
}

/// Holds the transcript and answers every message with the same reply
pub struct ChatAssistant {
    transcript: Vec<ChatMessage>,
    reply: String,
    delay: Duration,
}

impl ChatAssistant {
    pub fn new(config: &ChatConfig) -> Self {
        Self {
            transcript: vec![ChatMessage {
                speaker: Speaker::Bot,
                content: config.greeting.clone(),
            }],
            reply: config.reply.clone(),
            delay: Duration::from_millis(config.reply_delay_ms),
        }
    }

    pub fn transcript(&self) -> &[ChatMessage] {
        &self.transcript
    }

    /// Post a user message and wait for the reply
    ///
    /// Blank input is ignored and yields `None`.
    pub async fn send(&mut self, input: &str) -> Option<&ChatMessage> {
        let input = input.trim();
        if input.is_empty() {
            return None;
        }

        self.transcript.push(ChatMessage {
            speaker: Speaker::User,
            content: input.to_string(),
        });

        tokio::time::sleep(self.delay).await;

        self.transcript.push(ChatMessage {
            speaker: Speaker::Bot,
            content: self.reply.clone(),
        });
        self.transcript.last()
    }
}
