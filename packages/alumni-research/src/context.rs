//! Conversation state shared by the stages of one record.

use openai_client::Message;
use serde::{Deserialize, Serialize};

/// Who wrote a turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "name")]
pub enum Author {
    User,
    Stage(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub author: Author,
    pub text: String,
}

/// Append-only turn log for one record's run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageContext {
    turns: Vec<Turn>,
}

impl StageContext {
    /// Context opened by the record's query.
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            turns: vec![Turn {
                author: Author::User,
                text: query.into(),
            }],
        }
    }

    pub fn push_stage_output(&mut self, stage: &str, text: impl Into<String>) {
        self.turns.push(Turn {
            author: Author::Stage(stage.to_string()),
            text: text.into(),
        });
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    /// Messages for a stage: its instructions as the system message, then
    /// every turn in order. Outputs of earlier stages are shown to the next
    /// stage as user messages attributed to their stage.
    pub fn to_messages(&self, instructions: &str) -> Vec<Message> {
        let mut messages = Vec::with_capacity(self.turns.len() + 1);
        messages.push(Message::system(instructions));
        for turn in &self.turns {
            match &turn.author {
                Author::User => messages.push(Message::user(turn.text.clone())),
                Author::Stage(stage) => messages.push(Message::user(format!(
                    "For context: [{stage}] said: {}",
                    turn.text
                ))),
            }
        }
        messages
    }
}
