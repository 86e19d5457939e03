use anyhow::Result;
use std::future::Future;
use teloxide::types::InlineKeyboardMarkup;

use crate::action::Action;
use crate::store::UserId;

/// Who sent an update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sender {
    pub id: UserId,
    /// `@username`, or the first name when there is none.
    pub display_name: String,
}

/// A message the bot already sent, e.g. one carrying buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageAt {
    pub chat_id: i64,
    pub message_id: i32,
}

/// Inbound update after classification.
#[derive(Debug, Clone)]
pub enum Event {
    Command {
        name: String,
        from: Sender,
    },
    Button {
        action: Action,
        from: Sender,
        callback_id: String,
        message: Option<MessageAt>,
    },
    Text {
        body: String,
        from: Sender,
    },
}

#[derive(Debug, Clone)]
pub struct Reply {
    pub text: String,
    pub html: bool,
    pub keyboard: Option<InlineKeyboardMarkup>,
}

impl Reply {
    pub fn plain(text: impl Into<String>) -> Self {
        Reply {
            text: text.into(),
            html: false,
            keyboard: None,
        }
    }

    pub fn html(text: impl Into<String>) -> Self {
        Reply {
            html: true,
            ..Reply::plain(text)
        }
    }

    pub fn with_keyboard(mut self, keyboard: InlineKeyboardMarkup) -> Self {
        self.keyboard = Some(keyboard);
        self
    }
}

/// Outbound side of the chat platform.
pub trait Messenger: Sync {
    fn send(&self, chat_id: i64, reply: Reply) -> impl Future<Output = Result<()>> + Send;

    fn remove_buttons(&self, at: MessageAt) -> impl Future<Output = Result<()>> + Send;

    /// Acknowledge a button press, optionally with a popup alert.
    fn answer(
        &self,
        callback_id: &str,
        alert: Option<&str>,
    ) -> impl Future<Output = Result<()>> + Send;
}

#[cfg(test)]
pub mod testing {
    use super::*;
    use anyhow::anyhow;
    use std::collections::HashSet;
    use std::sync::Mutex;

    #[derive(Debug, Clone)]
    pub enum Sent {
        Message { chat_id: i64, reply: Reply },
        ButtonsRemoved(MessageAt),
        Answer { callback_id: String, alert: Option<String> },
    }

    /// Records every outbound call. Sends to chats in `unreachable` fail.
    #[derive(Debug, Default)]
    pub struct RecordingMessenger {
        pub sent: Mutex<Vec<Sent>>,
        pub unreachable: Mutex<HashSet<i64>>,
    }

    impl RecordingMessenger {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn fail_sends_to(&self, chat_id: i64) {
            self.unreachable.lock().unwrap().insert(chat_id);
        }

        pub fn messages_to(&self, chat_id: i64) -> Vec<Reply> {
            self.sent
                .lock()
                .unwrap()
                .iter()
                .filter_map(|s| match s {
                    Sent::Message { chat_id: c, reply } if *c == chat_id => Some(reply.clone()),
                    _ => None,
                })
                .collect()
        }

        pub fn last_text_to(&self, chat_id: i64) -> Option<String> {
            self.messages_to(chat_id).last().map(|r| r.text.clone())
        }

        pub fn removed(&self) -> Vec<MessageAt> {
            self.sent
                .lock()
                .unwrap()
                .iter()
                .filter_map(|s| match s {
                    Sent::ButtonsRemoved(at) => Some(*at),
                    _ => None,
                })
                .collect()
        }

        pub fn alerts(&self) -> Vec<String> {
            self.sent
                .lock()
                .unwrap()
                .iter()
                .filter_map(|s| match s {
                    Sent::Answer { alert, .. } => alert.clone(),
                    _ => None,
                })
                .collect()
        }

        pub fn clear(&self) {
            self.sent.lock().unwrap().clear();
        }
    }

    impl Messenger for RecordingMessenger {
        async fn send(&self, chat_id: i64, reply: Reply) -> Result<()> {
            if self.unreachable.lock().unwrap().contains(&chat_id) {
                return Err(anyhow!("Forbidden: bot was blocked by the user"));
            }
            self.sent.lock().unwrap().push(Sent::Message { chat_id, reply });
            Ok(())
        }

        async fn remove_buttons(&self, at: MessageAt) -> Result<()> {
            self.sent.lock().unwrap().push(Sent::ButtonsRemoved(at));
            Ok(())
        }

        async fn answer(&self, callback_id: &str, alert: Option<&str>) -> Result<()> {
            self.sent.lock().unwrap().push(Sent::Answer {
                callback_id: callback_id.to_string(),
                alert: alert.map(str::to_string),
            });
            Ok(())
        }
    }

    pub fn callback_data(reply: &Reply) -> Vec<String> {
        reply
            .keyboard
            .iter()
            .flat_map(|kb| kb.inline_keyboard.iter().flatten())
            .filter_map(|b| match &b.kind {
                teloxide::types::InlineKeyboardButtonKind::CallbackData(data) => Some(data.clone()),
                _ => None,
            })
            .collect()
    }
}
