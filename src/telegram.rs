use anyhow::Result;
use log::warn;
use teloxide::prelude::*;
use teloxide::types::{CallbackQuery, Message, MessageId, ParseMode, User};

use crate::action::Action;
use crate::messenger::{Event, MessageAt, Messenger, Reply, Sender};

#[derive(Clone)]
pub struct Telegram {
    bot: Bot,
}

impl Telegram {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

impl Messenger for Telegram {
    async fn send(&self, chat_id: i64, reply: Reply) -> Result<()> {
        let mut req = self.bot.send_message(ChatId(chat_id), reply.text);
        if reply.html {
            req = req.parse_mode(ParseMode::Html);
        }
        if let Some(kb) = reply.keyboard {
            req = req.reply_markup(kb);
        }
        req.await?;
        Ok(())
    }

    async fn remove_buttons(&self, at: MessageAt) -> Result<()> {
        self.bot
            .edit_message_reply_markup(ChatId(at.chat_id), MessageId(at.message_id))
            .await?;
        Ok(())
    }

    async fn answer(&self, callback_id: &str, alert: Option<&str>) -> Result<()> {
        let mut req = self.bot.answer_callback_query(callback_id.to_string());
        if let Some(text) = alert {
            req = req.text(text).show_alert(true);
        }
        req.await?;
        Ok(())
    }
}

fn sender(user: &User) -> Sender {
    let display_name = match &user.username {
        Some(name) => format!("@{}", name),
        None => user.first_name.clone(),
    };
    Sender {
        id: user.id.0 as i64,
        display_name,
    }
}

/// `/start@my_bot args` -> `start`
fn command_name(text: &str) -> Option<&str> {
    let word = text.strip_prefix('/')?.split_whitespace().next()?;
    Some(word.split('@').next().unwrap_or(word))
}

pub fn event_from_message(msg: &Message) -> Option<Event> {
    let from = sender(msg.from.as_ref()?);
    let text = msg.text()?;
    match command_name(text) {
        Some(name) => Some(Event::Command {
            name: name.to_lowercase(),
            from,
        }),
        None if text.starts_with('/') => None,
        None => Some(Event::Text {
            body: text.to_string(),
            from,
        }),
    }
}

pub fn event_from_callback(q: &CallbackQuery) -> Option<Event> {
    let data = q.data.as_deref()?;
    let action = match data.parse::<Action>() {
        Ok(a) => a,
        Err(e) => {
            warn!("dropping button press from {}: {}", q.from.id, e);
            return None;
        }
    };
    let message = q.message.as_ref().map(|m| MessageAt {
        chat_id: m.chat().id.0,
        message_id: m.id().0,
    });
    Some(Event::Button {
        action,
        from: sender(&q.from),
        callback_id: q.id.clone(),
        message,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_names() {
        assert_eq!(command_name("/start"), Some("start"));
        assert_eq!(command_name("/start@feedback_bot"), Some("start"));
        assert_eq!(command_name("/panel now"), Some("panel"));
        assert_eq!(command_name("hello /start"), None);
        assert_eq!(command_name("/"), None);
    }
}
