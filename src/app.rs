use anyhow::Result;
use log::{debug, warn};
use std::sync::Arc;
use time::OffsetDateTime;
use tokio::sync::Mutex;

use crate::action::Action;
use crate::admin;
use crate::config::Config;
use crate::feedback;
use crate::keyboards::start_keyboard;
use crate::messenger::{Event, Messenger, Reply, Sender};
use crate::session::Sessions;
use crate::store::{FeedbackData, Store, UserId};

pub fn now_ts() -> i64 {
    OffsetDateTime::now_utc().unix_timestamp()
}

/// All state the handlers touch. One instance per process.
#[derive(Debug)]
pub struct App {
    pub admins: Vec<UserId>,
    pub cooldown_secs: i64,
    pub store: Store,
    pub data: FeedbackData,
    pub sessions: Sessions,
}

pub type SharedApp = Arc<Mutex<App>>;

impl App {
    pub fn new(admins: Vec<UserId>, cooldown_secs: i64, store: Store) -> Self {
        let data = store.load();
        App {
            admins,
            cooldown_secs,
            store,
            data,
            sessions: Sessions::default(),
        }
    }

    pub fn from_config(cfg: &Config) -> Self {
        Self::new(
            cfg.admin_ids.clone(),
            cfg.cooldown_secs,
            Store::new(cfg.data_file.clone()),
        )
    }

    pub fn is_admin(&self, user: UserId) -> bool {
        self.admins.contains(&user)
    }

    pub fn persist(&self) -> Result<()> {
        self.store.save(&self.data)
    }
}

const UNAUTHORIZED: &str = "❌ Unauthorized.";

pub const HELP_TEXT: &str = "📘 Feedback Bot Help\n\n\
⭐ Rate your experience (1–5 stars)\n\
💬 Then type your feedback.\n\
🕒 You can submit feedback once every hour.\n\
🚫 If you are blocked, you won’t be able to send new feedback.";

/// Routes one inbound event to exactly one handler.
pub async fn dispatch<M: Messenger>(app: &mut App, tg: &M, event: Event, now: i64) -> Result<()> {
    match event {
        Event::Command { name, from } => handle_command(app, tg, &name, &from).await,
        Event::Button {
            action,
            from,
            callback_id,
            message,
        } => {
            if action.requires_admin() && !app.is_admin(from.id) {
                warn!("user {} tried admin action {}", from.id, action);
                return tg.answer(&callback_id, Some(UNAUTHORIZED)).await;
            }
            tg.answer(&callback_id, None).await?;
            match action {
                Action::SendFeedback => feedback::request_feedback(app, tg, &from, now).await,
                Action::Rate(n) => feedback::select_rating(app, tg, &from, n).await,
                Action::ViewLast => feedback::show_last(app, tg, &from).await,
                Action::Help => tg.send(from.id, Reply::plain(HELP_TEXT)).await,
                Action::AdminPanel => admin::show_panel(tg, &from).await,
                Action::ViewAverage => admin::show_average(app, tg, &from).await,
                Action::Reply(target) => admin::start_reply(app, tg, &from, target, message).await,
                Action::Block(target) => admin::block(app, tg, &from, target, message).await,
                Action::Ignore => admin::ignore(tg, &from, message).await,
                Action::ViewBlocked => admin::show_blocked(app, tg, &from).await,
                Action::ClearFeedback => admin::clear_records(app, tg, &from).await,
            }
        }
        Event::Text { body, from } => {
            if app.is_admin(from.id) {
                if let Some(target) = app.sessions.take_reply_target(from.id) {
                    return admin::deliver_reply(tg, &from, target, &body).await;
                }
            }
            feedback::capture_text(app, tg, &from, body, now).await
        }
    }
}

async fn handle_command<M: Messenger>(app: &mut App, tg: &M, name: &str, from: &Sender) -> Result<()> {
    match name {
        "start" => {
            let menu = start_keyboard(app.is_admin(from.id));
            tg.send(
                from.id,
                Reply::plain("👋 Welcome! Choose an option below:").with_keyboard(menu),
            )
            .await
        }
        "help" => tg.send(from.id, Reply::plain(HELP_TEXT)).await,
        "panel" => {
            if !app.is_admin(from.id) {
                return tg.send(from.id, Reply::plain(UNAUTHORIZED)).await;
            }
            admin::show_panel(tg, from).await
        }
        other => {
            debug!("ignoring unknown command /{} from {}", other, from.id);
            Ok(())
        }
    }
}
