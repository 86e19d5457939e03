use anyhow::Result;
use log::{debug, error, info, warn};
use teloxide::utils::html;

use crate::app::App;
use crate::keyboards::{feedback_alert_keyboard, rating_keyboard};
use crate::messenger::{Messenger, Reply, Sender};
use crate::session::Stage;
use crate::store::{Rating, UserId};

const BLOCKED_NOTICE: &str = "🚫 You are blocked from sending feedback.";

/// Whole minutes left, rounded up so an active cooldown never reads as 0.
pub fn minutes_left(remaining_secs: i64) -> i64 {
    (remaining_secs.saturating_add(59) / 60).max(1)
}

fn wait_notice(remaining_secs: i64) -> String {
    format!(
        "⏳ Please wait {} more minutes before sending again.",
        minutes_left(remaining_secs)
    )
}

/// Blocked/cooldown gate, applied on request and again on commit.
fn refusal(app: &App, user: UserId, now: i64) -> Option<String> {
    if app.data.is_blocked(user) {
        return Some(BLOCKED_NOTICE.to_string());
    }
    app.data
        .cooldown_remaining(user, now, app.cooldown_secs)
        .map(wait_notice)
}

pub async fn request_feedback<M: Messenger>(
    app: &mut App,
    tg: &M,
    from: &Sender,
    now: i64,
) -> Result<()> {
    if let Some(notice) = refusal(app, from.id, now) {
        return tg.send(from.id, Reply::plain(notice)).await;
    }
    app.sessions.get_mut(from.id).request_rating();
    tg.send(
        from.id,
        Reply::plain("⭐ Please rate your experience (1–5):").with_keyboard(rating_keyboard()),
    )
    .await
}

pub async fn select_rating<M: Messenger>(
    app: &mut App,
    tg: &M,
    from: &Sender,
    rating: u8,
) -> Result<()> {
    app.sessions.get_mut(from.id).select_rating(rating);
    tg.send(
        from.id,
        Reply::plain(format!(
            "✅ Rating saved: {}⭐\nNow please type your feedback below.",
            rating
        )),
    )
    .await
}

pub async fn show_last<M: Messenger>(app: &App, tg: &M, from: &Sender) -> Result<()> {
    let reply = match app.data.feedback_records.get(&from.id) {
        Some(rec) => Reply::html(format!(
            "🗒️ {}\n⭐ {}\n{}",
            html::bold("Your last feedback:"),
            rec.rating,
            html::escape(&rec.text)
        )),
        None => Reply::plain("ℹ️ You haven’t sent any feedback yet."),
    };
    tg.send(from.id, reply).await
}

/// Free text from a user. Only counts while a rating has been picked.
pub async fn capture_text<M: Messenger>(
    app: &mut App,
    tg: &M,
    from: &Sender,
    body: String,
    now: i64,
) -> Result<()> {
    if app.sessions.get(from.id).stage() != Stage::AwaitingText {
        debug!("ignoring stray text from {}", from.id);
        return Ok(());
    }

    if let Some(notice) = refusal(app, from.id, now) {
        app.sessions.get_mut(from.id).reject_text();
        return tg.send(from.id, Reply::plain(notice)).await;
    }

    let rating = Rating::from(app.sessions.get(from.id).pending_rating);
    app.data.record(from.id, body.clone(), rating, now);
    app.sessions.get_mut(from.id).finish_feedback();
    app.persist()?;
    info!("feedback from {} rating={}", from.id, rating);

    // Already committed: admins hear about it even if the ack bounces.
    if let Err(e) = tg
        .send(from.id, Reply::plain("✅ Thanks for your feedback!"))
        .await
    {
        warn!("feedback ack to {} not delivered: {:?}", from.id, e);
    }

    notify_admins(app, tg, from, rating, &body).await;
    Ok(())
}

/// Each admin is tried independently; a failed delivery does not stop the rest.
async fn notify_admins<M: Messenger>(app: &App, tg: &M, from: &Sender, rating: Rating, body: &str) {
    let text = format!(
        "📬 {}\n\n👤 From: {}\n🆔 ID: {}\n⭐ Rating: {}\n\n💬 Message:\n{}",
        html::bold("New feedback received!"),
        html::escape(&from.display_name),
        html::code_inline(&from.id.to_string()),
        rating,
        html::escape(body)
    );
    for &admin in &app.admins {
        let reply = Reply::html(text.clone()).with_keyboard(feedback_alert_keyboard(from.id));
        if let Err(e) = tg.send(admin, reply).await {
            error!("feedback notification to admin {} failed: {:?}", admin, e);
        }
    }
}
