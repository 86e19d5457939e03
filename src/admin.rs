use anyhow::Result;
use log::{debug, info};
use teloxide::utils::html;

use crate::app::App;
use crate::keyboards::admin_panel_keyboard;
use crate::messenger::{MessageAt, Messenger, Reply, Sender};
use crate::store::UserId;

// Every function here assumes the caller already checked the allow-list.

pub async fn show_panel<M: Messenger>(tg: &M, admin: &Sender) -> Result<()> {
    tg.send(
        admin.id,
        Reply::html(format!("🛠️ {}", html::bold("Admin Panel")))
            .with_keyboard(admin_panel_keyboard()),
    )
    .await
}

pub async fn block<M: Messenger>(
    app: &mut App,
    tg: &M,
    admin: &Sender,
    target: UserId,
    alert: Option<MessageAt>,
) -> Result<()> {
    if app.data.block(target) {
        info!("admin {} blocked user {}", admin.id, target);
    } else {
        debug!("user {} was already blocked", target);
    }
    app.persist()?;

    if let Some(at) = alert {
        tg.remove_buttons(at).await?;
    }
    tg.send(
        admin.id,
        Reply::plain(format!("🚫 User {} has been blocked.", target)),
    )
    .await?;

    // The user may have stopped the bot; that is fine.
    if let Err(e) = tg
        .send(
            target,
            Reply::plain("🚫 You’ve been blocked from sending feedback."),
        )
        .await
    {
        debug!("block notice to {} not delivered: {:?}", target, e);
    }
    Ok(())
}

pub async fn ignore<M: Messenger>(tg: &M, admin: &Sender, alert: Option<MessageAt>) -> Result<()> {
    if let Some(at) = alert {
        tg.remove_buttons(at).await?;
    }
    tg.send(admin.id, Reply::plain("✅ Ignored this feedback."))
        .await
}

pub async fn start_reply<M: Messenger>(
    app: &mut App,
    tg: &M,
    admin: &Sender,
    target: UserId,
    alert: Option<MessageAt>,
) -> Result<()> {
    app.sessions.get_mut(admin.id).reply_target = Some(target);
    tg.send(
        admin.id,
        Reply::html(format!(
            "✏️ Type your reply for user {}:",
            html::code_inline(&target.to_string())
        )),
    )
    .await?;
    if let Some(at) = alert {
        tg.remove_buttons(at).await?;
    }
    Ok(())
}

/// Forwards the admin's text. The admin learns whether it arrived.
pub async fn deliver_reply<M: Messenger>(
    tg: &M,
    admin: &Sender,
    target: UserId,
    body: &str,
) -> Result<()> {
    let forward = Reply::html(format!(
        "📢 {}\n{}",
        html::bold("Admin reply:"),
        html::escape(body)
    ));
    let status = match tg.send(target, forward).await {
        Ok(()) => {
            info!("admin {} replied to {}", admin.id, target);
            format!("✅ Reply sent to {}", target)
        }
        Err(e) => format!("⚠️ Could not send reply: {}", e),
    };
    tg.send(admin.id, Reply::plain(status)).await
}

pub async fn show_blocked<M: Messenger>(app: &App, tg: &M, admin: &Sender) -> Result<()> {
    let reply = if app.data.blocked_users.is_empty() {
        Reply::plain("✅ No users are currently blocked.")
    } else {
        let users = app
            .data
            .blocked_users
            .iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join("\n");
        Reply::html(format!("🚫 {}\n{}", html::bold("Blocked users:"), users))
    };
    tg.send(admin.id, reply).await
}

pub async fn clear_records<M: Messenger>(app: &mut App, tg: &M, admin: &Sender) -> Result<()> {
    let n = app.data.clear_records();
    app.persist()?;
    info!("admin {} cleared {} feedback records", admin.id, n);
    tg.send(admin.id, Reply::plain("🧹 Cleared all feedback records."))
        .await
}

pub async fn show_average<M: Messenger>(app: &App, tg: &M, admin: &Sender) -> Result<()> {
    let text = match app.data.average_rating() {
        Some((avg, n)) => format!("⭐ Average Rating: {:.2} / 5 ({} submissions)", avg, n),
        None => "ℹ️ No ratings yet.".to_string(),
    };
    tg.send(admin.id, Reply::plain(text)).await
}
