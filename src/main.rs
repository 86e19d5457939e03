mod action;
mod admin;
mod app;
mod config;
mod feedback;
mod keyboards;
mod messenger;
mod session;
mod store;
mod telegram;

use anyhow::Result;
use dotenvy::dotenv;
use log::{error, info};
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::types::{CallbackQuery, Message};
use tokio::sync::Mutex;

use crate::app::{dispatch, now_ts, App, SharedApp};
use crate::config::Config;
use crate::messenger::Event;
use crate::telegram::{event_from_callback, event_from_message, Telegram};

// One event at a time: the lock is held for the whole handler.
async fn handle_event(app: SharedApp, tg: Telegram, event: Event) {
    let mut app = app.lock().await;
    if let Err(e) = dispatch(&mut app, &tg, event, now_ts()).await {
        error!("handler error: {:?}", e);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    pretty_env_logger::init();

    let cfg = Config::from_env()?;
    let app = App::from_config(&cfg);

    info!("Feedback bot starting. Admins: {:?}", cfg.admin_ids);
    info!(
        "Data file: {} | cooldown: {}s | {} records, {} blocked",
        app.store.path().display(),
        cfg.cooldown_secs,
        app.data.feedback_records.len(),
        app.data.blocked_users.len()
    );

    let shared: SharedApp = Arc::new(Mutex::new(app));
    let bot = Bot::new(cfg.bot_token.clone());
    let tg = Telegram::new(bot.clone());

    let handler = dptree::entry()
        .branch(
            Update::filter_message().branch(
                dptree::filter(|m: Message| m.chat.is_private()).endpoint(
                    |app: SharedApp, tg: Telegram, msg: Message| async move {
                        if let Some(event) = event_from_message(&msg) {
                            handle_event(app, tg, event).await;
                        }
                        Ok::<(), anyhow::Error>(())
                    },
                ),
            ),
        )
        .branch(
            Update::filter_callback_query()
                .endpoint(|bot: Bot, app: SharedApp, tg: Telegram, q: CallbackQuery| async move {
                    match event_from_callback(&q) {
                        Some(event) => handle_event(app, tg, event).await,
                        None => {
                            if let Err(e) = bot.answer_callback_query(q.id.clone()).await {
                                error!("answering unknown button failed: {:?}", e);
                            }
                        }
                    }
                    Ok::<(), anyhow::Error>(())
                }),
        );

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![shared, tg])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}
