//! Telegram update handlers.
//!
//! Only bot commands are handled; other messages are ignored.

use std::sync::Arc;

use teloxide::{prelude::*, types::Message};

use tbot_core::{domain::ChatId, messaging::types::Command};

use crate::router::AppState;
mod commands;

pub async fn handle_message(msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let Some(text) = msg.text() else {
        return Ok(());
    };

    let Some(cmd) = Command::parse(ChatId(msg.chat.id.0), text) else {
        tracing::debug!(chat_id = msg.chat.id.0, "ignoring non-command message");
        return Ok(());
    };

    commands::handle_command(cmd, &state).await;
    Ok(())
}
