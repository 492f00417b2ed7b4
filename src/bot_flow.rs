use std::sync::Arc;

use teloxide::dispatching::UpdateHandler;
use teloxide::prelude::*;
use teloxide::Bot;

use crate::life_coach::LifeCoach;
use crate::replies;

type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

pub fn schema() -> UpdateHandler<Box<dyn std::error::Error + Send + Sync + 'static>> {
    dptree::entry().branch(Update::filter_message().endpoint(chat_msg))
}

/// The sender id, or the chat id for messages without a sender (channels).
fn user_key(msg: &Message) -> String {
    msg.from()
        .map(|u| u.id.0.to_string())
        .unwrap_or_else(|| msg.chat.id.0.to_string())
}

pub async fn chat_msg(bot: Bot, msg: Message, coach: Arc<LifeCoach>) -> HandlerResult {
    let Some(msg_txt) = msg.text() else {
        log::debug!("ignoring non-text message in chat {}", msg.chat.id);
        return Ok(());
    };
    let user = user_key(&msg);
    log::info!("msg from {}: {}", user, msg_txt);

    let reply = coach.handle(&user, msg_txt).await;

    let chunks = replies::split_message(&reply.text, replies::MAX_MESSAGE_CHARS);
    let last = chunks.len() - 1;
    for (i, chunk) in chunks.into_iter().enumerate() {
        let request = bot.send_message(msg.chat.id, chunk);
        match reply.show_menu && i == last {
            true => request.reply_markup(replies::menu()).await?,
            false => request.await?,
        };
    }

    Ok(())
}
