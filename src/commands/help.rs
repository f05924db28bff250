use teloxide::{
    prelude::*,
    types::ReplyParameters,
    utils::command::BotCommands,
};

use crate::{commands::Command, constants::telegram::LEGACY_MARKDOWN, Data, Error};

pub(crate) const LATEST_HINT: &str = "Как насчёт последних цитат? Используйте /latest";

/// explains how to call the bot inline from any chat.
pub(crate) fn usage_text(bot_username: &str) -> String {
    format!(
        "Зайдите в любой чат, вызовите бота вот так:\n`@{bot_username} <id>`, где ID - \
         это идентификатор цитаты на bash.im. И бот перешлёт её!\n\
         Ещё вместо идентификатора можно указать текст, по которому бот попытается найти цитаты."
    )
}

#[tracing::instrument(skip_all)]
pub async fn help(bot: &Bot, msg: &Message, data: &Data) -> Result<(), Error> {
    let text = format!(
        "{}\n\n{}",
        usage_text(&data.bot_username),
        Command::descriptions()
    );

    bot.send_message(msg.chat.id, text)
        .parse_mode(LEGACY_MARKDOWN)
        .reply_parameters(ReplyParameters::new(msg.id))
        .await
        .inspect_err(|e| tracing::error!(err = ?e, "an error occurred when sending reply"))?;

    Ok(())
}
