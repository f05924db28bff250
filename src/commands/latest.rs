use teloxide::{prelude::*, types::ReplyParameters};

use crate::{
    bashim::FetchError,
    constants::telegram::{LEGACY_MARKDOWN, MESSAGE_LIMIT},
    format::{chunk_messages, render_quote},
    models::quote::Quote,
    Data, Error,
};

const FETCH_FAILED: &str = "Не удалось получить последние цитаты :(";

/// get the freshest quotes from the front page.
#[tracing::instrument(skip_all, fields(chat_id = %msg.chat.id))]
pub async fn latest(bot: &Bot, msg: &Message, data: &Data) -> Result<(), Error> {
    send_announcement(bot, msg).await?;
    let quotes = data.bash.latest().await;

    send_quotes(bot, msg, quotes).await
}

/// same as `latest`, but from the abyss.
#[tracing::instrument(skip_all, fields(chat_id = %msg.chat.id))]
pub async fn abyss(bot: &Bot, msg: &Message, data: &Data) -> Result<(), Error> {
    send_announcement(bot, msg).await?;
    let quotes = data.bash.abyss().await;

    send_quotes(bot, msg, quotes).await
}

async fn send_announcement(bot: &Bot, msg: &Message) -> Result<(), Error> {
    bot.send_message(msg.chat.id, "_Получаю свежие цитаты..._")
        .parse_mode(LEGACY_MARKDOWN)
        .reply_parameters(ReplyParameters::new(msg.id))
        .await
        .inspect_err(|e| tracing::error!(err = ?e, "an error occurred when sending reply"))?;

    Ok(())
}

async fn send_quotes(
    bot: &Bot,
    msg: &Message,
    quotes: Result<Vec<Quote>, FetchError>,
) -> Result<(), Error> {
    for text in listing_messages(quotes) {
        // keep going so one rejected chunk doesn't swallow the rest.
        if let Err(e) = bot
            .send_message(msg.chat.id, text)
            .parse_mode(LEGACY_MARKDOWN)
            .await
        {
            tracing::error!(err = ?e, "an error occurred when sending quotes");
        }
    }

    Ok(())
}

fn listing_messages(quotes: Result<Vec<Quote>, FetchError>) -> Vec<String> {
    match quotes {
        Ok(quotes) if !quotes.is_empty() => {
            chunk_messages(quotes.iter().map(render_quote), MESSAGE_LIMIT)
        }
        Ok(_) => {
            tracing::warn!("no quotes found on the listing page");
            vec![FETCH_FAILED.to_string()]
        }
        Err(e) => {
            tracing::error!(err = ?e, "an error occurred when fetching quotes");
            vec![FETCH_FAILED.to_string()]
        }
    }
}
