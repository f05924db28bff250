use std::sync::atomic::{AtomicU64, Ordering};

use teloxide::{
    prelude::*,
    types::{
        InlineQueryResult, InlineQueryResultArticle, InputMessageContent,
        InputMessageContentText, ReplyParameters,
    },
};

use crate::{
    bashim::FetchError,
    commands::help::{usage_text, LATEST_HINT},
    constants::{
        bashim::INLINE_SEARCH_LIMIT,
        telegram::{INLINE_CACHE_TIME, LEGACY_MARKDOWN, MESSAGE_LIMIT},
    },
    format::{fit_message, inline_title, render_quote},
    models::quote::Quote,
    Data, Error,
};

const SEARCH_FAILED: &str = "Не удалось произвести поиск";
const NOTHING_FOUND: &str = "Ничего не найдено...";

/// Hands out ids for inline results: a random per-process prefix plus a counter.
pub struct ResultIds {
    prefix: u64,
    next: AtomicU64,
}

impl ResultIds {
    pub fn new() -> Self {
        ResultIds {
            prefix: rand::random(),
            next: AtomicU64::new(0),
        }
    }

    pub fn next_id(&self) -> String {
        format!("{:016x}-{}", self.prefix, self.next.fetch_add(1, Ordering::Relaxed))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InlineRequest {
    Quote(u64),
    Search(String),
}

impl InlineRequest {
    pub fn parse(query: &str) -> Option<Self> {
        let query = query.trim();

        if query.is_empty() {
            return None;
        }

        match query.parse::<u64>() {
            Ok(id) => Some(InlineRequest::Quote(id)),
            Err(_) => Some(InlineRequest::Search(query.to_owned())),
        }
    }
}

/// anything that isn't a known command.
#[tracing::instrument(skip_all, fields(chat_id = %msg.chat.id))]
pub async fn message_handler(bot: Bot, msg: Message, data: Data) -> Result<(), Error> {
    if msg.text().is_some_and(|text| text.starts_with('/')) {
        bot.send_message(msg.chat.id, LATEST_HINT)
            .await
            .inspect_err(|e| tracing::error!(err = ?e, "an error occurred when sending reply"))?;

        return Ok(());
    }

    bot.send_message(msg.chat.id, usage_text(&data.bot_username))
        .parse_mode(LEGACY_MARKDOWN)
        .reply_parameters(ReplyParameters::new(msg.id))
        .await
        .inspect_err(|e| tracing::error!(err = ?e, "an error occurred when sending reply"))?;

    Ok(())
}

#[tracing::instrument(skip_all, fields(query = %query.query))]
pub async fn inline_query_handler(bot: Bot, query: InlineQuery, data: Data) -> Result<(), Error> {
    let Some(request) = InlineRequest::parse(&query.query) else {
        return Ok(());
    };

    let quotes = match request {
        InlineRequest::Quote(id) => data
            .bash
            .quote(id)
            .await
            .map(|quote| quote.into_iter().collect::<Vec<_>>()),
        InlineRequest::Search(text) => data.bash.search(&text, INLINE_SEARCH_LIMIT).await,
    };

    let results = inline_results(quotes, &data.result_ids);

    bot.answer_inline_query(query.id.clone(), results)
        .cache_time(INLINE_CACHE_TIME)
        .is_personal(false)
        .await
        .inspect_err(
            |e| tracing::error!(err = ?e, "an error occurred when answering inline query"),
        )?;

    Ok(())
}

fn inline_results(
    quotes: Result<Vec<Quote>, FetchError>,
    ids: &ResultIds,
) -> Vec<InlineQueryResult> {
    match quotes {
        Ok(quotes) if !quotes.is_empty() => quotes
            .iter()
            .map(|quote| {
                let text = fit_message(render_quote(quote), MESSAGE_LIMIT);
                article(ids.next_id(), inline_title(quote), text)
            })
            .collect(),
        Ok(_) => vec![article(ids.next_id(), NOTHING_FOUND, NOTHING_FOUND)],
        Err(e) => {
            tracing::error!(err = ?e, "an error occurred when searching quotes");
            vec![article(ids.next_id(), SEARCH_FAILED, SEARCH_FAILED)]
        }
    }
}

fn article(id: String, title: impl Into<String>, text: impl Into<String>) -> InlineQueryResult {
    InlineQueryResult::Article(InlineQueryResultArticle::new(
        id,
        title,
        InputMessageContent::Text(InputMessageContentText::new(text).parse_mode(LEGACY_MARKDOWN)),
    ))
}
