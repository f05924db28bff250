use crate::{constants::telegram::INLINE_TITLE_LEN, models::quote::Quote};

/// Renders a quote for Telegram's legacy Markdown parse mode.
pub fn render_quote(quote: &Quote) -> String {
    let header = if quote.permalink.is_empty() {
        format!("#{}", quote.id)
    } else {
        format!("[#{}]({})", quote.id, quote.permalink)
    };

    format!(
        "*Цитата:* {}, {}  \n*Рейтинг:* {}  \n{}    \n\n",
        header, quote.created, quote.rating, quote.text
    )
}

/// Plain-text title for an inline result: the id and the start of the quote.
pub fn inline_title(quote: &Quote) -> String {
    let preview: String = unescape_markdown(&quote.text)
        .chars()
        .map(|c| if c == '\n' { ' ' } else { c })
        .take(INLINE_TITLE_LEN)
        .collect();

    format!("[#{}]: {}...", quote.id, preview.trim_end())
}

fn unescape_markdown(text: &str) -> String {
    text.replace("\\`", "`")
        .replace("\\*", "*")
        .replace("\\_", "_")
}

/// Message length as Telegram counts it: UTF-16 code units.
pub fn message_len(text: &str) -> usize {
    text.encode_utf16().count()
}

/// Packs `parts` into as few messages as possible without any message going over
/// `limit` UTF-16 units. Parts stay whole unless a single part is longer than `limit`.
pub fn chunk_messages(parts: impl IntoIterator<Item = String>, limit: usize) -> Vec<String> {
    let mut messages = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for part in parts {
        let part_len = message_len(&part);

        if current_len + part_len > limit && !current.is_empty() {
            messages.push(std::mem::take(&mut current));
            current_len = 0;
        }

        if part_len > limit {
            messages.extend(split_oversized(&part, limit));
            continue;
        }

        current.push_str(&part);
        current_len += part_len;
    }

    if !current.is_empty() {
        messages.push(current);
    }

    messages
}

/// Cuts `text` down to the first piece that fits in `limit`, using the same split
/// rules as [`chunk_messages`].
pub fn fit_message(text: String, limit: usize) -> String {
    if message_len(&text) <= limit {
        return text;
    }

    text[..split_point(&text, limit)].to_owned()
}

fn split_oversized(mut rest: &str, limit: usize) -> Vec<String> {
    let mut pieces = Vec::new();

    while message_len(rest) > limit {
        let (piece, tail) = rest.split_at(split_point(rest, limit));
        pieces.push(piece.to_owned());
        rest = tail;
    }

    if !rest.is_empty() {
        pieces.push(rest.to_owned());
    }

    pieces
}

/// Byte offset to cut an oversized `text` at: after the last newline that fits, or at
/// the last character that fits. A piece never ends on an escaping backslash.
fn split_point(text: &str, limit: usize) -> usize {
    let mut units = 0;
    let mut end = 0;

    for (idx, ch) in text.char_indices() {
        if units + ch.len_utf16() > limit {
            break;
        }

        units += ch.len_utf16();
        end = idx + ch.len_utf8();
    }

    let mut cut = match text[..end].rfind('\n') {
        Some(pos) if pos > 0 => pos + 1,
        _ => end,
    };

    let backslashes = text[..cut].chars().rev().take_while(|&c| c == '\\').count();
    if backslashes % 2 == 1 {
        cut -= 1;
    }

    if cut == 0 {
        // always make progress, even when nothing fits cleanly.
        cut = text
            .chars()
            .next()
            .map_or(0, char::len_utf8)
            .max(end);
    }

    cut
}
