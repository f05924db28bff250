use teloxide::types::ParseMode;

pub static TELOXIDE_VERSION: &str = "0.13.0";

/// Telegram's hard limit on the length of a single text message.
pub const MESSAGE_LIMIT: usize = 4096;

pub const INLINE_CACHE_TIME: u32 = 30;
pub const INLINE_TITLE_LEN: usize = 50;

// quote text is escaped for the legacy flavour only (`*`, `_` and backticks).
#[allow(deprecated)]
pub const LEGACY_MARKDOWN: ParseMode = ParseMode::Markdown;
