/// A single quote scraped from bash.im.
///
/// Every field is already normalized for display: `created` and `rating` are
/// whitespace-collapsed text, `permalink` is absolute (or empty when the page did not
/// link to the quote) and `text` is decoded, line-broken and escaped for Telegram's
/// Markdown parse mode.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Quote {
    pub id: u64,
    pub created: String,
    pub rating: String,
    pub permalink: String,
    pub text: String,
}
