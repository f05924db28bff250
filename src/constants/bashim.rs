pub const BASH_URL: &str = "https://bash.im";

pub const USER_AGENT_STR: &str = concat!("bashbot/", env!("CARGO_PKG_VERSION"));

/// how many quotes `/latest` and `/abyss` pull from a listing page.
pub const LISTING_LIMIT: usize = 25;

/// how many search hits an inline query offers.
pub const INLINE_SEARCH_LIMIT: usize = 3;
