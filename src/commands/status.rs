use std::time::Duration;

use teloxide::prelude::*;

use crate::{
    constants::{
        telegram::{LEGACY_MARKDOWN, TELOXIDE_VERSION},
        version::get_version,
        STARTUP_TIME,
    },
    Error,
};

/// get the bot's status.
#[tracing::instrument(skip_all)]
pub async fn status(bot: &Bot, msg: &Message) -> Result<(), Error> {
    let uptime = STARTUP_TIME.elapsed().unwrap_or_default();

    let text = format!(
        "*bashbot*: цитаты с bash.im прямо в Telegram.\n\
         *версия:* {}\n\
         *rust:* {}\n\
         *teloxide:* {}\n\
         *аптайм:* {}",
        get_version(),
        rustc_version_runtime::version(),
        TELOXIDE_VERSION,
        format_uptime(uptime),
    );

    bot.send_message(msg.chat.id, text)
        .parse_mode(LEGACY_MARKDOWN)
        .await
        .inspect_err(|e| tracing::error!(err = ?e, "an error occurred when sending reply"))?;

    Ok(())
}

fn format_uptime(uptime: Duration) -> String {
    let secs = uptime.as_secs();
    let (days, hours, minutes) = (secs / 86400, secs % 86400 / 3600, secs % 3600 / 60);

    match (days, hours) {
        (0, 0) => format!("{minutes}м"),
        (0, _) => format!("{hours}ч {minutes}м"),
        _ => format!("{days}д {hours}ч {minutes}м"),
    }
}
