use std::{sync::Arc, time::Duration};

use teloxide::{
    dispatching::UpdateHandler,
    prelude::*,
    types::{InputFile, Me},
    update_listeners::{webhooks, Polling},
    utils::command::BotCommands,
};

use crate::{
    bashim::BashClient,
    commands::{self, Command},
    config::{self, BotConfig, Mode},
    handlers::{self, ResultIds},
    telemetry, Data, Error,
};

fn schema() -> UpdateHandler<Error> {
    let message_handler = Update::filter_message()
        .branch(
            dptree::entry()
                .filter_command::<Command>()
                .endpoint(commands::command_handler),
        )
        .branch(dptree::endpoint(handlers::message_handler));

    let inline_handler = Update::filter_inline_query().endpoint(handlers::inline_query_handler);

    dptree::entry()
        .branch(message_handler)
        .branch(inline_handler)
}

/// long polling needs the API client to outlive the poll itself.
fn api_timeout(mode: &Mode) -> Duration {
    match mode {
        Mode::Polling { timeout } => *timeout + Duration::from_secs(10),
        Mode::Webhook { .. } => Duration::from_secs(17),
    }
}

async fn init_bot(token: &str, api_timeout: Duration) -> anyhow::Result<(Bot, Me)> {
    let client = teloxide::net::default_reqwest_settings()
        .timeout(api_timeout)
        .build()?;
    let bot = Bot::with_client(token, client);

    let me = bot.get_me().await.inspect_err(
        |e| tracing::error!(err = ?e, "an error occurred when fetching bot account"),
    )?;

    tracing::info!(
        username = %me.username(),
        id = %me.id,
        "authorized on account"
    );

    bot.set_my_commands(Command::bot_commands())
        .await
        .inspect_err(|e| tracing::error!(err = ?e, "an error occurred when registering commands"))?;

    Ok((bot, me))
}

async fn dispatch(bot: Bot, me: Me, data: Data, mode: Mode) -> anyhow::Result<()> {
    let mut dispatcher = Dispatcher::builder(bot.clone(), schema())
        .dependencies(dptree::deps![data, me])
        .default_handler(|upd| async move {
            tracing::debug!(update_id = ?upd.id, "ignoring unhandled update");
        })
        .error_handler(LoggingErrorHandler::with_custom_text(
            "an error occurred in the update handler",
        ))
        .enable_ctrlc_handler()
        .build();

    match mode {
        Mode::Polling { timeout } => {
            tracing::info!(timeout = ?timeout, "receiving updates with long polling");

            let listener = Polling::builder(bot)
                .timeout(timeout)
                .delete_webhook()
                .await
                .build();

            dispatcher
                .dispatch_with_listener(
                    listener,
                    LoggingErrorHandler::with_custom_text("an error occurred when polling updates"),
                )
                .await;
        }
        Mode::Webhook {
            url,
            listen_addr,
            certificate,
        } => {
            tracing::info!(url = %url.path(), addr = %listen_addr, "receiving updates with webhook");

            let mut options = webhooks::Options::new(listen_addr, url);
            options.certificate = certificate.map(InputFile::file);

            let listener = webhooks::axum(bot, options).await.inspect_err(
                |e| tracing::error!(err = ?e, "an error occurred when setting up webhook"),
            )?;

            dispatcher
                .dispatch_with_listener(
                    listener,
                    LoggingErrorHandler::with_custom_text("an error occurred in the webhook listener"),
                )
                .await;
        }
    }

    Ok(())
}

pub async fn run() -> anyhow::Result<()> {
    let dotenv_path = config::load_dotenv();
    let config = BotConfig::from_env()?;
    let telemetry = telemetry::init_telemetry(config.debug)?;

    tracing::info!("initializing... please wait warmly.");

    match dotenv_path {
        Some(path) => tracing::info!(path = %path.display(), "loaded environment file"),
        None => tracing::warn!("no `.env` file found, using process environment only"),
    }

    tracing::debug!("debug logging enabled");

    let (bot, me) = init_bot(&config.token, api_timeout(&config.mode)).await?;

    let data = Data {
        bash: BashClient::new(config.http_timeout)?,
        result_ids: Arc::new(ResultIds::new()),
        bot_username: me.username().to_owned(),
    };

    tracing::info!("finished initializing!");
    dispatch(bot, me, data, config.mode).await?;

    tracing::info!("shutting down.");
    telemetry.shutdown();

    Ok(())
}
