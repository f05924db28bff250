use teloxide::{prelude::*, utils::command::BotCommands};

use crate::{Data, Error};

pub mod help;
pub mod latest;
pub mod status;

#[derive(BotCommands, Clone, Debug, PartialEq, Eq)]
#[command(rename_rule = "lowercase", description = "Команды бота:")]
pub enum Command {
    #[command(description = "свежие цитаты с bash.im")]
    Latest,
    #[command(description = "свежие цитаты из бездны")]
    Abyss,
    #[command(description = "версия и аптайм бота")]
    Status,
    #[command(description = "как пользоваться ботом")]
    Help,
    #[command(hide)]
    Start,
}

#[tracing::instrument(skip(bot, msg, data), fields(chat_id = %msg.chat.id))]
pub async fn command_handler(bot: Bot, msg: Message, cmd: Command, data: Data) -> Result<(), Error> {
    match cmd {
        Command::Latest => latest::latest(&bot, &msg, &data).await,
        Command::Abyss => latest::abyss(&bot, &msg, &data).await,
        Command::Status => status::status(&bot, &msg).await,
        Command::Help | Command::Start => help::help(&bot, &msg, &data).await,
    }
}
