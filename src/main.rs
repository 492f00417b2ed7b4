mod bot_flow;
mod coach;
mod command;
mod config;
mod error;
mod life_coach;
mod model;
mod replies;
mod session;
mod store;

use std::sync::Arc;

use dotenv::dotenv;
use teloxide::prelude::*;
use teloxide::utils::command::BotCommands;

use crate::coach::{Coach, DeepseekProvider};
use crate::command::Command;
use crate::config::AppConfig;
use crate::life_coach::LifeCoach;
use crate::store::{PgStore, Store};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    dotenv().ok();
    pretty_env_logger::init();

    log::info!("reading cfg, connecting to the store, doing initialization mumbo-jumbo...");

    let config = AppConfig::load()?;

    let pg = PgStore::connect(&config.database_url()?).await?;
    pg.migrate().await?;
    let store: Arc<dyn Store> = Arc::new(pg);

    let provider = DeepseekProvider::new(
        &config.deepseek_api_key,
        &config.deepseek_api_base,
        &config.deepseek_model,
    );
    let coach = Coach::new(
        store.clone(),
        Arc::new(provider),
        config.coaching_timeout(),
        config.coaching_cooldown(),
    );
    let life_coach = Arc::new(LifeCoach::new(store, coach, config.pending_input_ttl()));

    let bot = Bot::new(&config.telegram_token);
    if let Err(e) = bot.set_my_commands(Command::bot_commands()).await {
        log::warn!("could not register the command menu: {}", e);
    }

    log::info!("life coach bot started...");

    Dispatcher::builder(bot, bot_flow::schema())
        .dependencies(dptree::deps![life_coach])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    log::info!("life coach bot stopped...");
    Ok(())
}
