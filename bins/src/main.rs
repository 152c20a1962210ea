use std::sync::Arc;

use bot_core::gateway::TgChannel;
use bot_main::BotApp;
use dotenv::dotenv;
use env::Env;
use eyre::Context;
use ledger::{
    channel::{mongo::LedgerSubscribers, ChannelManager},
    Ledger,
};
use log::info;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    dotenv().ok();
    pretty_env_logger::init();
    color_eyre::install()?;

    let env = Env::load()?;
    info!("{} admin(s) configured", env.admin_ids().len());
    info!("connecting to mongo");
    let storage = storage::Storage::new(env.mongo_url())
        .await
        .context("Failed to create storage")?;
    let ledger = Ledger::new(storage);

    let app = BotApp::new(env.clone());
    let channel = ChannelManager::new(
        Arc::new(LedgerSubscribers::new(ledger.clone())),
        Arc::new(TgChannel::new(app.bot.clone(), env.channel_id())),
    );

    info!("Starting background sweep...");
    bg_process::start(channel.clone());
    info!("Starting bot...");
    app.start(ledger, channel).await
}
