//! Chat transport
//!
//! Adapts Telegram updates to the intake pipeline and back. Commands are
//! handled here directly; every other text message is treated as a link
//! submission and handed to [`IntakePipeline::handle`].

use crate::config::Config;
use crate::db::Database;
use crate::error::{Error, Result};
use crate::intake::IntakePipeline;
use crate::resolver::HttpResolver;
use crate::stats;
use crate::types::{InboundMessage, UserId};
use chrono::Utc;
use futures::future::BoxFuture;
use std::sync::Arc;
use std::time::Duration;
use teloxide::dispatching::{ShutdownToken, UpdateHandler};
use teloxide::error_handlers::ErrorHandler;
use teloxide::prelude::*;
use teloxide::types::{ButtonRequest, KeyboardButton, KeyboardMarkup, ParseMode, WebAppInfo};
use teloxide::utils::command::BotCommands;
use teloxide::RequestError;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Greeting sent for `/start`
pub const WELCOME: &str =
    "Welcome to Terabox Player Bot! 🎥\n\nClick the button below to open the player:";
/// Reply when `/start` cannot complete
pub const START_FAILED: &str = "Sorry, something went wrong. Please try again later.";
/// Label of the web-app button
pub const PLAYER_BUTTON: &str = "🎬 Open Player";

/// Production pipeline type
pub type Pipeline = IntakePipeline<HttpResolver, Arc<Database>>;

/// Supported commands
#[derive(BotCommands, Clone, Debug, PartialEq, Eq)]
#[command(rename_rule = "lowercase")]
pub enum Command {
    /// Show the player button
    Start,
    /// Show usage statistics (admins only)
    Stats,
}

/// Shared state injected into every handler
pub struct BotContext {
    config: Arc<Config>,
    db: Arc<Database>,
    pipeline: Arc<Pipeline>,
    mini_app_url: Url,
}

impl BotContext {
    /// Bundle handler state; fails if the mini app URL does not parse
    pub fn new(config: Arc<Config>, db: Arc<Database>, pipeline: Arc<Pipeline>) -> Result<Self> {
        let mini_app_url = Url::parse(&config.bot.mini_app_url)
            .map_err(|e| Error::config("MINI_APP_URL", format!("invalid URL: {e}")))?;

        Ok(Self {
            config,
            db,
            pipeline,
            mini_app_url,
        })
    }

    fn player_keyboard(&self) -> KeyboardMarkup {
        player_keyboard(&self.mini_app_url)
    }
}

/// One-button keyboard that opens the player web app
pub fn player_keyboard(url: &Url) -> KeyboardMarkup {
    let button = KeyboardButton::new(PLAYER_BUTTON)
        .request(ButtonRequest::WebApp(WebAppInfo { url: url.clone() }));
    KeyboardMarkup::new(vec![vec![button]]).resize_keyboard()
}

/// Update routing: commands first, then plain text
pub fn schema() -> UpdateHandler<RequestError> {
    Update::filter_message()
        .branch(
            dptree::entry()
                .filter_command::<Command>()
                .endpoint(handle_command),
        )
        .branch(
            dptree::filter(|msg: Message| msg.text().is_some_and(|t| !t.starts_with('/')))
                .endpoint(handle_text),
        )
}

fn sender(msg: &Message) -> Option<(UserId, Option<String>)> {
    let user = msg.from.as_ref()?;
    Some((UserId(user.id.0 as i64), user.username.clone()))
}

async fn handle_command(
    bot: Bot,
    msg: Message,
    cmd: Command,
    ctx: Arc<BotContext>,
) -> ResponseResult<()> {
    let Some((user_id, username)) = sender(&msg) else {
        return Ok(());
    };

    match cmd {
        Command::Start => {
            match ctx.db.touch_user(user_id, username.as_deref()).await {
                Ok(()) => {
                    tracing::info!(user_id = %user_id, "user started bot");
                    bot.send_message(msg.chat.id, WELCOME)
                        .reply_markup(ctx.player_keyboard())
                        .await?;
                }
                Err(e) => {
                    tracing::error!(user_id = %user_id, error = %e, "start command failed");
                    bot.send_message(msg.chat.id, START_FAILED).await?;
                }
            }
        }
        Command::Stats => {
            if let Some(text) = stats::stats_reply(&ctx.db, &ctx.config, user_id, Utc::now()).await
            {
                bot.send_message(msg.chat.id, text)
                    .parse_mode(ParseMode::Html)
                    .await?;
            }
        }
    }

    Ok(())
}

async fn handle_text(bot: Bot, msg: Message, ctx: Arc<BotContext>) -> ResponseResult<()> {
    let (Some((user_id, username)), Some(text)) = (sender(&msg), msg.text()) else {
        return Ok(());
    };

    let inbound = InboundMessage::new(user_id, username, text);
    let outcome = ctx.pipeline.handle(&inbound).await;

    let reply = bot.send_message(msg.chat.id, outcome.reply());
    if outcome.is_success() {
        reply.reply_markup(ctx.player_keyboard()).await?;
    } else {
        reply.await?;
    }

    Ok(())
}

struct TracingErrorHandler;

impl ErrorHandler<RequestError> for TracingErrorHandler {
    fn handle_error(self: Arc<Self>, error: RequestError) -> BoxFuture<'static, ()> {
        tracing::error!(error = %error, "failed to deliver reply");
        Box::pin(async {})
    }
}

/// Poll for updates until `shutdown` is cancelled
pub async fn run_dispatcher(bot: Bot, ctx: Arc<BotContext>, shutdown: CancellationToken) {
    let mut dispatcher = Dispatcher::builder(bot, schema())
        .dependencies(dptree::deps![ctx])
        .default_handler(|update| async move {
            tracing::trace!(update_id = ?update.id, "ignoring unhandled update");
        })
        .error_handler(Arc::new(TracingErrorHandler))
        .build();

    let relay = spawn_shutdown_relay(shutdown, dispatcher.shutdown_token());

    tracing::info!("bot dispatcher started");
    dispatcher.dispatch().await;
    relay.abort();
    tracing::info!("bot dispatcher stopped");
}

/// Forward cancellation of `shutdown` to the dispatcher behind `token`
///
/// The dispatcher refuses to stop until it has started polling, so the
/// request is retried. The caller must abort the returned task once the
/// dispatcher has returned.
fn spawn_shutdown_relay(shutdown: CancellationToken, token: ShutdownToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        shutdown.cancelled().await;
        loop {
            match token.shutdown() {
                Ok(done) => {
                    done.await;
                    break;
                }
                Err(_) => tokio::time::sleep(Duration::from_millis(100)).await,
            }
        }
    })
}
