use std::sync::Arc;

use color_eyre::{eyre::WrapErr, Result};
use tokio::sync::mpsc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use streambot::adapters::BrowserPrompt;
use streambot::app::{join_task, shutdown_channel, AppContext, EVENT_CAPACITY};
use streambot::auth::AuthCallbackSlot;
use streambot::cli::{parse_args, resolve_command};
use streambot::server::start_callback_server_on;
use streambot::startup::{
    authenticate_store, build_credential_manager, open_secret_store, sign_in, BotConfig,
};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("streambot=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    init_tracing();

    let args = resolve_command(parse_args(std::env::args()));
    let config = BotConfig::from_env(&args.chat_identity);
    let (trigger, shutdown) = shutdown_channel();

    let secrets = match open_secret_store(&config, &args.client_id, &args.certificate_path).await {
        Ok(store) => store,
        Err(e) => {
            eprintln!("Cannot open the secret store: {}", e);
            std::process::exit(1);
        }
    };
    if let Err(e) = authenticate_store(secrets.as_ref()).await {
        eprintln!("Not authenticated with the secret store: {}", e);
        std::process::exit(1);
    }

    let callbacks = AuthCallbackSlot::new();
    let (callback_handle, _) =
        start_callback_server_on(config.callback_addr, callbacks.clone(), shutdown.clone())
            .await
            .wrap_err_with(|| format!("Failed to bind the auth callback on {}", config.callback_addr))?;

    let prompt = Arc::new(BrowserPrompt::new(config.open_browser));
    let signed_in = match build_credential_manager(&config, secrets.clone(), callbacks, prompt).await {
        Ok(manager) => match sign_in(&manager).await {
            Ok(signed_in) => Some((manager, signed_in)),
            Err(e) => {
                error!("Sign-in failed: {}", e);
                eprintln!("{}", e.operator_hint());
                None
            }
        },
        Err(e) => {
            error!("Could not read the platform application secrets: {}", e);
            None
        }
    };
    let Some((manager, signed_in)) = signed_in else {
        trigger.trigger();
        join_task("Callback listener", callback_handle).await;
        std::process::exit(1);
    };

    let (events_tx, events_rx) = mpsc::channel(EVENT_CAPACITY);
    let context = AppContext::new(config, secrets, Arc::new(manager), events_tx, shutdown)?;

    let mut handles = context.spawn_services(&signed_in.identity, events_rx).await;
    handles.push(callback_handle);
    drop(context);

    tokio::signal::ctrl_c()
        .await
        .wrap_err("Failed to listen for Ctrl-C")?;
    info!("Shutting down");
    trigger.trigger();

    for handle in handles {
        join_task("Task", handle).await;
    }
    info!("Everything shut down");
    Ok(())
}
