use std::future::IntoFuture;

use anyhow::Context;
use page_tree_server::configuration::{Config, load_configuration};
use page_tree_server::server::Server;
use page_tree_server::telemetry::{get_subscriber, init_telemetry};
use page_tree_server::{build_application_state, run};
use tracing_log_error::log_error;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = load_configuration(None)?;
    let subscriber = get_subscriber(&config.telemetry.log_filter, std::io::stdout);
    init_telemetry(subscriber)?;

    // We don't want to print the error twice, so we log it
    // and then exit with a non-zero status code.
    if let Err(e) = _main(config).await {
        let e: &(dyn std::error::Error + 'static) = e.as_ref();
        log_error!(e, "The application is exiting due to an error");
        std::process::exit(1);
    }
    Ok(())
}

async fn _main(config: Config) -> anyhow::Result<()> {
    let application_state = build_application_state(&config)?;

    let incoming = config
        .server
        .listener()
        .await
        .context("Failed to bind the server TCP listener")?;
    let address = incoming
        .local_addr()
        .context("The server TCP listener doesn't have a local socket address")?;
    tracing::info!("Starting to listen for incoming requests at {}", address);

    let server_handle = run(Server::new().listen(incoming), application_state)
        .context("Failed to build the router")?;

    tokio::select! {
        () = server_handle.clone().into_future() => {}
        signal = tokio::signal::ctrl_c() => {
            signal.context("Failed to listen for the shutdown signal")?;
            tracing::info!("Shutting down");
            server_handle.shutdown(config.server.shutdown_mode()).await;
        }
    }
    Ok(())
}
