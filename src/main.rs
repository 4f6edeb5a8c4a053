use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;

use futures::future::FutureExt;
use time::UtcOffset;
use tokio::sync::mpsc;
use warp::Filter;

use feedback::config::{get_variable_or, parse_variable_or, StoreKind};
use feedback::environment::{Config, Environment};
use feedback::routes;
use feedback::routes::admin::TerminationFunctionWrapper;
use feedback::store::{self, StoreSettings};
use log::{info, initialize_logger};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    dotenv::dotenv().ok();

    let logger = Arc::new(initialize_logger("feedback"));

    let main_port: u16 = parse_variable_or("FEEDBACK_PORT", 3000);
    let admin_port: u16 = parse_variable_or("FEEDBACK_ADMIN_PORT", 3001);

    info!(logger, "Starting..."; "main_port" => main_port, "admin_port" => admin_port);

    let offset_hours: i8 = parse_variable_or("FEEDBACK_DISPLAY_OFFSET_HOURS", 7);
    let display_offset = UtcOffset::from_hms(offset_hours, 0, 0)?;

    let site_root = PathBuf::from(get_variable_or("FEEDBACK_SITE_ROOT", "public"));
    info!(logger, "Serving site..."; "site_root" => %site_root.display());

    let settings = StoreSettings {
        kind: parse_variable_or("FEEDBACK_STORE", StoreKind::File),
        data_file: PathBuf::from(get_variable_or("FEEDBACK_DATA_FILE", "data/feedbacks.json")),
    };
    let store = store::open(logger.clone(), &settings).await?;

    let environment = Environment::new(logger.clone(), store, Config::new(display_offset, site_root));

    let (termination_sender, mut termination_receiver) = mpsc::channel::<()>(1);

    let terminate: TerminationFunctionWrapper<'static> = Arc::new(move || {
        let termination_sender = termination_sender.clone();

        async move {
            // the receiver is only gone once shutdown has begun
            termination_sender.send(()).await.ok();
        }
        .boxed()
    });

    let should_terminate = async move {
        termination_receiver.recv().await;
    }
    .shared();

    let ctrlc = {
        let should_terminate = should_terminate.clone();
        let terminate = terminate.clone();

        let signal = tokio::signal::ctrl_c();

        async move {
            tokio::select! {
                _ = should_terminate => {},
                _ = signal => {
                    terminate().await;
                }
            }
        }
    };

    let main_server = {
        let should_terminate = should_terminate.clone();

        let (_, main_server) = warp::serve(routes::make_routes(environment.clone()))
            .try_bind_with_graceful_shutdown(([0, 0, 0, 0], main_port), async {
                should_terminate.await;
            })?;

        main_server
    };

    let admin_server = {
        let should_terminate = should_terminate.clone();
        let terminate = terminate.clone();

        let routes = routes::admin::make_healthz_route(environment.clone()).or(
            routes::admin::make_termination_route(environment.clone(), terminate),
        );

        let (_, admin_server) = warp::serve(routes)
            .try_bind_with_graceful_shutdown(([0, 0, 0, 0], admin_port), async {
                should_terminate.await;
            })?;

        admin_server
    };

    tokio::join!(ctrlc, main_server, admin_server);

    info!(logger, "Exiting gracefully...");

    Ok(())
}
