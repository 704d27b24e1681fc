use std::{process, sync::Arc};

use cartolina::{
    application::{error::AppError, preview::PreviewService},
    config,
    infra::{
        db::PostgresRepositories,
        error::InfraError,
        fonts::{FontLocation, FontSource},
        http::{self, HttpState},
        render::CompositorClient,
        storage::FsBlobStore,
        telemetry,
    },
};
use tracing::{Dispatch, Level, dispatcher, error, info};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
        config::Command::Migrate(_) => run_migrate(settings).await,
    }
}

async fn connect_repositories(
    settings: &config::Settings,
) -> Result<PostgresRepositories, AppError> {
    let url = settings.database.url.as_deref().ok_or_else(|| {
        AppError::from(InfraError::configuration(
            "database.url is required (set CARTOLINA__DATABASE__URL or --database-url)",
        ))
    })?;

    let pool = PostgresRepositories::connect(url, settings.database.max_connections.get())
        .await
        .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;

    Ok(PostgresRepositories::new(pool))
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let repositories = Arc::new(connect_repositories(&settings).await?);

    let font_location = match (&settings.render.font_file, &settings.render.font_url) {
        (Some(path), _) => Some(FontLocation::File(path.clone())),
        (None, Some(url)) => Some(FontLocation::Remote(url.clone())),
        (None, None) => None,
    };
    let font_http = reqwest::Client::builder()
        .timeout(settings.render.timeout)
        .build()
        .map_err(|err| AppError::unexpected(format!("failed to build font client: {err}")))?;
    let fonts = Arc::new(FontSource::new(font_location, font_http));

    let renderer = Arc::new(
        CompositorClient::new(
            settings.render.endpoint.clone(),
            settings.render.timeout,
            fonts,
        )
        .map_err(|err| AppError::unexpected(format!("failed to build compositor client: {err}")))?,
    );

    let blobs = Arc::new(
        FsBlobStore::new(
            settings.storage.directory.clone(),
            settings.storage.public_base_url.clone(),
        )
        .map_err(|err| AppError::from(InfraError::from(err)))?,
    );

    let previews = Arc::new(PreviewService::new(
        repositories.clone(),
        repositories.clone(),
        renderer,
        blobs,
        settings.cache.retention,
    ));

    let state = HttpState {
        previews,
        db: repositories,
        redirect_max_age_secs: settings.cache.redirect_max_age_secs,
    };
    let router = http::build_router(state);

    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;
    info!(
        target = "cartolina::serve",
        addr = %settings.server.addr,
        "share-card service listening"
    );

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();
    let server = tokio::spawn(async move {
        axum::serve(listener, router.into_make_service())
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.await;
            })
            .await
    });

    tokio::signal::ctrl_c()
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;
    info!(target = "cartolina::serve", "shutdown signal received");
    let _ = shutdown_tx.send(());

    match tokio::time::timeout(settings.server.graceful_shutdown, server).await {
        Ok(Ok(result)) => {
            result.map_err(|err| AppError::unexpected(format!("server error: {err}")))
        }
        Ok(Err(join_err)) => Err(AppError::unexpected(format!(
            "server task failed: {join_err}"
        ))),
        Err(_) => {
            error!(
                target = "cartolina::serve",
                "graceful shutdown timed out, exiting with connections open"
            );
            Ok(())
        }
    }
}

async fn run_migrate(settings: config::Settings) -> Result<(), AppError> {
    let repositories = connect_repositories(&settings).await?;

    PostgresRepositories::run_migrations(repositories.pool())
        .await
        .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;

    info!(target = "cartolina::migrate", "migrations applied");
    Ok(())
}
