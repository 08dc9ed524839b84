use std::future::IntoFuture;
use std::process;
use std::sync::Arc;

use studio_blog::{
    application::{admin::AdminPostService, blog::BlogService, error::AppError},
    cache::{CacheConfig, PostCache},
    config,
    infra::{error::InfraError, http, store, telemetry},
};
use tokio::sync::Notify;
use tracing::{Dispatch, Level, dispatcher, error, info, warn};
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

    let subscriber = tracing_fmt()
        .with_max_level(Level::ERROR)
        .with_writer(std::io::stderr)
        .finish();
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
        config::Command::Posts(config::PostsCommand::List(args)) => {
            run_posts_list(settings, args).await
        }
        config::Command::Posts(config::PostsCommand::Show(args)) => {
            run_posts_show(settings, args).await
        }
    }
}

struct ApplicationContext {
    cache: Arc<PostCache>,
    admin: Arc<AdminPostService>,
}

async fn build_application_context(
    settings: &config::Settings,
) -> Result<ApplicationContext, AppError> {
    let stores = store::connect(&settings.store).await?;
    let cache_config = CacheConfig::from(&settings.cache);
    info!(
        target = "studio_blog::bootstrap",
        ttl_seconds = cache_config.ttl.as_secs(),
        single_flight = cache_config.single_flight,
        "post cache configured"
    );

    let cache = Arc::new(PostCache::new(stores.reader, cache_config));
    let admin = Arc::new(AdminPostService::new(stores.writer, Arc::clone(&cache)));
    Ok(ApplicationContext { cache, admin })
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let app = build_application_context(&settings).await?;
    let state = http::HttpState::new(app.cache, app.admin, settings.admin.password.clone());
    let router = http::build_router(state);

    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;
    info!(
        target = "studio_blog::bootstrap",
        addr = %settings.server.addr,
        "http server listening"
    );

    let stop = Arc::new(Notify::new());
    let server = axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown({
            let stop = Arc::clone(&stop);
            async move { stop.notified().await }
        })
        .into_future();
    tokio::pin!(server);

    tokio::select! {
        result = &mut server => {
            return result.map_err(|err| AppError::unexpected(format!("server error: {err}")));
        }
        () = shutdown_signal() => {}
    }

    info!(
        target = "studio_blog::bootstrap",
        grace_seconds = settings.server.graceful_shutdown.as_secs(),
        "shutdown requested; draining connections"
    );
    stop.notify_one();
    match tokio::time::timeout(settings.server.graceful_shutdown, server).await {
        Ok(result) => {
            result.map_err(|err| AppError::unexpected(format!("server error: {err}")))?;
        }
        Err(_) => warn!(
            target = "studio_blog::bootstrap",
            "graceful shutdown window elapsed; dropping open connections"
        ),
    }

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                error!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}

async fn run_posts_list(
    settings: config::Settings,
    args: config::PostsListArgs,
) -> Result<(), AppError> {
    let app = build_application_context(&settings).await?;
    let mut posts = app.cache.get_posts(args.force).await?.to_vec();
    if let Some(limit) = args.limit {
        posts.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
    }

    print_json(&posts)
}

async fn run_posts_show(
    settings: config::Settings,
    args: config::PostsShowArgs,
) -> Result<(), AppError> {
    let app = build_application_context(&settings).await?;
    let blog = BlogService::new(app.cache);
    let post = blog.post_by_slug(&args.slug).await?;

    print_json(&post)
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), AppError> {
    let rendered = serde_json::to_string_pretty(value)
        .map_err(|err| AppError::unexpected(format!("failed to encode output: {err}")))?;
    println!("{rendered}");
    Ok(())
}
