use std::{io::Write, process, sync::Arc, time::Duration};

use tokio::sync::watch;
use tracing::{Dispatch, Level, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;
use trendpress::{
    application::{
        access::AccessTokens,
        error::AppError,
        imaging::ImageService,
        library::PostLibrary,
        ports::{GenerativeModel, WordPressGateway},
        publishing::PublishingService,
        repos::{PostsRepo, SettingsRepo},
        research::ResearchService,
        sessions::SessionRegistry,
        settings::SettingsService,
        workflow::{SessionView, TopicChoice, WorkflowController, WorkflowServices},
        writing::WritingService,
    },
    config,
    domain::workflow::Stage,
    infra::{
        db::PostgresRepositories,
        error::InfraError,
        gemini::GeminiClient,
        http::{self, ApiRateLimiter, ApiState, RouterState},
        memory::InMemoryPostsRepo,
        settings_file::FileSettingsRepo,
        telemetry,
        wordpress::WordPressClient,
    },
};

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
        config::Command::Generate(args) => run_generate(settings, args).await,
        config::Command::Migrate(_) => run_migrate(settings).await,
    }
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let (posts, db) = init_posts_repository(&settings).await?;
    let services = build_workflow_services(&settings, posts.clone()).await?;

    let tokens = AccessTokens::new(&settings.auth.tokens);
    if tokens.is_empty() {
        warn!(
            target = "trendpress::serve",
            "no bearer tokens configured; every API request will be rejected"
        );
    }

    let rate_limiter = ApiRateLimiter::new(
        Duration::from_secs(settings.rate_limit.window_seconds.get().into()),
        settings.rate_limit.max_requests.get(),
    );

    let api_state = ApiState {
        sessions: SessionRegistry::new(services.clone(), settings.server.session_idle_ttl),
        library: PostLibrary::new(posts),
        settings: services.settings.clone(),
        tokens: Arc::new(tokens),
        rate_limiter: Arc::new(rate_limiter),
    };

    serve_http(&settings, RouterState { api: api_state, db }).await
}

async fn run_generate(
    settings: config::Settings,
    args: config::GenerateArgs,
) -> Result<(), AppError> {
    let (posts, _db) = init_posts_repository(&settings).await?;
    let services = build_workflow_services(&settings, posts).await?;
    let controller = WorkflowController::new(args.owner.clone(), services);

    info!(
        target = "trendpress::generate",
        topic = %args.topic,
        pick = args.pick,
        publish = args.publish,
        "generating post"
    );

    let mut view = controller.submit_topic(&args.topic).await?;
    if view.stage == Stage::TopicSelection {
        view = controller
            .select_topic(TopicChoice::Index { index: args.pick })
            .await?;
    }
    if args.publish && view.stage == Stage::Completed {
        view = controller.publish().await?;
    }

    print_view(&view)?;

    match view.last_error {
        Some(message) if view.stage == Stage::Failed => Err(AppError::unexpected(message)),
        _ => Ok(()),
    }
}

async fn run_migrate(settings: config::Settings) -> Result<(), AppError> {
    let database_url = settings
        .database
        .url
        .as_ref()
        .ok_or_else(|| InfraError::configuration("database url is not configured"))
        .map_err(AppError::from)?;

    let pool =
        PostgresRepositories::connect(database_url, settings.database.max_connections.get())
            .await
            .map_err(|err| AppError::from(InfraError::from(err)))?;
    PostgresRepositories::run_migrations(&pool)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;

    info!(target = "trendpress::migrate", "migrations applied");
    Ok(())
}

fn print_view(view: &SessionView) -> Result<(), AppError> {
    let mut stdout = std::io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, view)
        .map_err(|err| AppError::from(InfraError::from(err)))?;
    writeln!(stdout).map_err(|err| AppError::from(InfraError::from(err)))?;
    Ok(())
}

/// Postgres when a database URL is configured, otherwise an in-memory store.
async fn init_posts_repository(
    settings: &config::Settings,
) -> Result<(Arc<dyn PostsRepo>, Option<Arc<PostgresRepositories>>), AppError> {
    let Some(database_url) = settings.database.url.as_ref() else {
        warn!(
            target = "trendpress::bootstrap",
            "database url is not configured; posts are kept in memory"
        );
        return Ok((Arc::new(InMemoryPostsRepo::new()), None));
    };

    let pool =
        PostgresRepositories::connect(database_url, settings.database.max_connections.get())
            .await
            .map_err(|err| AppError::from(InfraError::from(err)))?;

    PostgresRepositories::run_migrations(&pool)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;

    let repositories = Arc::new(PostgresRepositories::new(pool));
    let posts: Arc<dyn PostsRepo> = repositories.clone();
    Ok((posts, Some(repositories)))
}

async fn build_workflow_services(
    settings: &config::Settings,
    posts: Arc<dyn PostsRepo>,
) -> Result<WorkflowServices, AppError> {
    let model: Arc<dyn GenerativeModel> = Arc::new(GeminiClient::new(&settings.gemini)?);
    let gateway: Arc<dyn WordPressGateway> =
        Arc::new(WordPressClient::new(settings.wordpress.request_timeout)?);
    let settings_repo: Arc<dyn SettingsRepo> =
        Arc::new(FileSettingsRepo::new(settings.settings_store.path.clone()));

    let publishing = PublishingService::new(gateway);
    let wordpress = SettingsService::load(settings_repo, publishing.clone()).await;

    Ok(WorkflowServices {
        research: ResearchService::new(model.clone()),
        imaging: ImageService::new(model.clone(), settings.gemini.request_timeout),
        writing: WritingService::new(model),
        publishing,
        settings: wordpress,
        posts,
    })
}

async fn serve_http(settings: &config::Settings, state: RouterState) -> Result<(), AppError> {
    let router = http::build_router(state);

    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;
    info!(
        target = "trendpress::serve",
        addr = %settings.server.addr,
        "listening"
    );

    let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
    let server = axum::serve(listener, router.into_make_service()).with_graceful_shutdown(
        async move {
            let _ = shutdown_rx.changed().await;
        },
    );
    let mut server = tokio::spawn(server.into_future());

    tokio::select! {
        result = &mut server => return server_outcome(result),
        signal = tokio::signal::ctrl_c() => {
            if let Err(err) = signal {
                warn!(target = "trendpress::serve", error = %err, "failed to listen for ctrl-c");
            }
        }
    }

    info!(target = "trendpress::serve", "shutdown requested; draining connections");
    let _ = shutdown_tx.send(true);

    match tokio::time::timeout(settings.server.graceful_shutdown, &mut server).await {
        Ok(result) => server_outcome(result),
        Err(_) => {
            warn!(
                target = "trendpress::serve",
                deadline_secs = settings.server.graceful_shutdown.as_secs(),
                "graceful shutdown deadline elapsed; aborting open connections"
            );
            server.abort();
            Ok(())
        }
    }
}

fn server_outcome(
    result: Result<std::io::Result<()>, tokio::task::JoinError>,
) -> Result<(), AppError> {
    match result {
        Ok(Ok(())) => Ok(()),
        Ok(Err(err)) => Err(AppError::from(InfraError::from(err))),
        Err(err) => Err(AppError::unexpected(format!("server task failed: {err}"))),
    }
}
