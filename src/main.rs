use std::{process, sync::Arc};

use bapddang::{
    application::{
        error::AppError,
        feed::FeedSelector,
        foods::{CreateStandardFoodCommand, FoodCatalogService},
        likes::LikeService,
        repos::{CatalogStore, LikesStore, ReviewStore},
        resolver::NameResolver,
        reviews::{RecordedReview, ReviewCommand, ReviewService},
        stats::StatsAggregator,
    },
    cache::CatalogCache,
    config,
    domain::entities::ReviewRecord,
    infra::{db::PostgresRepositories, error::InfraError, telemetry},
};
use serde::Serialize;
use serde_json::json;
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
    let kind = if error.is_client_error() {
        "invalid_request"
    } else {
        "failure"
    };

    if dispatcher::has_been_set() {
        error!(error = %error, kind, "application error");
        return;
    }

    let subscriber = tracing_fmt()
        .with_max_level(Level::ERROR)
        .with_writer(std::io::stderr)
        .finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, kind, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    let app = build_application_context(&settings).await?;

    match cli_args.command {
        config::Command::Resolve(args) => {
            let resolutions = app
                .resolver
                .resolve_names(&args.names, args.user.user)
                .await?;
            emit(&resolutions)
        }
        config::Command::Feed(args) => {
            let count = args
                .count
                .unwrap_or(settings.feed.default_count.get() as usize);
            let feed = app.feed.get_feed(args.food_type, args.speed, count).await;
            emit(&feed)
        }
        config::Command::Food(args) => {
            let food = app.foods.get_standard(args.id).await?;
            match food {
                Some(food) => emit(&food),
                None => Err(AppError::NotFound),
            }
        }
        config::Command::AddStandard(args) => {
            let created = app
                .foods
                .create_standard(CreateStandardFoodCommand {
                    name: args.name,
                    image_url: args.image_url,
                    speed: args.speed,
                    food_type: args.food_type,
                    categories: args.categories,
                })
                .await?;
            emit(&created)
        }
        config::Command::AddCustom(args) => {
            let food = app
                .foods
                .find_or_create_custom(&args.name, args.user.user)
                .await?;
            emit(&food)
        }
        config::Command::Like(args) => {
            let changed = app.likes.like(args.user.user, args.food_id).await?;
            emit(&json!({ "foodId": args.food_id, "changed": changed }))
        }
        config::Command::Unlike(args) => {
            let changed = app.likes.unlike(args.user.user, args.food_id).await?;
            emit(&json!({ "foodId": args.food_id, "changed": changed }))
        }
        config::Command::Liked(args) => {
            let liked = app.likes.liked_foods(args.user).await?;
            emit(&liked)
        }
        config::Command::Review(args) => {
            let recorded = app
                .reviews
                .create_review(args.user.user, args.day, review_command(args.fields))
                .await?;
            emit(&settle(recorded).await?)
        }
        config::Command::EditReview(args) => {
            let recorded = app
                .reviews
                .update_review(args.user.user, args.review_id, review_command(args.fields))
                .await?;
            emit(&settle(recorded).await?)
        }
        config::Command::Reviews(args) => {
            let reviews = app.reviews.reviews_by_day(args.user.user, args.day).await?;
            emit(&reviews)
        }
        config::Command::ReviewCreated(args) => {
            app.stats
                .on_review_created(&args.food_ids, args.rating)
                .await?;
            emit(&json!({ "foodIds": args.food_ids, "applied": true }))
        }
        config::Command::ReviewEdited(args) => {
            app.stats
                .on_review_edited(&args.food_ids, args.old_rating, args.new_rating)
                .await?;
            emit(&json!({ "foodIds": args.food_ids, "applied": true }))
        }
    }
}

fn review_command(fields: config::ReviewFieldsArgs) -> ReviewCommand {
    ReviewCommand {
        name: fields.name,
        foods: fields.foods,
        speed: fields.speed,
        meal_time: fields.meal_time,
        tags: fields.tags,
        image_url: fields.image_url,
        comment: fields.comment,
        rating: fields.rating,
    }
}

/// Wait for the background stats update so the process does not exit under it.
async fn settle(recorded: RecordedReview) -> Result<ReviewRecord, AppError> {
    if let Some(handle) = recorded.stats_update {
        handle
            .await
            .map_err(|err| AppError::unexpected(format!("stats task failed: {err}")))?;
    }
    Ok(recorded.review)
}

struct ApplicationContext {
    resolver: NameResolver,
    feed: FeedSelector,
    foods: FoodCatalogService,
    likes: LikeService,
    reviews: ReviewService,
    stats: StatsAggregator,
}

async fn build_application_context(
    settings: &config::Settings,
) -> Result<ApplicationContext, AppError> {
    let repositories = init_repositories(settings).await?;
    let catalog_store: Arc<dyn CatalogStore> = repositories.clone();
    let likes_store: Arc<dyn LikesStore> = repositories.clone();
    let review_store: Arc<dyn ReviewStore> = repositories;

    let cache = CatalogCache::load_with_retry(
        catalog_store.as_ref(),
        settings.catalog.load_policy(),
    )
    .await?;
    let cache = Arc::new(cache);

    let stats = StatsAggregator::new(catalog_store.clone(), cache.clone());
    Ok(ApplicationContext {
        resolver: NameResolver::new(
            catalog_store.clone(),
            cache.clone(),
            settings.catalog.resolver_config(),
        ),
        feed: FeedSelector::new(cache.clone()),
        foods: FoodCatalogService::new(catalog_store, cache.clone()),
        likes: LikeService::new(likes_store, cache, stats.clone()),
        reviews: ReviewService::new(review_store, stats.clone()),
        stats,
    })
}

async fn init_repositories(
    settings: &config::Settings,
) -> Result<Arc<PostgresRepositories>, AppError> {
    let database_url = settings
        .database
        .url
        .as_ref()
        .ok_or_else(|| InfraError::configuration("database url is not configured"))
        .map_err(AppError::from)?;

    let pool = PostgresRepositories::connect(
        database_url,
        settings.database.max_connections.get(),
        settings.database.acquire_timeout,
    )
    .await
    .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;

    PostgresRepositories::run_migrations(&pool)
        .await
        .map_err(|err| AppError::from(InfraError::migration(err.to_string())))?;

    let repositories = PostgresRepositories::new(pool);
    repositories
        .health_check()
        .await
        .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;

    info!(
        max_connections = settings.database.max_connections.get(),
        "Database ready"
    );
    Ok(Arc::new(repositories))
}

fn emit<T: Serialize + ?Sized>(value: &T) -> Result<(), AppError> {
    let rendered = serde_json::to_string_pretty(value)
        .map_err(|err| AppError::unexpected(format!("failed to encode output: {err}")))?;
    println!("{rendered}");
    Ok(())
}
