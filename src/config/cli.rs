use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueHint, builder::BoolishValueParser};
use uuid::Uuid;

use crate::domain::{
    entities::ReviewedFood,
    types::{FoodSpeed, FoodType},
};

/// Command-line arguments for the bapddang binary.
#[derive(Debug, Parser)]
#[command(name = "bapddang", version, about = "Food catalog resolver and statistics")]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(
        long = "config-file",
        env = "BAPDDANG_CONFIG_FILE",
        value_name = "PATH",
        value_hint = ValueHint::FilePath,
        global = true
    )]
    pub config_file: Option<PathBuf>,

    #[command(flatten)]
    pub overrides: SettingsOverrides,

    #[command(subcommand)]
    pub command: Command,
}

/// Settings that may be overridden on any subcommand.
#[derive(Debug, Args, Default, Clone)]
pub struct SettingsOverrides {
    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL", global = true)]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new(),
        global = true
    )]
    pub log_json: Option<bool>,

    /// Override the database connection URL.
    #[arg(long = "database-url", value_name = "URL", global = true)]
    pub database_url: Option<String>,

    /// Override the database pool size.
    #[arg(long = "database-max-connections", value_name = "COUNT", global = true)]
    pub database_max_connections: Option<u32>,

    /// Override the minimum similarity for a suggestion.
    #[arg(long = "similarity-threshold", value_name = "SCORE", global = true)]
    pub similarity_threshold: Option<f64>,

    /// Override how many suggestions a name may receive.
    #[arg(long = "max-suggestions", value_name = "COUNT", global = true)]
    pub max_suggestions: Option<u32>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Resolve free-text food names against the catalogs.
    Resolve(ResolveArgs),
    /// Sample a category-diversified feed of standard foods.
    Feed(FeedArgs),
    /// Show one standard food with its average rating.
    Food(FoodArgs),
    /// Create a standard food.
    #[command(name = "add-standard")]
    AddStandard(AddStandardArgs),
    /// Find or create a custom food for a user.
    #[command(name = "add-custom")]
    AddCustom(AddCustomArgs),
    /// Like a standard food.
    Like(LikeArgs),
    /// Remove a like from a standard food.
    Unlike(LikeArgs),
    /// List the foods a user likes.
    Liked(UserArgs),
    /// Save a review and count it towards its standard foods.
    Review(ReviewArgs),
    /// Replace one of the user's reviews.
    #[command(name = "edit-review")]
    EditReview(EditReviewArgs),
    /// List the reviews a user wrote on one day.
    Reviews(ReviewsArgs),
    /// Count a new review towards food statistics.
    #[command(name = "review-created")]
    ReviewCreated(ReviewCreatedArgs),
    /// Apply a rating change of an existing review.
    #[command(name = "review-edited")]
    ReviewEdited(ReviewEditedArgs),
}

#[derive(Debug, Args, Clone)]
pub struct UserArgs {
    /// Acting user id.
    #[arg(long, value_name = "UUID")]
    pub user: Uuid,
}

#[derive(Debug, Args, Clone)]
pub struct ResolveArgs {
    #[command(flatten)]
    pub user: UserArgs,

    /// Names to resolve, in order.
    #[arg(value_name = "NAME", required = true)]
    pub names: Vec<String>,
}

#[derive(Debug, Args, Clone)]
pub struct FeedArgs {
    #[arg(long = "type", value_name = "meal|dessert")]
    pub food_type: FoodType,

    #[arg(long, value_name = "fast|slow")]
    pub speed: FoodSpeed,

    /// Number of foods to return; defaults to `feed.default_count`.
    #[arg(long, value_name = "COUNT")]
    pub count: Option<usize>,
}

#[derive(Debug, Args, Clone)]
pub struct FoodArgs {
    #[arg(value_name = "FOOD_ID")]
    pub id: Uuid,
}

#[derive(Debug, Args, Clone)]
pub struct AddStandardArgs {
    #[arg(long)]
    pub name: String,

    #[arg(long = "image-url", value_name = "URL", value_hint = ValueHint::Url)]
    pub image_url: String,

    #[arg(long, value_name = "fast|slow")]
    pub speed: FoodSpeed,

    #[arg(long = "type", value_name = "meal|dessert")]
    pub food_type: FoodType,

    /// Category tag; repeat for several.
    #[arg(long = "category", value_name = "TAG")]
    pub categories: Vec<String>,
}

#[derive(Debug, Args, Clone)]
pub struct AddCustomArgs {
    #[command(flatten)]
    pub user: UserArgs,

    #[arg(value_name = "NAME")]
    pub name: String,
}

#[derive(Debug, Args, Clone)]
pub struct LikeArgs {
    #[command(flatten)]
    pub user: UserArgs,

    #[arg(value_name = "FOOD_ID")]
    pub food_id: Uuid,
}

#[derive(Debug, Args, Clone)]
pub struct ReviewCreatedArgs {
    /// Rating between 1 and 5; omitted for unrated reviews.
    #[arg(long, value_name = "1-5", allow_negative_numbers = true)]
    pub rating: Option<i32>,

    #[arg(value_name = "FOOD_ID", required = true)]
    pub food_ids: Vec<Uuid>,
}

#[derive(Debug, Args, Clone)]
pub struct ReviewEditedArgs {
    /// Rating before the edit; omitted if the review was unrated.
    #[arg(long = "old-rating", value_name = "1-5", allow_negative_numbers = true)]
    pub old_rating: Option<i32>,

    /// Rating after the edit.
    #[arg(long = "new-rating", value_name = "1-5", allow_negative_numbers = true)]
    pub new_rating: Option<i32>,

    #[arg(value_name = "FOOD_ID", required = true)]
    pub food_ids: Vec<Uuid>,
}

/// Review content shared by `review` and `edit-review`.
#[derive(Debug, Args, Clone)]
pub struct ReviewFieldsArgs {
    #[arg(long)]
    pub name: String,

    /// Reviewed food as `standard:<uuid>` or `custom:<uuid>`; repeat for several.
    #[arg(long = "food", value_name = "KIND:UUID", required = true)]
    pub foods: Vec<ReviewedFood>,

    #[arg(long, value_name = "fast|slow")]
    pub speed: FoodSpeed,

    #[arg(long = "meal-time", value_name = "LABEL")]
    pub meal_time: String,

    /// Free-form tag; repeat for several.
    #[arg(long = "tag", value_name = "TAG")]
    pub tags: Vec<String>,

    #[arg(long = "image-url", value_name = "URL", value_hint = ValueHint::Url, default_value = "")]
    pub image_url: String,

    #[arg(long, default_value = "")]
    pub comment: String,

    /// Rating between 1 and 5; omitted for unrated reviews.
    #[arg(long, value_name = "1-5", allow_negative_numbers = true)]
    pub rating: Option<i32>,
}

#[derive(Debug, Args, Clone)]
pub struct ReviewArgs {
    #[command(flatten)]
    pub user: UserArgs,

    /// Journal day the review belongs to, starting at 1.
    #[arg(long, value_name = "DAY")]
    pub day: i32,

    #[command(flatten)]
    pub fields: ReviewFieldsArgs,
}

#[derive(Debug, Args, Clone)]
pub struct EditReviewArgs {
    #[command(flatten)]
    pub user: UserArgs,

    #[arg(value_name = "REVIEW_ID")]
    pub review_id: Uuid,

    #[command(flatten)]
    pub fields: ReviewFieldsArgs,
}

#[derive(Debug, Args, Clone)]
pub struct ReviewsArgs {
    #[command(flatten)]
    pub user: UserArgs,

    #[arg(long, value_name = "DAY")]
    pub day: i32,
}
