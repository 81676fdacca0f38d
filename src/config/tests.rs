use uuid::Uuid;

use super::*;
use crate::domain::types::{FoodKind, FoodSpeed};

#[test]
fn cli_overrides_take_highest_precedence() {
    let mut raw = RawSettings::default();
    raw.catalog.similarity_threshold = Some(0.6);
    raw.logging.level = Some("info".to_string());

    let overrides = SettingsOverrides {
        similarity_threshold: Some(0.9),
        log_level: Some("debug".to_string()),
        ..Default::default()
    };

    raw.apply_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert_eq!(settings.catalog.similarity_threshold, 0.9);
    assert_eq!(settings.logging.level, LevelFilter::DEBUG);
}

#[test]
fn defaults_match_resolver_defaults() {
    let settings = Settings::from_raw(RawSettings::default()).expect("valid settings");

    assert_eq!(settings.catalog.resolver_config(), ResolverConfig::default());
    assert_eq!(settings.catalog.load_policy(), LoadPolicy::default());
    assert_eq!(settings.feed.default_count.get(), DEFAULT_FEED_COUNT);
    assert!(settings.database.url.is_none());
    assert!(matches!(settings.logging.format, LogFormat::Compact));
}

#[test]
fn cli_json_logging_enforces_format() {
    let mut raw = RawSettings::default();
    let overrides = SettingsOverrides {
        log_json: Some(true),
        ..Default::default()
    };

    raw.apply_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert!(matches!(settings.logging.format, LogFormat::Json));
}

#[test]
fn blank_database_url_is_treated_as_missing() {
    let mut raw = RawSettings::default();
    raw.database.url = Some("   ".to_string());
    let settings = Settings::from_raw(raw).expect("valid settings");
    assert!(settings.database.url.is_none());
}

#[test]
fn out_of_range_values_are_rejected() {
    let mut raw = RawSettings::default();
    raw.catalog.similarity_threshold = Some(1.5);
    assert!(matches!(
        Settings::from_raw(raw),
        Err(LoadError::Invalid {
            key: "catalog.similarity_threshold",
            ..
        })
    ));

    let mut raw = RawSettings::default();
    raw.catalog.max_suggestions = Some(0);
    assert!(matches!(
        Settings::from_raw(raw),
        Err(LoadError::Invalid {
            key: "catalog.max_suggestions",
            ..
        })
    ));

    let mut raw = RawSettings::default();
    raw.logging.level = Some("loud".to_string());
    assert!(matches!(
        Settings::from_raw(raw),
        Err(LoadError::Invalid {
            key: "logging.level",
            ..
        })
    ));
}

#[test]
fn parse_resolve_arguments() {
    let user = Uuid::new_v4();
    let user_arg = user.to_string();
    let args = CliArgs::parse_from([
        "bapddang",
        "resolve",
        "--user",
        user_arg.as_str(),
        "된장찌개",
        "김밥",
        "--max-suggestions",
        "5",
    ]);

    assert_eq!(args.overrides.max_suggestions, Some(5));
    match args.command {
        Command::Resolve(resolve) => {
            assert_eq!(resolve.user.user, user);
            assert_eq!(resolve.names, vec!["된장찌개", "김밥"]);
        }
        _ => panic!("wrong command parsed"),
    }
}

#[test]
fn parse_feed_arguments() {
    let args = CliArgs::parse_from([
        "bapddang",
        "--database-url",
        "postgres://example",
        "feed",
        "--type",
        "dessert",
        "--speed",
        "slow",
    ]);

    assert_eq!(
        args.overrides.database_url.as_deref(),
        Some("postgres://example")
    );
    match args.command {
        Command::Feed(feed) => {
            assert_eq!(feed.food_type, crate::domain::types::FoodType::Dessert);
            assert_eq!(feed.speed, crate::domain::types::FoodSpeed::Slow);
            assert_eq!(feed.count, None);
        }
        _ => panic!("wrong command parsed"),
    }
}

#[test]
fn parse_add_standard_arguments() {
    let args = CliArgs::parse_from([
        "bapddang",
        "add-standard",
        "--name",
        "비빔밥",
        "--image-url",
        "https://img.example/bibimbap.png",
        "--speed",
        "fast",
        "--type",
        "meal",
        "--category",
        "rice",
        "--category",
        "korean",
    ]);

    match args.command {
        Command::AddStandard(add) => {
            assert_eq!(add.name, "비빔밥");
            assert_eq!(add.categories, vec!["rice", "korean"]);
        }
        _ => panic!("wrong command parsed"),
    }
}

#[test]
fn parse_review_edited_arguments() {
    let food = Uuid::new_v4();
    let food_arg = food.to_string();
    let args = CliArgs::parse_from([
        "bapddang",
        "review-edited",
        "--new-rating",
        "4",
        food_arg.as_str(),
    ]);

    match args.command {
        Command::ReviewEdited(edit) => {
            assert_eq!(edit.old_rating, None);
            assert_eq!(edit.new_rating, Some(4));
            assert_eq!(edit.food_ids, vec![food]);
        }
        _ => panic!("wrong command parsed"),
    }
}

#[test]
fn parse_review_arguments() {
    let user = Uuid::new_v4();
    let (standard, custom) = (Uuid::new_v4(), Uuid::new_v4());
    let user_arg = user.to_string();
    let standard_arg = format!("standard:{standard}");
    let custom_arg = format!("custom:{custom}");
    let args = CliArgs::parse_from([
        "bapddang",
        "review",
        "--user",
        user_arg.as_str(),
        "--day",
        "3",
        "--name",
        "점심",
        "--food",
        standard_arg.as_str(),
        "--food",
        custom_arg.as_str(),
        "--speed",
        "slow",
        "--meal-time",
        "lunch",
        "--tag",
        "매콤",
        "--rating",
        "5",
    ]);

    match args.command {
        Command::Review(review) => {
            assert_eq!(review.user.user, user);
            assert_eq!(review.day, 3);
            let fields = review.fields;
            assert_eq!(fields.foods.len(), 2);
            assert_eq!(fields.foods[0].food_id, standard);
            assert_eq!(fields.foods[0].kind, FoodKind::Standard);
            assert_eq!(fields.foods[1].kind, FoodKind::Custom);
            assert_eq!(fields.speed, FoodSpeed::Slow);
            assert_eq!(fields.tags, vec!["매콤"]);
            assert_eq!(fields.image_url, "");
            assert_eq!(fields.rating, Some(5));
        }
        _ => panic!("wrong command parsed"),
    }
}

#[test]
fn malformed_review_food_is_rejected_by_parser() {
    let user_arg = Uuid::new_v4().to_string();
    let food_arg = format!("brunch:{}", Uuid::new_v4());
    let result = CliArgs::try_parse_from([
        "bapddang",
        "review",
        "--user",
        user_arg.as_str(),
        "--day",
        "1",
        "--name",
        "점심",
        "--food",
        food_arg.as_str(),
        "--speed",
        "fast",
        "--meal-time",
        "lunch",
    ]);
    assert!(result.is_err());
}

#[test]
fn unknown_food_type_is_rejected_by_parser() {
    let result =
        CliArgs::try_parse_from(["bapddang", "feed", "--type", "brunch", "--speed", "fast"]);
    assert!(result.is_err());
}
