//! Application services layer.

pub mod error;
pub mod feed;
pub mod foods;
pub mod likes;
pub mod repos;
pub mod resolver;
pub mod reviews;
pub mod stats;
