pub mod config;
pub mod converter;
pub mod error;
pub mod logger;
pub mod post;
pub mod post_list;
pub mod render_post;
mod content;
mod test_data;
mod text_utils;
mod view;
