// GBB info JPN - search core
//
// This crate answers the site's free-text search box: it resolves a visitor's
// question to a page on the site and offers typeahead suggestions.

pub mod config;
pub mod domains;
pub mod kernel;
pub mod server;

pub use config::*;
