/// Blog Service Library
///
/// Posts, categories, comments and author profiles for the blog, with a
/// visibility and ownership policy deciding what each viewer may read or
/// change.
///
/// # Modules
///
/// - `handlers`: HTTP request handlers and route registration
/// - `policy`: Post visibility and ownership authorization
/// - `models`: Data structures and request forms
/// - `db`: Storage trait with Postgres and in-memory backends
/// - `pagination`: Page numbering for post listings
/// - `render`: Template identifiers and the rendering backend
/// - `middleware`: Bearer token resolution into a request principal
/// - `error`: Error types and handling
/// - `config`: Configuration management
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod pagination;
pub mod policy;
pub mod render;

pub use config::Config;
pub use error::{AppError, Result};
