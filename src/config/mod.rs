pub mod schema;

pub use schema::{Config, SessionsConfig, DEFAULT_SESSION_FILE_SUFFIX};
