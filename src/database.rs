//! Persistent backing store collaborator.
//!
//! apier does not talk to a database itself. When `database_url` is set in
//! [`Config`](crate::Config), the app builder calls [`Database::connect`]
//! once and refuses to start if it fails.

use async_trait::async_trait;

use crate::error::BoxError;

#[async_trait]
pub trait Database: Send + Sync + 'static {
    async fn connect(&self, url: &str) -> Result<(), BoxError>;
}
