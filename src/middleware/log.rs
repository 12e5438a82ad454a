//! Request logging stage.

use async_trait::async_trait;
use tracing::info;

use super::{Flow, Middleware};
use crate::request::Request;

/// Logs every incoming request. Never stops the chain.
#[derive(Clone, Copy, Debug, Default)]
pub struct RequestLog;

#[async_trait]
impl Middleware for RequestLog {
    fn name(&self) -> &'static str {
        "request_log"
    }

    async fn handle(&self, req: &mut Request) -> Flow {
        info!(
            method = %req.method(),
            path = req.path(),
            query = req.query().unwrap_or(""),
            "request received"
        );
        Flow::Next
    }
}
