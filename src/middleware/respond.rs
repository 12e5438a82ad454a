//! Response-builder initialization stage.

use std::sync::Arc;

use async_trait::async_trait;

use super::{Flow, Middleware};
use crate::request::Request;
use crate::responder::Responder;

/// Attaches the application's [`Responder`] to the request so that later
/// stages and the endpoint context can build structured responses.
#[derive(Clone)]
pub struct ResponderInit {
    responder: Arc<dyn Responder>,
}

impl ResponderInit {
    pub fn new(responder: Arc<dyn Responder>) -> Self {
        Self { responder }
    }
}

#[async_trait]
impl Middleware for ResponderInit {
    fn name(&self) -> &'static str {
        "responder_init"
    }

    async fn handle(&self, req: &mut Request) -> Flow {
        req.attach_responder(Arc::clone(&self.responder));
        Flow::Next
    }
}
