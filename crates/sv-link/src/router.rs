//! # Handler Registry & Dispatch
//!
//! Routes inbound CALL frames by action name to application logic. Both
//! roles use it: a central system registers handlers for charge-point
//! actions, a charge point registers handlers for remote commands.
//!
//! Registration policy: re-registering an action replaces the previous
//! handler. The registry is assembled before the endpoint starts and is
//! immutable afterwards.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use sv_types::{ErrorCode, HandlerError};

/// Application logic bound to one action name.
#[async_trait]
pub trait ActionHandler: Send + Sync {
    /// Turn a request payload into a response payload, or fail; the
    /// dispatcher converts either into the matching reply frame.
    async fn handle(&self, payload: Value) -> Result<Value, HandlerError>;
}

/// Mapping from action name to handler.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: HashMap<String, Arc<dyn ActionHandler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a handler to an action name, replacing any previous binding.
    pub fn register(&mut self, action: &str, handler: Arc<dyn ActionHandler>) -> &mut Self {
        if self.handlers.insert(action.to_string(), handler).is_some() {
            debug!(action, "replaced existing handler");
        }
        self
    }

    /// Actions with a registered handler.
    pub fn actions(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(String::as_str)
    }

    /// Dispatch a payload to the named action. An unregistered action fails
    /// with `NotImplemented`; the connection stays open.
    pub async fn dispatch(&self, action: &str, payload: Value) -> Result<Value, HandlerError> {
        match self.handlers.get(action) {
            Some(handler) => handler.handle(payload).await,
            None => Err(HandlerError {
                code: ErrorCode::NotImplemented,
                description: format!("no handler registered for action '{action}'"),
            }),
        }
    }
}

type BoxedReply = Pin<Box<dyn Future<Output = Result<Value, HandlerError>> + Send>>;

/// A typed handler function erased to the payload level.
struct FnHandler(Box<dyn Fn(Value) -> BoxedReply + Send + Sync>);

#[async_trait]
impl ActionHandler for FnHandler {
    async fn handle(&self, payload: Value) -> Result<Value, HandlerError> {
        (self.0)(payload).await
    }
}

/// Wrap a typed async function as an [`ActionHandler`].
///
/// The payload is deserialized into the function's request type (malformed
/// payloads answer `FormationViolation`) and the response serialized back;
/// handlers stay strongly typed per action while the registry stays
/// string-keyed.
pub fn handler_fn<F, Fut, Req, Resp>(f: F) -> Arc<dyn ActionHandler>
where
    F: Fn(Req) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Resp, HandlerError>> + Send + 'static,
    Req: DeserializeOwned + Send + 'static,
    Resp: Serialize + 'static,
{
    Arc::new(FnHandler(Box::new(move |payload| -> BoxedReply {
        match serde_json::from_value::<Req>(payload) {
            Err(e) => Box::pin(async move {
                Err(HandlerError::malformed(format!("request payload: {e}")))
            }),
            Ok(request) => {
                let reply = f(request);
                Box::pin(async move {
                    let response = reply.await?;
                    serde_json::to_value(response)
                        .map_err(|e| HandlerError::internal(format!("response payload: {e}")))
                })
            }
        }
    })))
}
