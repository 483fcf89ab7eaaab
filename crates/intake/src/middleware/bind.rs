use crate::bind::BindTarget;
use crate::context::{self, BODY_DATA_KEY, REQ_DATA_KEY};
use crate::handler::RequestHandler;
use crate::intake::Intake;
use crate::response::ResponseWriter;
use crate::Request;
use async_trait::async_trait;

/// The bind stage of a route.
///
/// On success the model is stored under [`REQ_DATA_KEY`], see [`context::bound`]. On failure
/// the error is routed through the registry and the stage returns; whether the request goes on
/// is up to the handler that received the error. The captured body is stored under
/// [`BODY_DATA_KEY`] either way.
#[derive(Debug, Clone)]
pub struct BindHandler {
    intake: Intake,
    target: BindTarget,
}

impl BindHandler {
    pub fn new(intake: Intake, target: BindTarget) -> Self {
        Self { intake, target }
    }

    pub fn target(&self) -> &BindTarget {
        &self.target
    }
}

#[async_trait]
impl RequestHandler for BindHandler {
    async fn invoke(&self, req: &mut Request, resp: &mut ResponseWriter) {
        let mut result = self.intake.bind(req, &self.target).await;

        if !result.body().is_empty() {
            context::set(req, BODY_DATA_KEY, result.body().clone());
        }

        if let Some(err) = result.take_error() {
            self.intake.registry().route_error(req, resp, &err);
            return;
        }

        if let Some(model) = result.take_model() {
            context::set_shared(req, REQ_DATA_KEY, model);
        }
    }
}
