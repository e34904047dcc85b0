use std::{str::FromStr, sync::Arc};

use log::{error, warn};
use serde::Serialize;
use tokio::task;

use super::{
    request::{Method, Request},
    response::{Response, Status},
};
use crate::{
    error::ServiceErr,
    service::{DEFAULT_EPOCHS, ModelService, VIS_LIMIT},
    state::DEFAULT_LEARNING_RATE,
};

const BANNER: &str = "Mystery Solver Backend";

#[derive(Serialize)]
struct Liveness {
    status: &'static str,
    message: &'static str,
    data_loaded: bool,
}

#[derive(Serialize)]
struct Architecture {
    layers: [usize; 4],
}

#[derive(Serialize)]
struct Metrics {
    loss: f32,
    accuracy: f32,
}

#[derive(Serialize)]
struct Message {
    message: &'static str,
}

/// Routes `request` to its handler.
pub async fn handle(service: &Arc<ModelService>, request: &Request) -> Response {
    match (&request.method, request.path.as_str()) {
        (Method::Options, _) => Response::empty(Status::NoContent),
        (Method::Get, "/") => liveness(service),
        (Method::Get, "/model/architecture") => architecture(service),
        (Method::Get, "/model/weights") => weights(service).await,
        (Method::Post, "/train/step") => train_step(service, request).await,
        (Method::Post, "/reset") => reset(service).await,
        (_, "/" | "/model/architecture" | "/model/weights" | "/train/step" | "/reset") => {
            Response::error(Status::MethodNotAllowed, "method not allowed")
        }
        _ => Response::error(Status::NotFound, "not found"),
    }
}

fn liveness(service: &ModelService) -> Response {
    let body = Liveness {
        status: "ok",
        message: BANNER,
        data_loaded: service.is_ready(),
    };
    Response::json(Status::Ok, &body)
}

fn architecture(service: &ModelService) -> Response {
    let body = Architecture {
        layers: service.architecture(),
    };
    Response::json(Status::Ok, &body)
}

async fn weights(service: &Arc<ModelService>) -> Response {
    let service = Arc::clone(service);

    match task::spawn_blocking(move || service.snapshot(VIS_LIMIT)).await {
        Ok(Ok(snapshot)) => Response::json(Status::Ok, &snapshot),
        Ok(Err(e)) => failure(e),
        Err(e) => panicked(e),
    }
}

async fn train_step(service: &Arc<ModelService>, request: &Request) -> Response {
    let epochs = match param(request, "epochs", DEFAULT_EPOCHS) {
        Ok(epochs) => epochs,
        Err(res) => return res,
    };
    let lr = match param(request, "lr", DEFAULT_LEARNING_RATE) {
        Ok(lr) => lr,
        Err(res) => return res,
    };

    let service = Arc::clone(service);
    match task::spawn_blocking(move || service.step(epochs, lr)).await {
        Ok(Ok(metrics)) => {
            let body = Metrics {
                loss: metrics.loss,
                accuracy: metrics.accuracy,
            };
            Response::json(Status::Ok, &body)
        }
        Ok(Err(e)) => failure(e),
        Err(e) => panicked(e),
    }
}

async fn reset(service: &Arc<ModelService>) -> Response {
    let service = Arc::clone(service);

    match task::spawn_blocking(move || service.reset()).await {
        Ok(Ok(())) => Response::json(
            Status::Ok,
            &Message {
                message: "Model reset",
            },
        ),
        Ok(Err(e)) => failure(e),
        Err(e) => panicked(e),
    }
}

/// Parses the `name` query parameter, `default` if absent.
fn param<T: FromStr>(request: &Request, name: &str, default: T) -> Result<T, Response> {
    let Some(raw) = request.param(name) else {
        return Ok(default);
    };

    raw.parse().map_err(|_| {
        let msg = format!("invalid parameter {name}: cannot parse {raw:?}");
        Response::error(Status::UnprocessableEntity, &msg)
    })
}

fn failure(e: ServiceErr) -> Response {
    match e {
        // Callers poll this one, it's reported as a regular result.
        ServiceErr::DataUnavailable => Response::error(Status::Ok, &e.to_string()),
        ServiceErr::InvalidParameter { .. } => {
            Response::error(Status::UnprocessableEntity, &e.to_string())
        }
        ServiceErr::Ml(_) => {
            warn!("request failed: {e}");
            Response::error(Status::InternalServerError, &e.to_string())
        }
    }
}

fn panicked(e: task::JoinError) -> Response {
    error!("training task panicked: {e}");
    Response::error(Status::InternalServerError, "internal error")
}
