use crate::backend::BackendClient;
use crate::error::ConsoleError;
use crate::session::Auth;
use crate::store::ConsoleStore;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{error, info, warn};
use warp::http::StatusCode;
use warp::Filter;

mod console_routes;
mod doc_routes;
mod metric_routes;
mod resource_routes;
mod session_routes;

/// Everything a request handler may touch
#[derive(Clone)]
pub struct Context {
    pub store: Arc<ConsoleStore>,
    pub backend: Arc<BackendClient>,
    pub auth: Arc<Auth>,
}

pub fn routes(
    ctx: &Context,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    resource_routes::routes(&ctx.store)
        .or(console_routes::routes(ctx))
        .or(session_routes::routes(ctx))
        .or(metric_routes::routes(ctx))
        .or(doc_routes::routes())
}

/// Serves the console api until `shutdown` flips to true
pub async fn dispatch_server_daemon(
    ctx: Context,
    port: u16,
    mut shutdown: watch::Receiver<bool>,
) -> Result<(), warp::Error> {
    let routes = routes(&ctx).with(warp::trace::request());
    let (addr, server) =
        warp::serve(routes).try_bind_with_graceful_shutdown(([0, 0, 0, 0], port), async move {
            while shutdown.changed().await.is_ok() {
                if *shutdown.borrow() {
                    break;
                }
            }
        })?;

    info!("Starting webserver at: {}", addr);
    server.await;
    info!("Webserver stopped");
    Ok(())
}

pub(crate) fn build_response<T: serde::Serialize>(
    resp: Result<T, ConsoleError>,
) -> Result<warp::reply::WithStatus<warp::reply::Json>, warp::Rejection> {
    let (status, body) = match resp {
        Ok(data) => (StatusCode::OK, warp::reply::json(&data)),
        Err(err @ ConsoleError::User(_)) => {
            warn!("{}", err);
            let status = if err.is_not_found() {
                StatusCode::NOT_FOUND
            } else {
                StatusCode::BAD_REQUEST
            };
            let body = dto::ErrorResponseDto {
                error: format!("{}", err),
            };
            (status, warp::reply::json(&body))
        }
        Err(err @ ConsoleError::Internal(_)) => {
            error!("{}", err);
            let body = dto::ErrorResponseDto {
                error: "Internal server error".to_owned(),
            };
            (StatusCode::INTERNAL_SERVER_ERROR, warp::reply::json(&body))
        }
    };
    Ok(warp::reply::with_status(body, status))
}

pub mod dto {
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ErrorResponseDto {
        pub error: String,
    }
}
