use super::{build_response, Context};
use crate::backend::dto::LoginRequest;
use crate::error::ConsoleError;
use crate::session::Session;
use crate::store::ConsoleStore;
use std::sync::Arc;
use tokio::task;
use warp::Filter;

pub fn routes(
    ctx: &Context,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    current_session(ctx.clone())
        .or(login(ctx.clone()))
        .or(logout(ctx.clone()))
        .or(visibility(ctx.store.clone()))
}

/// GET api/session
fn current_session(
    ctx: Context,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::any()
        .map(move || ctx.clone())
        .and(warp::get())
        .and(warp::path!("api" / "session"))
        .and_then(|ctx: Context| async move {
            build_response(Ok(dto::SessionDto::from(ctx.auth.session())))
        })
        .boxed()
}

/// POST api/session/login
///
/// Authenticates against the backend and persists user and token
fn login(ctx: Context) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::any()
        .map(move || ctx.clone())
        .and(warp::post())
        .and(warp::path!("api" / "session" / "login"))
        .and(warp::body::json())
        .and_then(|ctx: Context, body: LoginRequest| async move {
            build_response(authenticate(&ctx, body).await)
        })
        .boxed()
}

async fn authenticate(ctx: &Context, body: LoginRequest) -> Result<dto::SessionDto, ConsoleError> {
    let resp = ctx.backend.login(&body.email, &body.password).await?;
    let auth = ctx.auth.clone();
    let session = task::spawn_blocking(move || auth.login(resp.user, resp.token)).await??;
    ctx.backend.set_token(session.token.clone());
    Ok(dto::SessionDto::from(session))
}

/// POST api/session/logout
fn logout(ctx: Context) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::any()
        .map(move || ctx.clone())
        .and(warp::post())
        .and(warp::path!("api" / "session" / "logout"))
        .and_then(|ctx: Context| async move { build_response(sign_out(&ctx).await) })
        .boxed()
}

async fn sign_out(ctx: &Context) -> Result<dto::SessionDto, ConsoleError> {
    let auth = ctx.auth.clone();
    task::spawn_blocking(move || auth.logout()).await??;
    ctx.backend.set_token(None);
    Ok(dto::SessionDto::from(Session::default()))
}

/// PUT api/session/visibility
///
/// Telemetry only ticks while the console page is visible
fn visibility(
    store: Arc<ConsoleStore>,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::any()
        .map(move || store.clone())
        .and(warp::put())
        .and(warp::path!("api" / "session" / "visibility"))
        .and(warp::body::json())
        .and_then(
            |store: Arc<ConsoleStore>, body: dto::VisibilityDto| async move {
                store.set_visible(body.visible);
                build_response(Ok(dto::VisibilityDto {
                    visible: store.is_visible(),
                }))
            },
        )
        .boxed()
}

pub mod dto {
    use crate::session::Session;
    use riego_core::User;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Serialize, Deserialize)]
    pub struct VisibilityDto {
        pub visible: bool,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct SessionDto {
        pub authenticated: bool,
        pub user: Option<User>,
    }

    impl From<Session> for SessionDto {
        fn from(session: Session) -> Self {
            SessionDto {
                authenticated: session.is_authenticated(),
                user: session.user,
            }
        }
    }
}
