use super::{build_response, Context};
use warp::Filter;

pub fn routes(
    ctx: &Context,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    health(ctx.clone())
}

fn health(ctx: Context) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::any()
        .map(move || ctx.clone())
        .and(warp::get())
        .and(warp::path!("api" / "health"))
        .and_then(|ctx: Context| async move {
            let status = ctx.store.status();
            let ret = dto::HealthyDto {
                healthy: true,
                version: riego_core::CORE_VERSION,
                backend: ctx.backend.base_url().to_owned(),
                authenticated: ctx.auth.session().is_authenticated(),
                store_version: ctx.store.version(),
                pending_jobs: ctx.store.scheduler().pending(),
                total_sensors: status.total_sensors,
                active_valves: status.active_valves,
            };
            build_response(Ok(ret))
        })
        .boxed()
}

mod dto {
    use serde::Serialize;

    #[derive(Debug, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct HealthyDto {
        pub healthy: bool,
        pub version: &'static str,
        pub backend: String,
        pub authenticated: bool,
        pub store_version: u64,
        pub pending_jobs: usize,
        pub total_sensors: usize,
        pub active_valves: usize,
    }
}
