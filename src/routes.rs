use std::sync::Arc;

use log::{error, info, Logger};
use warp::http::StatusCode;
use warp::reject;
use warp::reply::{json, with_status, Json, WithStatus};

use crate::errors::BackendError;

pub mod admin;
mod assets;
mod handlers;
mod rejection;

pub use internal::*;

/// The largest feedback submission accepted, in bytes. The longest
/// valid message is 2000 characters, which fits comfortably.
const MAX_CONTENT_LENGTH: u64 = 16 * 1024;

/// The path segment that holds the feedback API.
const API_PATH: &str = "api";

pub async fn format_rejection(
    logger: Arc<Logger>,
    rej: reject::Rejection,
) -> Result<WithStatus<Json>, reject::Rejection> {
    if let Some(r) = rej.find::<rejection::Rejection>() {
        let e = &r.error;
        let status = status_code_for(e);

        if status.is_server_error() {
            error!(logger, "Backend error"; "context" => ?r.context, "error" => ?r.error, "status" => %status, "message" => %r.error);
        } else {
            info!(logger, "Request rejected"; "context" => ?r.context, "status" => %status, "message" => %r.error);
        }

        let flattened = r.flatten();

        return Ok(with_status(json(&flattened), status));
    }

    Err(rej)
}

fn status_code_for(e: &BackendError) -> StatusCode {
    use BackendError::*;

    match e {
        Validation { .. } | MalformedSubmission { .. } => StatusCode::BAD_REQUEST,
        Forbidden => StatusCode::FORBIDDEN,
        NotFound => StatusCode::NOT_FOUND,
        Configuration(..) => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

mod internal {
    use warp::filters::BoxedFilter;
    use warp::path::{end, peek, tail, Peek};
    use warp::reject;
    use warp::Filter;
    use warp::Reply;
    use warp::{body, get as g, path as p, post};

    use super::{handlers, API_PATH, MAX_CONTENT_LENGTH};
    use crate::environment::Environment;

    type Route = BoxedFilter<(Box<dyn Reply>,)>;

    /// Matches any path outside the API.
    fn outside_api() -> BoxedFilter<()> {
        peek()
            .and_then(|peek: Peek| async move {
                match peek.segments().next() {
                    Some(API_PATH) => Err(reject::not_found()),
                    _ => Ok(()),
                }
            })
            .untuple_one()
            .boxed()
    }

    /// Matches either spelling of the feedback collection.
    fn collection() -> BoxedFilter<()> {
        p(API_PATH)
            .and(p("feedbacks").or(p("feedback")).unify())
            .boxed()
    }

    macro_rules! route_filter {
    ($route_variable:ident; $first:expr) => (let $route_variable = $route_variable.and($first););
    ($route_variable:ident; $first:expr, $($rest:expr),+) => (
        let $route_variable = $route_variable.and($first);
        route_filter!($route_variable; $($rest),+);
    )
}

    macro_rules! route {
    ($name:ident => $handler:ident, $route_variable:ident; $($filters:expr),+) => (
        pub fn $name(environment: Environment) -> Route {
            let $route_variable = warp::any()
                .map(move || environment.clone());

            route_filter!($route_variable; $($filters),+);

            $route_variable.and_then(handlers::$handler)
                .boxed()
        }
    );
}

    route!(make_list_route => list, rt; collection(), end(), g());
    route!(make_submit_route => submit, rt; collection(), end(), post(), body::content_length_limit(MAX_CONTENT_LENGTH), body::bytes());
    route!(make_assets_route => asset, rt; g(), outside_api(), tail());

    /// Assembles every public route, with rejections rendered as JSON.
    pub fn make_routes(environment: Environment) -> BoxedFilter<(Box<dyn Reply>,)> {
        let logger = environment.logger.clone();

        make_list_route(environment.clone())
            .or(make_submit_route(environment.clone()))
            .unify()
            .or(make_assets_route(environment))
            .unify()
            .recover(move |r| super::format_rejection(logger.clone(), r))
            .map(|reply| Box::new(reply) as Box<dyn Reply>)
            .boxed()
    }
}
