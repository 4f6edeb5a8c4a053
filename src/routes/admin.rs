use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt};
use serde::Serialize;
use warp::http::StatusCode;
use warp::reject;
use warp::reply::{json, Reply};
use warp::Filter;

use crate::environment::Environment;

#[derive(Debug, Serialize)]
struct Healthz<'a> {
    revision: Option<&'a str>,
    timestamp: Option<&'a str>,
    version: &'a str,
}

pub fn make_healthz_route<'a>(
    _environment: Environment,
) -> impl warp::Filter<Extract = (impl Reply,), Error = reject::Rejection> + Clone + 'a {
    warp::path("healthz").and(warp::get()).map(move || {
        json(&Healthz {
            revision: info::REVISION,
            timestamp: info::BUILD_TIMESTAMP,
            version: info::VERSION,
        })
    })
}

type TerminationFuture<'a> = BoxFuture<'a, ()>;

pub type TerminationFunctionWrapper<'a> =
    Arc<dyn Fn() -> TerminationFuture<'a> + Send + Sync + 'a>;

pub fn make_termination_route<'a>(
    _environment: Environment,
    terminate: TerminationFunctionWrapper<'a>,
) -> impl warp::Filter<Extract = (impl Reply,), Error = reject::Rejection> + Clone + 'a {
    let terminate = terminate.clone();

    let handler = move || -> BoxFuture<Result<StatusCode, std::convert::Infallible>> {
        let terminate = terminate.clone();

        async move {
            let future = terminate();
            future.await;
            Ok(StatusCode::NO_CONTENT)
        }
        .boxed()
    };

    warp::path("terminate").and(warp::post()).and_then(handler)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    use futures::future::FutureExt;
    use time::macros::offset;

    use super::{make_healthz_route, make_termination_route, TerminationFunctionWrapper};
    use crate::environment::{Config, Environment};
    use crate::store::MemoryStore;

    fn environment() -> Environment {
        Environment::new(
            Arc::new(log::discard_logger()),
            Arc::new(MemoryStore::new()),
            Config::new(offset!(+7), "public"),
        )
    }

    #[tokio::test]
    async fn healthz_reports_the_version() {
        let response = warp::test::request()
            .path("/healthz")
            .method("GET")
            .reply(&make_healthz_route(environment()))
            .await;

        assert_eq!(response.status(), 200);

        let body: serde_json::Value = serde_json::from_slice(response.body()).expect("parse body");
        assert_eq!(body["version"], info::VERSION);
    }

    #[tokio::test]
    async fn termination_calls_the_terminator() {
        let called = Arc::new(AtomicBool::new(false));
        let flag = called.clone();

        let terminate: TerminationFunctionWrapper<'static> = Arc::new(move || {
            let flag = flag.clone();
            async move {
                flag.store(true, Ordering::SeqCst);
            }
            .boxed()
        });

        let response = warp::test::request()
            .path("/terminate")
            .method("POST")
            .reply(&make_termination_route(environment(), terminate))
            .await;

        assert_eq!(response.status(), 204);
        assert!(called.load(Ordering::SeqCst));
    }
}
