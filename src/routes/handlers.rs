use std::time::{Duration, Instant};

use bytes::Bytes;
use log::{debug, o};
use time::OffsetDateTime;
use warp::{
    http::StatusCode,
    path::Tail,
    reject,
    reply::{json, with_header, with_status, Reply},
};

use crate::environment::Environment;
use crate::errors::BackendError;
use crate::record::{FeedbackRecord, FeedbackSubmission};
use crate::routes::{
    assets,
    rejection::{Context, Rejection},
    API_PATH,
};

const SERVER_TIMING_HEADER: &str = "server-timing";
type RouteResult = Result<Box<dyn Reply>, reject::Rejection>;

macro_rules! timed {
    ($($expression:stmt);+) => {
        let start = Instant::now();

        let result = { $($expression)+ };

        Ok(Box::new(with_header(
            result,
            SERVER_TIMING_HEADER,
            format_server_timing(start.elapsed()),
        )) as Box<dyn Reply>)
    };
}

pub async fn list(environment: Environment) -> RouteResult {
    timed! {
        let records = environment
            .store
            .list()
            .await
            .map_err(|e: BackendError| Rejection::new(Context::list(), e))?;

        debug!(environment.logger, "Listing feedback..."; "count" => records.len());

        json(&records)
    }
}

pub async fn submit(environment: Environment, body: Bytes) -> RouteResult {
    timed! {
        let Environment { logger, store, config } = environment;

        let error_handler = |e: BackendError| Rejection::new(Context::submit(), e);

        debug!(logger, "Parsing submission...");
        let submission: FeedbackSubmission = serde_json::from_slice(&body)
            .map_err(|source| BackendError::MalformedSubmission { source })
            .map_err(error_handler)?;

        debug!(logger, "Validating submission...");
        let valid = submission.validate().map_err(error_handler)?;

        let record = FeedbackRecord::create(valid, OffsetDateTime::now_utc(), config.display_offset);
        let logger = logger.new(o!("id" => record.id().to_owned()));

        debug!(logger, "Saving feedback...");
        store.append(record.clone()).await.map_err(error_handler)?;

        debug!(logger, "Sending response...");
        with_header(
            with_status(json(&record), StatusCode::CREATED),
            "location",
            format!("/{}/feedbacks", API_PATH),
        )
    }
}

pub async fn asset(environment: Environment, path: Tail) -> RouteResult {
    timed! {
        let requested = path.as_str().to_owned();
        let error_handler = |e: BackendError| Rejection::new(Context::asset(requested.clone()), e);

        let (contents, mime_type) = assets::load(environment.config.site_root(), &requested)
            .await
            .map_err(error_handler)?;

        with_header(contents, "content-type", mime_type.as_ref())
    }
}

fn format_server_timing(seconds: Duration) -> String {
    format!("handler;dur={}", seconds.as_secs_f64() * 1000.0)
}
