use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt};
use futures::TryStreamExt;
use log::{debug, error, warn, Logger};
use rusoto_s3::{GetObjectRequest, ListObjectsV2Request, PutObjectRequest, S3Client, StreamingBody, S3};

use crate::errors::{BackendError, StoreError};
use crate::record::FeedbackRecord;
use crate::store::{sort_newest_first, Store};

const DEFAULT_PREFIX: &str = "feedback/";
const CONTENT_TYPE: &str = "application/json";

/// A store that saves each record as its own JSON document in an
/// S3-compatible bucket.
pub struct S3Store {
    logger: Arc<Logger>,
    client: Arc<S3Client>,
    bucket: String,
    prefix: String,
}

impl S3Store {
    /// Creates a new instance.
    pub fn new(logger: Arc<Logger>, client: Arc<S3Client>, bucket: String, prefix: String) -> Self {
        Self {
            logger,
            client,
            bucket,
            prefix,
        }
    }

    /// Creates an instance from `S3_*` environment variables, returning
    /// a configuration error naming the first one that's missing.
    pub fn from_env(logger: Arc<Logger>) -> Result<Self, BackendError> {
        use rusoto_core::request::HttpClient;
        use rusoto_core::Region;
        use rusoto_credential::StaticProvider;

        use crate::config::{get_variable_or, require_variable};

        let access_key = require_variable("S3_ACCESS_KEY")?;
        let secret_access_key = require_variable("S3_SECRET_ACCESS_KEY")?;

        let region = Region::Custom {
            name: require_variable("S3_REGION_NAME")?,
            endpoint: require_variable("S3_ENDPOINT")?,
        };

        let bucket = require_variable("S3_BUCKET_NAME")?;
        let prefix = get_variable_or("FEEDBACK_S3_PREFIX", DEFAULT_PREFIX);

        let http_client = HttpClient::new().map_err(|e| {
            BackendError::Configuration(format!("could not create HTTP client: {}", e))
        })?;

        let client = Arc::new(S3Client::new_with(
            http_client,
            StaticProvider::new_minimal(access_key, secret_access_key),
            region,
        ));

        Ok(S3Store::new(logger, client, bucket, prefix))
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    fn key_for(&self, record: &FeedbackRecord) -> String {
        document_key(&self.prefix, record.id())
    }
}

impl Store for S3Store {
    fn list(&self) -> BoxFuture<Result<Vec<FeedbackRecord>, BackendError>> {
        list(self).boxed()
    }

    fn append(&self, record: FeedbackRecord) -> BoxFuture<Result<(), BackendError>> {
        upload(self, record).boxed()
    }
}

fn document_key(prefix: &str, id: &str) -> String {
    format!("{}{}.json", prefix, id)
}

async fn list(store: &S3Store) -> Result<Vec<FeedbackRecord>, BackendError> {
    let keys = match list_keys(store).await {
        Ok(keys) => keys,
        Err(e) => {
            error!(store.logger, "Could not list feedback documents"; "bucket" => &store.bucket, "error" => %e, "details" => ?e);
            return Ok(vec![]);
        }
    };

    debug!(store.logger, "Downloading feedback documents..."; "count" => keys.len());

    let mut records = Vec::with_capacity(keys.len());

    for key in keys {
        match download(store, &key).await {
            Ok(record) => records.push(record),
            Err(e) => {
                warn!(store.logger, "Skipping unreadable feedback document"; "key" => &key, "error" => %e);
            }
        }
    }

    sort_newest_first(&mut records);

    Ok(records)
}

async fn list_keys(store: &S3Store) -> Result<Vec<String>, StoreError> {
    let mut keys = vec![];
    let mut continuation_token = None;

    loop {
        let request = ListObjectsV2Request {
            bucket: store.bucket.clone(),
            prefix: Some(store.prefix.clone()),
            continuation_token: continuation_token.take(),
            ..Default::default()
        };

        let output = store
            .client
            .list_objects_v2(request)
            .await
            .map_err(|source| StoreError::ListError { source })?;

        keys.extend(
            output
                .contents
                .unwrap_or_default()
                .into_iter()
                .filter_map(|object| object.key)
                .filter(|key| key.ends_with(".json")),
        );

        match output.next_continuation_token {
            Some(token) if output.is_truncated.unwrap_or(false) => continuation_token = Some(token),
            _ => break,
        }
    }

    Ok(keys)
}

async fn download(store: &S3Store, key: &str) -> Result<FeedbackRecord, StoreError> {
    let request = GetObjectRequest {
        bucket: store.bucket.clone(),
        key: key.to_owned(),
        ..Default::default()
    };

    let output = store
        .client
        .get_object(request)
        .await
        .map_err(|source| StoreError::DownloadError { source })?;

    let body = output.body.ok_or(StoreError::EmptyDocument)?;
    let raw = body
        .map_ok(|chunk| chunk.to_vec())
        .try_concat()
        .await
        .map_err(|source| StoreError::ReadError { source })?;

    serde_json::from_slice(&raw).map_err(|source| StoreError::ContentParsingError { source })
}

async fn upload(store: &S3Store, record: FeedbackRecord) -> Result<(), BackendError> {
    use std::convert::TryFrom;

    let raw = serde_json::to_vec(&record).map_err(|source| BackendError::Encoding { source })?;
    let len = i64::try_from(raw.len()).ok();

    let request = PutObjectRequest {
        body: Some(StreamingBody::from(raw)),
        bucket: store.bucket.clone(),
        content_length: len,
        content_type: Some(CONTENT_TYPE.to_owned()),
        key: store.key_for(&record),
        ..Default::default()
    };

    let result = store.client.put_object(request).await;

    match result {
        Ok(_) => Ok(()),
        Err(e) => Err(BackendError::UploadFailed { source: e }),
    }
}
