use serde::Serialize;
use warp::reject;

use crate::errors::BackendError;

#[derive(Debug)]
pub struct Rejection {
    pub(crate) context: Context,
    pub(crate) error: BackendError,
}

impl Rejection {
    pub fn new(context: Context, error: BackendError) -> Self {
        Rejection { context, error }
    }

    pub fn flatten(&self) -> FlattenedRejection {
        let field = match &self.error {
            BackendError::Validation { field, .. } => Some(*field),
            _ => None,
        };

        FlattenedRejection {
            context: self.context.clone(),
            message: format!("{}", self.error),
            field,
        }
    }
}

impl reject::Reject for Rejection {}

#[derive(Debug, Serialize)]
pub struct FlattenedRejection {
    #[serde(flatten)]
    pub(crate) context: Context,
    pub(crate) message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) field: Option<&'static str>,
}

/// The operation that failed, reported alongside the message.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "operation", rename_all = "snake_case")]
pub enum Context {
    Asset { path: String },
    List,
    Submit,
}

impl Context {
    pub fn asset(path: String) -> Context {
        Context::Asset { path }
    }

    pub fn list() -> Context {
        Context::List
    }

    pub fn submit() -> Context {
        Context::Submit
    }
}
