use serde::{Deserialize, Serialize};
use time::format_description::FormatItem;
use time::macros::format_description;
use time::{OffsetDateTime, UtcOffset};

use crate::errors::BackendError;
use crate::id;
use crate::normalization::{self, char_length};

/// How `recorded_at` is rendered for display.
const DISPLAY_FORMAT: &[FormatItem<'static>] =
    format_description!("[day]/[month]/[year] [hour]:[minute]");

/// Length bounds for a single submitted field, in characters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
    pub min: usize,
    pub max: usize,
}

pub const NAME_BOUNDS: Bounds = Bounds { min: 3, max: 120 };
pub const UNIT_BOUNDS: Bounds = Bounds { min: 3, max: 120 };
pub const MESSAGE_BOUNDS: Bounds = Bounds { min: 10, max: 2000 };

/// A single feedback entry as stored and returned to clients.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackRecord {
    /// The opaque ID assigned at creation.
    id: String,

    /// The name of the person submitting.
    name: String,

    /// The organizational unit the person belongs to.
    unit: String,

    /// The feedback itself.
    message: String,

    /// When the record was created. Older data may only carry
    /// `recorded_at`.
    #[serde(
        default,
        with = "time::serde::rfc3339::option",
        skip_serializing_if = "Option::is_none"
    )]
    created_at: Option<OffsetDateTime>,

    /// The creation time pre-formatted for display.
    #[serde(default)]
    recorded_at: String,
}

impl FeedbackRecord {
    /// Builds the record for a validated submission, assigning its ID
    /// and timestamps.
    pub fn create(submission: ValidSubmission, now: OffsetDateTime, display_offset: UtcOffset) -> Self {
        let ValidSubmission { name, unit, message } = submission;

        FeedbackRecord {
            id: id::generate(now),
            name,
            unit,
            message,
            created_at: Some(now),
            recorded_at: format_for_display(now, display_offset),
        }
    }

    /// Reassembles a record from stored parts.
    pub fn from_parts(
        id: String,
        name: String,
        unit: String,
        message: String,
        created_at: Option<OffsetDateTime>,
        recorded_at: String,
    ) -> Self {
        FeedbackRecord {
            id,
            name,
            unit,
            message,
            created_at,
            recorded_at,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn unit(&self) -> &str {
        &self.unit
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn created_at(&self) -> Option<OffsetDateTime> {
        self.created_at
    }

    pub fn recorded_at(&self) -> &str {
        &self.recorded_at
    }
}

/// The request body for a new feedback entry. Every field is
/// normalized as it's deserialized; missing fields become empty.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct FeedbackSubmission {
    #[serde(default, deserialize_with = "normalization::deserialize")]
    pub(crate) name: String,

    #[serde(default, deserialize_with = "normalization::deserialize")]
    pub(crate) unit: String,

    #[serde(default, deserialize_with = "normalization::deserialize")]
    pub(crate) message: String,
}

impl FeedbackSubmission {
    pub fn new(name: impl AsRef<str>, unit: impl AsRef<str>, message: impl AsRef<str>) -> Self {
        use normalization::normalize_text;

        FeedbackSubmission {
            name: normalize_text(name),
            unit: normalize_text(unit),
            message: normalize_text(message),
        }
    }

    /// Checks the fields against their bounds in the order name, unit,
    /// message and reports the first violation.
    pub fn validate(self) -> Result<ValidSubmission, BackendError> {
        check("name", &self.name, NAME_BOUNDS)?;
        check("unit", &self.unit, UNIT_BOUNDS)?;
        check("message", &self.message, MESSAGE_BOUNDS)?;

        Ok(ValidSubmission {
            name: self.name,
            unit: self.unit,
            message: self.message,
        })
    }
}

/// A submission whose fields are known to be within bounds.
#[derive(Clone, Debug, PartialEq)]
pub struct ValidSubmission {
    name: String,
    unit: String,
    message: String,
}

fn check(field: &'static str, value: &str, bounds: Bounds) -> Result<(), BackendError> {
    let length = char_length(value);

    if length < bounds.min || length > bounds.max {
        return Err(BackendError::Validation {
            field,
            min: bounds.min,
            max: bounds.max,
        });
    }

    Ok(())
}

/// Renders an instant as `DD/MM/YYYY HH:MM` in the given offset.
pub fn format_for_display(instant: OffsetDateTime, offset: UtcOffset) -> String {
    instant
        .to_offset(offset)
        .format(DISPLAY_FORMAT)
        .unwrap_or_default()
}
