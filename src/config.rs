use std::env;
use std::fmt::Display;
use std::str::FromStr;

use crate::errors::BackendError;

/// Returns the value of the named environment variable, or `default`
/// if it isn't set.
pub fn get_variable_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_owned())
}

/// Parses the named environment variable, falling back to `default`
/// if it isn't set. Panics if the value is present but invalid.
pub fn parse_variable_or<T>(name: &str, default: T) -> T
where
    T: FromStr,
    T::Err: Display,
{
    match env::var(name) {
        Ok(value) => value
            .parse()
            .unwrap_or_else(|e| panic!("parse {} ({:?}): {}", name, value, e)),
        Err(_) => default,
    }
}

/// Returns the value of the named environment variable, or a
/// configuration error naming it.
pub fn require_variable(name: &str) -> Result<String, BackendError> {
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(BackendError::Configuration(format!("{} is not set", name))),
    }
}

/// Which backing medium holds feedback.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum StoreKind {
    Memory,
    File,
    Remote,
}

impl FromStr for StoreKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(StoreKind::Memory),
            "file" | "json" => Ok(StoreKind::File),
            "remote" | "s3" => Ok(StoreKind::Remote),
            other => Err(format!("unknown store kind {:?}; expected memory, file or remote", other)),
        }
    }
}
