//! Outcome of a fill: handled items and non-fatal errors

use log::debug;
use serde::Serialize;
use thiserror::Error;

use crate::content::{ContentItem, ContentKind};
use crate::ooxml::OoxmlError;

/// A problem found while filling. Never aborts the fill.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Error)]
pub enum FillError {
    /// No control carries the item's name in the current scope
    #[error("{kind} Content Control '{name}' not found.")]
    ControlNotFound { kind: ContentKind, name: String },

    /// The control was found but its structure does not fit the item
    #[error("{kind} Content Control '{name}' {message}.")]
    CustomItem {
        kind: ContentKind,
        name: String,
        message: String,
    },

    #[error("{0}")]
    Custom(String),
}

impl FillError {
    pub fn not_found(item: &ContentItem) -> Self {
        FillError::ControlNotFound {
            kind: item.kind(),
            name: item.name().to_string(),
        }
    }

    pub fn custom_item(item: &ContentItem, message: impl Into<String>) -> Self {
        FillError::CustomItem {
            kind: item.kind(),
            name: item.name().to_string(),
            message: message.into(),
        }
    }

    pub fn message(&self) -> String {
        self.to_string()
    }
}

/// An item a processor consumed
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct HandledItem {
    pub kind: ContentKind,
    pub name: String,
}

impl From<&ContentItem> for HandledItem {
    fn from(item: &ContentItem) -> Self {
        HandledItem {
            kind: item.kind(),
            name: item.name().to_string(),
        }
    }
}

/// Accumulated outcome of one or more fill passes
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProcessResult {
    handled: Vec<HandledItem>,
    errors: Vec<FillError>,
}

#[derive(Serialize)]
struct Report<'a> {
    success: bool,
    handled: &'a [HandledItem],
    errors: Vec<String>,
}

impl ProcessResult {
    /// Nothing handled, no errors
    pub fn not_handled() -> Self {
        ProcessResult::default()
    }

    pub fn add_error(&mut self, error: FillError) {
        if !self.errors.contains(&error) {
            debug!("fill error: {}", error);
            self.errors.push(error);
        }
    }

    pub fn add_item_to_handled(&mut self, item: &ContentItem) {
        let handled = HandledItem::from(item);
        if !self.handled.contains(&handled) {
            self.handled.push(handled);
        }
    }

    /// Fold another result into this one, keeping both de-duplicated
    pub fn merge(&mut self, other: ProcessResult) {
        for item in other.handled {
            if !self.handled.contains(&item) {
                self.handled.push(item);
            }
        }
        for error in other.errors {
            self.add_error(error);
        }
    }

    /// True when no error was recorded
    pub fn success(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn handled(&self) -> &[HandledItem] {
        &self.handled
    }

    pub fn has_handled(&self) -> bool {
        !self.handled.is_empty()
    }

    pub fn is_handled(&self, name: &str) -> bool {
        self.handled.iter().any(|item| item.name == name)
    }

    pub fn errors(&self) -> &[FillError] {
        &self.errors
    }

    /// JSON report with handled items and error messages
    pub fn to_json(&self) -> Result<String, OoxmlError> {
        let report = Report {
            success: self.success(),
            handled: &self.handled,
            errors: self.errors.iter().map(FillError::message).collect(),
        };
        serde_json::to_string(&report).map_err(|e| OoxmlError::ParseError(e.to_string()))
    }
}
