//! Fill options

use serde::{Deserialize, Serialize};

use crate::ooxml::OoxmlError;

/// Switches that change what a fill leaves behind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FillOptions {
    /// Unwrap every filled content control, keeping only its content
    pub remove_content_controls: bool,
    /// Prepend one highlighted paragraph per fill error to the body
    pub notice_about_errors: bool,
}

impl Default for FillOptions {
    fn default() -> Self {
        FillOptions {
            remove_content_controls: false,
            notice_about_errors: true,
        }
    }
}

impl FillOptions {
    pub fn from_json(json: &str) -> Result<Self, OoxmlError> {
        serde_json::from_str(json).map_err(|e| OoxmlError::Config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = FillOptions::default();
        assert!(!options.remove_content_controls);
        assert!(options.notice_about_errors);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let options = FillOptions::from_json(r#"{"remove_content_controls": true}"#).unwrap();
        assert!(options.remove_content_controls);
        assert!(options.notice_about_errors);
        assert!(FillOptions::from_json("[]").is_err());
    }
}
