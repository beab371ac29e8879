use serde::{Deserialize, Serialize};

/// The api version, bumped on breaking changes to the wire format.
pub const VERSION: &str = "1.0";

/// The `error` text of a `/download` call without a file or url.
pub const NO_INPUT: &str = "No input provided";

/// Describes the json response format for `/download` once the tool was started.
///
/// # Serialized Example
/// ```
/// # let ser = r#"
/// {
///     "status": "error",
///     "error": "bad format"
/// }
/// # "#;
/// # let deser: ytrelay_api::api::DownloadResponse
/// #    = serde_json::from_str(ser).expect("failed parsing");
/// # assert!(matches!(deser, ytrelay_api::api::DownloadResponse::Error { .. }));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum DownloadResponse {
    /// The tool exited with code 0.
    Success {
        /// Everything the tool wrote to stdout.
        output: String,
    },
    /// The tool exited unsuccessfully or could not be run at all.
    Error {
        /// The tool's stderr, or its stdout if stderr was empty.
        error: String,
    },
}

/// Response body for rejected submissions, e.g. neither a file nor a url.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn success_is_tagged_lowercase() {
        let value = serde_json::to_value(DownloadResponse::Success {
            output: String::from("done"),
        })
        .unwrap();
        assert_eq!(value, json!({ "status": "success", "output": "done" }));
    }

    #[test]
    fn error_response_has_no_status() {
        let value = serde_json::to_value(ErrorResponse {
            error: String::from(NO_INPUT),
        })
        .unwrap();
        assert_eq!(value, json!({ "error": "No input provided" }));
    }
}
