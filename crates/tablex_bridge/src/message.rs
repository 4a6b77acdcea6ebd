//! Request/response protocol between the page side and the front end.
//!
//! Requests are JSON objects tagged by `action`. No error crosses this
//! boundary as anything but a `{"success": false, "error": ...}` reply or the
//! `{"result": null}` sentinel.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tablex_core::{ExportError, ExportFormat};
use tablex_docs::TableGrid;
use tablex_scan::{InlineControl, TableSummary};

/// An inbound message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Request {
    /// Summarize every table on the page.
    DetectTables,
    /// Extract one table's cell text.
    ProcessTable {
        #[serde(rename = "tableIndex", alias = "index")]
        index: usize,
        #[serde(default)]
        format: ExportFormat,
    },
    /// Turn the inline export controls on or off.
    ToggleInlineButtons { enabled: bool },
    /// Serialize and save an already-extracted grid.
    ExportTable {
        data: TableGrid,
        title: String,
        format: ExportFormat,
    },
}

impl Request {
    /// Parse one JSON request.
    ///
    /// An unknown `format` string is reported as [`ExportError::UnsupportedFormat`];
    /// anything else that does not fit the protocol is an
    /// [`ExportError::InvalidRequest`].
    pub fn parse(input: &str) -> Result<Self, ExportError> {
        let value: Value = serde_json::from_str(input)
            .map_err(|e| ExportError::InvalidRequest(e.to_string()))?;

        if let Some(format) = value.get("format").and_then(Value::as_str)
            && format.parse::<ExportFormat>().is_err()
        {
            return Err(ExportError::UnsupportedFormat(format.to_string()));
        }

        serde_json::from_value(value).map_err(|e| ExportError::InvalidRequest(e.to_string()))
    }

    pub fn action(&self) -> &'static str {
        match self {
            Self::DetectTables => "detectTables",
            Self::ProcessTable { .. } => "processTable",
            Self::ToggleInlineButtons { .. } => "toggleInlineButtons",
            Self::ExportTable { .. } => "exportTable",
        }
    }
}

/// Payload of a successful `processTable`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessedTable {
    pub data: TableGrid,
    pub title: String,
    pub format: ExportFormat,
}

/// An outbound reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Response {
    Tables {
        tables: Vec<TableSummary>,
        #[serde(
            rename = "inlineControls",
            default,
            skip_serializing_if = "Vec::is_empty"
        )]
        inline_controls: Vec<InlineControl>,
    },
    Status {
        success: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
    /// `result` is `None` when the table could not be found or read.
    Processed { result: Option<ProcessedTable> },
}

impl Response {
    pub fn ok() -> Self {
        Self::Status {
            success: true,
            error: None,
        }
    }

    pub fn failure(error: &ExportError) -> Self {
        Self::Status {
            success: false,
            error: Some(error.to_string()),
        }
    }

    /// Reply to input that [`Request::parse`] refused. A `processTable`
    /// whose index cannot be read is a not-found table, answered with the
    /// `null` sentinel; everything else is a failure status.
    pub fn rejected(input: &str, error: &ExportError) -> Self {
        let is_process_table = serde_json::from_str::<Value>(input)
            .ok()
            .and_then(|v| v.get("action").and_then(Value::as_str).map(|a| a == "processTable"))
            .unwrap_or(false);

        if is_process_table && matches!(error, ExportError::InvalidRequest(_)) {
            Self::Processed { result: None }
        } else {
            Self::failure(error)
        }
    }

    pub fn is_success(&self) -> bool {
        match self {
            Self::Tables { .. } => true,
            Self::Status { success, .. } => *success,
            Self::Processed { result } => result.is_some(),
        }
    }

    /// Serialize for the wire. Falls back to a hand-built failure object so
    /// a reply is always produced.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| {
            serde_json::json!({ "success": false, "error": e.to_string() }).to_string()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_detect() {
        assert_eq!(
            Request::parse(r#"{"action":"detectTables"}"#).unwrap(),
            Request::DetectTables
        );
    }

    #[test]
    fn test_parse_process_table_accepts_both_index_names() {
        let a = Request::parse(r#"{"action":"processTable","tableIndex":2,"format":"csv"}"#).unwrap();
        let b = Request::parse(r#"{"action":"processTable","index":2,"format":"csv"}"#).unwrap();
        let expected = Request::ProcessTable {
            index: 2,
            format: ExportFormat::Csv,
        };
        assert_eq!(a, expected);
        assert_eq!(b, expected);
    }

    #[test]
    fn test_parse_toggle() {
        let req = Request::parse(r#"{"action":"toggleInlineButtons","enabled":true}"#).unwrap();
        assert_eq!(req, Request::ToggleInlineButtons { enabled: true });
        assert_eq!(req.action(), "toggleInlineButtons");
    }

    #[test]
    fn test_parse_export_table() {
        let req = Request::parse(
            r#"{"action":"exportTable","data":[["a","b"]],"title":"T","format":"excel"}"#,
        )
        .unwrap();
        match req {
            Request::ExportTable { data, title, format } => {
                assert_eq!(data, TableGrid::from_rows([["a", "b"]]));
                assert_eq!(title, "T");
                assert_eq!(format, ExportFormat::Excel);
            }
            other => panic!("unexpected request: {other:?}"),
        }
    }

    #[test]
    fn test_unsupported_format() {
        let err = Request::parse(r#"{"action":"processTable","tableIndex":0,"format":"pdf"}"#)
            .unwrap_err();
        assert!(matches!(err, ExportError::UnsupportedFormat(f) if f == "pdf"));
    }

    #[test]
    fn test_unknown_action_and_garbage() {
        assert!(matches!(
            Request::parse(r#"{"action":"launchRockets"}"#),
            Err(ExportError::InvalidRequest(_))
        ));
        assert!(matches!(
            Request::parse("not json"),
            Err(ExportError::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_unreadable_table_index_is_not_found() {
        for input in [
            r#"{"action":"processTable","tableIndex":-1,"format":"csv"}"#,
            r#"{"action":"processTable","tableIndex":1.5,"format":"csv"}"#,
            r#"{"action":"processTable","format":"csv"}"#,
        ] {
            let err = Request::parse(input).unwrap_err();
            assert_eq!(Response::rejected(input, &err).to_json(), r#"{"result":null}"#);
        }
    }

    #[test]
    fn test_other_rejections_are_failures() {
        let input = r#"{"action":"processTable","tableIndex":0,"format":"pdf"}"#;
        let err = Request::parse(input).unwrap_err();
        assert!(!Response::rejected(input, &err).is_success());
        assert_eq!(
            Response::rejected("nonsense", &ExportError::InvalidRequest("x".into())).to_json(),
            r#"{"success":false,"error":"Invalid request: x"}"#
        );
    }

    #[test]
    fn test_status_wire_shape() {
        assert_eq!(Response::ok().to_json(), r#"{"success":true}"#);
        let failure = Response::failure(&ExportError::Save("denied".into()));
        assert_eq!(
            failure.to_json(),
            r#"{"success":false,"error":"Save failed: denied"}"#
        );
        assert!(!failure.is_success());
    }

    #[test]
    fn test_not_found_sentinel_is_null() {
        let resp = Response::Processed { result: None };
        assert_eq!(resp.to_json(), r#"{"result":null}"#);
        assert!(!resp.is_success());
    }

    #[test]
    fn test_tables_omit_empty_inline_controls() {
        let resp = Response::Tables {
            tables: vec![],
            inline_controls: vec![],
        };
        assert_eq!(resp.to_json(), r#"{"tables":[]}"#);
    }
}
