//! Cell output types.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Mime type to payload mapping (`text/plain`, `text/html`, `image/png`, ...).
pub type MimeBundle = Map<String, Value>;

/// Stream channel of a `stream` output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamName {
    Stdout,
    Stderr,
}

impl StreamName {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stdout => "stdout",
            Self::Stderr => "stderr",
        }
    }
}

/// A single cell output, tagged by `output_type` as in nbformat 4.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "output_type", rename_all = "snake_case")]
pub enum Output {
    /// Text written to stdout or stderr
    Stream {
        name: StreamName,
        #[serde(with = "crate::notebook::multiline")]
        text: String,
    },

    /// Value of the last expression in a cell
    ExecuteResult {
        execution_count: Option<u32>,
        data: MimeBundle,
        #[serde(default)]
        metadata: Map<String, Value>,
    },

    /// Rich output produced by a display call
    DisplayData {
        data: MimeBundle,
        #[serde(default)]
        metadata: Map<String, Value>,
    },

    /// An exception raised by the cell
    Error {
        ename: String,
        evalue: String,
        #[serde(default)]
        traceback: Vec<String>,
    },
}

impl Output {
    /// Create a stream output.
    pub fn stream(name: StreamName, text: impl Into<String>) -> Self {
        Self::Stream {
            name,
            text: text.into(),
        }
    }

    /// Create an `execute_result` carrying only a `text/plain` representation.
    pub fn execute_result(execution_count: u32, text_plain: impl Into<String>) -> Self {
        let mut data = MimeBundle::new();
        data.insert("text/plain".to_string(), Value::String(text_plain.into()));
        Self::ExecuteResult {
            execution_count: Some(execution_count),
            data,
            metadata: Map::new(),
        }
    }

    /// Create an error output.
    pub fn error(
        ename: impl Into<String>,
        evalue: impl Into<String>,
        traceback: Vec<String>,
    ) -> Self {
        Self::Error {
            ename: ename.into(),
            evalue: evalue.into(),
            traceback,
        }
    }

    /// The nbformat `output_type` name of this output.
    pub fn output_type(&self) -> &'static str {
        match self {
            Self::Stream { .. } => "stream",
            Self::ExecuteResult { .. } => "execute_result",
            Self::DisplayData { .. } => "display_data",
            Self::Error { .. } => "error",
        }
    }

    /// The mime bundle of a result or display output.
    pub fn data(&self) -> Option<&MimeBundle> {
        match self {
            Self::ExecuteResult { data, .. } | Self::DisplayData { data, .. } => Some(data),
            _ => None,
        }
    }
}

/// Read a textual mime entry, which nbformat stores either as one string or
/// as a list of line strings.
pub fn mime_text(bundle: &MimeBundle, mime: &str) -> Option<String> {
    match bundle.get(mime)? {
        Value::String(s) => Some(s.clone()),
        Value::Array(lines) => Some(
            lines
                .iter()
                .filter_map(|l| l.as_str())
                .collect::<Vec<_>>()
                .concat(),
        ),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn deserializes_stream_with_line_list() {
        let json = r#"{"output_type": "stream", "name": "stdout", "text": ["a\n", "b\n"]}"#;
        let output: Output = serde_json::from_str(json).unwrap();

        assert_eq!(output, Output::stream(StreamName::Stdout, "a\nb\n"));
    }

    #[test]
    fn serializes_execute_result_in_nbformat_shape() {
        let output = Output::execute_result(3, "2");
        let value = serde_json::to_value(&output).unwrap();

        assert_eq!(value["output_type"], "execute_result");
        assert_eq!(value["execution_count"], 3);
        assert_eq!(value["data"]["text/plain"], "2");
    }

    #[test]
    fn reads_mime_text_from_lines() {
        let json = r#"{"output_type": "display_data", "data": {"text/html": ["<b>", "x</b>"]}, "metadata": {}}"#;
        let output: Output = serde_json::from_str(json).unwrap();

        let data = output.data().unwrap();
        assert_eq!(mime_text(data, "text/html").as_deref(), Some("<b>x</b>"));
        assert_eq!(mime_text(data, "text/plain"), None);
    }

    #[test]
    fn error_output_keeps_traceback() {
        let json = r#"{"output_type": "error", "ename": "ValueError", "evalue": "bad", "traceback": ["line 1"]}"#;
        let output: Output = serde_json::from_str(json).unwrap();

        assert_eq!(output.output_type(), "error");
        assert_eq!(
            output,
            Output::error("ValueError", "bad", vec!["line 1".to_string()])
        );
    }
}
