//! Uniform error surfaced by the table manager.
//!
//! Fetch functions fail with whatever `color_eyre::Report` they like; the
//! manager normalizes that into a [`TableError`] before handing it to the
//! error hook or back to the caller.

use color_eyre::Report;
use std::sync::Arc;

pub const UNKNOWN_ERROR: &str = "UNKNOWN_ERROR";
pub const PARSE_ERROR: &str = "PARSE_ERROR";
pub const IO_ERROR: &str = "IO_ERROR";
pub const TIMEOUT: &str = "TIMEOUT";

/// Error shape reported to callers, independent of the transport.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{code}: {message}")]
pub struct TableError {
  /// Machine-readable classification (e.g. `TIMEOUT`, `HTTP_404`)
  pub code: String,
  /// Human-readable description
  pub message: String,
  /// The original failure, if one exists
  pub details: Option<Arc<Report>>,
}

impl TableError {
  pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
    Self {
      code: code.into(),
      message: message.into(),
      details: None,
    }
  }

  /// Normalize an arbitrary fetch failure.
  ///
  /// A `TableError` already carried in the report keeps its code and message;
  /// otherwise the code is derived from the type of the underlying error.
  pub fn from_report(report: Report) -> Self {
    if let Some(inner) = report.downcast_ref::<TableError>() {
      let (code, message) = (inner.code.clone(), inner.message.clone());
      return Self {
        code,
        message,
        details: Some(Arc::new(report)),
      };
    }

    Self {
      code: classify(&report).to_string(),
      message: report.to_string(),
      details: Some(Arc::new(report)),
    }
  }
}

fn classify(report: &Report) -> &'static str {
  for cause in report.chain() {
    if cause.is::<serde_json::Error>() {
      return PARSE_ERROR;
    }
    if cause.is::<tokio::time::error::Elapsed>() {
      return TIMEOUT;
    }
    if let Some(io) = cause.downcast_ref::<std::io::Error>() {
      return match io.kind() {
        std::io::ErrorKind::TimedOut => TIMEOUT,
        _ => IO_ERROR,
      };
    }
  }
  UNKNOWN_ERROR
}

#[cfg(test)]
mod tests {
  use super::*;
  use color_eyre::eyre::eyre;

  #[test]
  fn test_error_display() {
    let err = TableError::new("HTTP_500", "server exploded");
    assert_eq!(err.to_string(), "HTTP_500: server exploded");
  }

  #[test]
  fn test_plain_report_is_unknown() {
    let err = TableError::from_report(eyre!("something broke"));
    assert_eq!(err.code, UNKNOWN_ERROR);
    assert_eq!(err.message, "something broke");
    assert!(err.details.is_some());
  }

  #[test]
  fn test_table_error_keeps_its_code() {
    let report = Report::new(TableError::new("HTTP_404", "not found"));
    let err = TableError::from_report(report);
    assert_eq!(err.code, "HTTP_404");
    assert_eq!(err.message, "not found");
  }

  #[test]
  fn test_parse_error_classified() {
    let parse = serde_json::from_str::<serde_json::Value>("{nope").unwrap_err();
    let err = TableError::from_report(Report::new(parse));
    assert_eq!(err.code, PARSE_ERROR);
  }

  #[test]
  fn test_io_timeout_classified() {
    let io = std::io::Error::new(std::io::ErrorKind::TimedOut, "slow");
    assert_eq!(TableError::from_report(Report::new(io)).code, TIMEOUT);

    let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "nope");
    assert_eq!(TableError::from_report(Report::new(io)).code, IO_ERROR);
  }
}
