use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CleanError {
    #[error("input file '{}' does not exist", .0.display())]
    InputNotFound(PathBuf),

    #[error("failed to read CSV from '{}'", path.display())]
    Input {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("'{}' is missing required column(s): {}", path.display(), missing.join(", "))]
    MissingColumns {
        path: PathBuf,
        missing: Vec<&'static str>,
    },

    #[error("failed to write cleaned data to '{}'", path.display())]
    Output {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_columns_are_listed() {
        let err = CleanError::MissingColumns {
            path: PathBuf::from("sales.csv"),
            missing: vec!["Quantity", "Price"],
        };
        assert_eq!(
            err.to_string(),
            "'sales.csv' is missing required column(s): Quantity, Price"
        );
    }

    #[test]
    fn output_error_keeps_io_source() {
        let err = CleanError::Output {
            path: PathBuf::from("out.csv"),
            source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        };
        let source = std::error::Error::source(&err).map(|e| e.to_string());
        assert!(source.is_some());
        assert_eq!(err.to_string(), "failed to write cleaned data to 'out.csv'");
    }
}
