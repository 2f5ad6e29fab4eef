use std::path::PathBuf;
use thiserror::Error;

/// Every way building the report can fail. None of these are recovered from:
/// the caller aborts before anything is served.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("failed to read dataset '{}': {source}", path.display())]
    Load {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse dataset '{}': {message}", path.display())]
    Parse { path: PathBuf, message: String },

    #[error("column '{column}' not found in dataset (available: {})", available.join(", "))]
    Schema {
        column: String,
        available: Vec<String>,
    },

    #[error("chart '{chart}' binds column '{column}' which is not in its source table")]
    Binding { chart: String, column: String },

    #[error("invalid chart recipe '{recipe}': {message}")]
    Spec { recipe: String, message: String },

    #[error("failed to render chart '{chart}': {message}")]
    Render { chart: String, message: String },

    #[error("failed to listen on {addr}: {message}")]
    Serve { addr: String, message: String },
}

impl ReportError {
    /// Dataset missing, unreadable or unparsable.
    pub fn is_load_error(&self) -> bool {
        matches!(self, ReportError::Load { .. } | ReportError::Parse { .. })
    }

    /// A named column is absent from the table it was looked up in.
    pub fn is_schema_error(&self) -> bool {
        matches!(self, ReportError::Schema { .. } | ReportError::Binding { .. })
    }
}

pub type Result<T> = std::result::Result<T, ReportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        let load = ReportError::Load {
            path: PathBuf::from("train.csv"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        };
        assert!(load.is_load_error());
        assert!(!load.is_schema_error());

        let schema = ReportError::Schema {
            column: "Embarked".to_string(),
            available: vec!["Survived".to_string()],
        };
        assert!(schema.is_schema_error());
        assert!(schema.to_string().contains("Embarked"));
        assert!(schema.to_string().contains("Survived"));

        let binding = ReportError::Binding {
            chart: "pie".to_string(),
            column: "Pclass".to_string(),
        };
        assert!(binding.is_schema_error());
    }
}
