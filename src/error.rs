use thiserror::Error;

/// Failures while reading a people/departments snapshot.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("failed to read snapshot: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed {what} payload: {source}")]
    Malformed {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

/// Write-time rejections from the in-memory [`Directory`](crate::directory::Directory).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DirectoryError {
    #[error("{field} is required")]
    MissingField { field: &'static str },
    #[error("person `{0}` already exists")]
    DuplicatePerson(String),
    #[error("department `{0}` already exists")]
    DuplicateDepartment(String),
    #[error("person `{0}` not found")]
    PersonNotFound(String),
    #[error("department `{0}` not found")]
    DepartmentNotFound(String),
    #[error("person `{0}` cannot be their own manager")]
    SelfManaged(String),
    #[error("person id `{0}` uses the reserved department node prefix")]
    ReservedPersonId(String),
    #[error("invalid email address `{0}`")]
    InvalidEmail(String),
}
