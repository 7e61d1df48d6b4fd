use snafu::Snafu;

pub type Result<T> = std::result::Result<T, Error>;

/// The public error type for `olm-resolver`.
#[derive(Debug, Snafu)]
pub struct Error(InnerError);

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub(crate) enum InnerError {
    #[snafu(display("malformed constraint on variable '{}': {}", variable, reason))]
    MalformedConstraint { variable: String, reason: String },

    #[snafu(display("mandatory variable '{}' has no satisfying candidate", variable))]
    MissingMandatoryProperty { variable: String },

    #[snafu(display("resolution is unsatisfiable"))]
    Unsatisfiable { core: Vec<String> },

    #[snafu(display("entity source query failed: {}", source))]
    EntitySource { source: olm_entity::Error },

    #[snafu(display("resolution was cancelled"))]
    Cancelled,
}

impl Error {
    /// The unsatisfiable-core literal names, if this error is a
    /// `ResolutionUnsatisfiable` per spec.md §7.
    pub fn unsatisfiable_core(&self) -> Option<&[String]> {
        match &self.0 {
            InnerError::Unsatisfiable { core } => Some(core.as_slice()),
            _ => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self.0, InnerError::Cancelled)
    }
}
