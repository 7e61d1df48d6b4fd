use snafu::Snafu;

pub type Result<T> = std::result::Result<T, Error>;

/// The single public error type callers of `olm-core` match on, per
/// spec.md §7's closed error-kind set. Every leaf crate's opaque error
/// is wrapped as a `source` field, the same way
/// `model/src/test_manager/error.rs::Error::Client` wraps
/// `crate::clients::Error`.
#[derive(Debug, Snafu)]
pub struct Error(InnerError);

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub(crate) enum InnerError {
    #[snafu(display("invalid input: {}", reason))]
    InvalidInput { reason: String },

    #[snafu(display("resolution failed: {}", source))]
    Resolve { source: olm_resolver::Error },

    #[snafu(display("no bundle satisfying package '{}' was selected", package_name))]
    NoBundleSelected { package_name: String },

    #[snafu(display("failed to fetch bundle content for '{}': {}", bundle_id, reason))]
    BundleFetch { bundle_id: String, reason: String },

    #[snafu(display("failed to parse bundle: {}", source))]
    BundleParse { source: olm_registry::Error },

    #[snafu(display("failed to convert bundle: {}", source))]
    Convert { source: olm_convert::Error },

    #[snafu(display("revision sequencing error: {}", source))]
    InvalidRevisionSequence { source: olm_revision::Error },

    #[snafu(display("pipeline run was cancelled"))]
    Cancelled,

    #[snafu(display("internal error: {}", message))]
    Internal { message: String },
}

impl Error {
    /// The unsatisfiable-core literal names, if this is a
    /// `ResolutionUnsatisfiable` error (spec.md §7).
    pub fn unsatisfiable_core(&self) -> Option<&[String]> {
        match &self.0 {
            InnerError::Resolve { source } => source.unsatisfiable_core(),
            _ => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self.0, InnerError::Cancelled)
    }
}
