use snafu::Snafu;

pub type Result<T> = std::result::Result<T, Error>;

/// The public error type for `olm-revision`.
#[derive(Debug, Snafu)]
pub struct Error(InnerError);

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub(crate) enum InnerError {
    #[snafu(display("'{}' is not a valid phase name: must match {} and be <= 63 chars", name, pattern))]
    InvalidPhaseName { name: String, pattern: &'static str },

    #[snafu(display("invalid revision sequence: expected {}, got {}", expected, got))]
    InvalidRevisionSequence { expected: i64, got: i64 },

    #[snafu(display("revision {} is archived and cannot transition to {:?}", revision, attempted))]
    ArchivedIsTerminal { revision: i64, attempted: String },
}
