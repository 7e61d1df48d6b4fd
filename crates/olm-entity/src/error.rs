use snafu::Snafu;

pub type Result<T> = std::result::Result<T, Error>;

/// The public error type for `olm-entity`.
#[derive(Debug, Snafu)]
pub struct Error(InnerError);

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub(crate) enum InnerError {
    #[snafu(display("property '{}' is missing on {}", key, what))]
    MissingProperty { key: &'static str, what: String },

    #[snafu(display("property '{}' on {} has the wrong type", key, what))]
    WrongPropertyType { key: &'static str, what: String },

    #[snafu(display("invalid semver range '{}': {}", range, source))]
    InvalidSemverRange {
        range: String,
        source: semver::Error,
    },

    #[snafu(display("invalid semver version '{}': {}", version, source))]
    InvalidSemver {
        version: String,
        source: semver::Error,
    },
}
