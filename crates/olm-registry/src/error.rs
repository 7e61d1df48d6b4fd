use snafu::Snafu;

pub type Result<T> = std::result::Result<T, Error>;

/// The public error type for `olm-registry`.
#[derive(Debug, Snafu)]
pub struct Error(InnerError);

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub(crate) enum InnerError {
    #[snafu(display("{} is missing from the bundle filesystem", path))]
    MissingPath { path: &'static str },

    #[snafu(display("{} has no package annotation '{}'", path, key))]
    MissingPackageAnnotation { path: &'static str, key: &'static str },

    #[snafu(display("failed reading {}: {}", path, source))]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[snafu(display("failed parsing {} as YAML: {}", path, source))]
    Yaml {
        path: String,
        source: serde_yaml::Error,
    },

    #[snafu(display("bundle manifests must contain exactly one ClusterServiceVersion, found {}", count))]
    WrongCsvCount { count: usize },

    #[snafu(display("{} declares owned apiServiceDefinitions, which are not supported", csv_name))]
    UnsupportedApiServiceDefinitions { csv_name: String },
}
