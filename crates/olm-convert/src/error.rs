use snafu::Snafu;

pub type Result<T> = std::result::Result<T, Error>;

/// The public error type for `olm-convert`.
#[derive(Debug, Snafu)]
pub struct Error(InnerError);

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub(crate) enum InnerError {
    #[snafu(display("install mode {:?} is unsupported for target namespaces {:?}: {}", mode, target_namespaces, reason))]
    UnsupportedInstallMode {
        mode: String,
        target_namespaces: Vec<String>,
        reason: String,
    },

    #[snafu(display("bundle contains unsupported resource: name={} kind={}", name, kind))]
    UnsupportedResource { name: String, kind: String },

    #[snafu(display("webhook definition '{}' references unknown deployment '{}'", name, deployment))]
    UnknownWebhookDeployment { name: String, deployment: String },

    #[snafu(display("conversion webhook '{}' references unknown CRD '{}'", name, crd))]
    UnknownConversionCrd { name: String, crd: String },
}
