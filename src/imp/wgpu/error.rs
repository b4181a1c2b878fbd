use crate::error::Error;

#[derive(Debug, thiserror::Error)]
pub(crate) enum BackendError {
    #[error("no suitable adapter")]
    NoSuchAdapter,
    #[error(transparent)]
    RequestDeviceError(#[from] wgpu::RequestDeviceError),
}

impl From<BackendError> for Error {
    fn from(e: BackendError) -> Self {
        let operation = match e {
            BackendError::NoSuchAdapter => "request an adapter",
            BackendError::RequestDeviceError(_) => "request a device",
        };
        Error::Device {
            operation,
            reason: e.to_string(),
        }
    }
}
