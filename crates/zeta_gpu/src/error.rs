use thiserror::Error;
use zeta_core::ZetaError;

#[derive(Debug, Error)]
pub enum GpuError {
    #[error("no compatible GPU adapter found")]
    NoAdapter(#[from] wgpu::RequestAdapterError),

    #[error("failed to request wgpu device")]
    DeviceRequest(#[from] wgpu::RequestDeviceError),

    #[error("invalid GPU configuration: {0}")]
    Configuration(String),

    #[error("failed to map staging buffer: {0}")]
    Map(String),

    #[error("device poll failed: {0}")]
    Poll(String),
}

impl GpuError {
    /// True when the machine simply has no usable device, as opposed to a
    /// failure of a device that does exist.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::NoAdapter(_) | Self::DeviceRequest(_))
    }
}

impl From<ZetaError> for GpuError {
    fn from(err: ZetaError) -> Self {
        Self::Configuration(err.to_string())
    }
}

impl From<GpuError> for ZetaError {
    fn from(err: GpuError) -> Self {
        ZetaError::Backend(err.to_string())
    }
}
