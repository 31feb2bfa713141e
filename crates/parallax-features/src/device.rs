use ort::execution_providers::{CUDAExecutionProvider, ExecutionProvider};
use ort::session::builder::SessionBuilder;

/// Compute device for model inference.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Device {
    /// General-purpose CPU execution.
    Cpu,
    /// CUDA accelerator.
    Cuda,
}

impl Device {
    /// Selects the accelerator when the CUDA execution provider is
    /// available, otherwise falls back to the CPU.
    pub fn auto() -> Self {
        if CUDAExecutionProvider::default().is_available().unwrap_or(false) {
            Device::Cuda
        } else {
            Device::Cpu
        }
    }
}

impl std::fmt::Display for Device {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Device::Cpu => write!(f, "cpu"),
            Device::Cuda => write!(f, "cuda"),
        }
    }
}

/// Register the execution provider for the selected device on a
/// session builder. CPU needs no registration.
pub(crate) fn register_device(
    builder: SessionBuilder,
    device: Device,
) -> Result<SessionBuilder, ort::Error> {
    match device {
        Device::Cuda => builder.with_execution_providers([CUDAExecutionProvider::default().build()]),
        Device::Cpu => Ok(builder),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_display() {
        assert_eq!(Device::Cpu.to_string(), "cpu");
        assert_eq!(Device::Cuda.to_string(), "cuda");
    }
}
