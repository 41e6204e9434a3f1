//! Error types for the RHI layer.
//!
//! Variants follow the frame lifecycle: setup failures carry a description of
//! what was being created, per-frame failures carry the raw Vulkan result of
//! the operation that failed.

use thiserror::Error;

/// Errors that can occur in the RHI layer.
#[derive(Error, Debug)]
pub enum RhiError {
    /// Raw Vulkan API errors without a more specific classification
    #[error("Vulkan error: {0}")]
    Vulkan(#[from] ash::vk::Result),

    /// Vulkan library loading errors
    #[error("Failed to load Vulkan library: {0}")]
    Loading(#[from] ash::LoadingError),

    /// No suitable GPU found
    #[error("No suitable GPU found")]
    NoSuitableGpu,

    /// Swapchain creation or recreation failed
    #[error("Swapchain creation failed: {0}")]
    SwapchainCreation(String),

    /// Creation of a swapchain-dependent resource (image view, framebuffer) failed
    #[error("Resource creation failed: {0}")]
    ResourceCreation(String),

    /// Acquiring a swapchain image failed with a non-recoverable result
    #[error("Surface acquisition failed: {0}")]
    SurfaceAcquisition(ash::vk::Result),

    /// Command buffer recording failed
    #[error("Command recording failed: {0}")]
    CommandRecording(ash::vk::Result),

    /// Queue submission failed
    #[error("Queue submission failed: {0}")]
    Submission(ash::vk::Result),

    /// Presentation failed with a non-recoverable result
    #[error("Presentation failed: {0}")]
    Presentation(ash::vk::Result),

    /// Surface-related errors
    #[error("Surface error: {0}")]
    Surface(String),

    /// Shader loading or reflection errors
    #[error("Shader error: {0}")]
    Shader(String),

    /// Pipeline creation errors
    #[error("Pipeline error: {0}")]
    Pipeline(String),
}

/// Result type alias for RHI operations.
pub type RhiResult<T> = Result<T, RhiError>;
