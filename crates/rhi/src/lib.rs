//! Rendering hardware interface: a thin, safe layer over Vulkan via ash.
//!
//! This crate wraps the Vulkan objects the renderer needs, each as an RAII
//! type that destroys its handle on drop:
//! - [`instance::Instance`] - instance, validation layers, debug messenger
//! - [`physical_device`] - GPU enumeration and selection
//! - [`device::Device`] - logical device and queues
//! - [`swapchain::Swapchain`] - swapchain, image views, acquire/present
//! - [`render_pass::RenderPass`] - the single-attachment render pass
//! - [`framebuffer::Framebuffers`] - per-swapchain-image framebuffers
//! - [`pipeline`] - pipeline layout and graphics pipeline builder
//! - [`shader::Shader`] - SPIR-V shader modules
//! - [`command`] - command pool and command buffer recording
//! - [`sync`] - semaphores and fences

pub mod command;
pub mod device;
pub mod error;
pub mod framebuffer;
pub mod instance;
pub mod physical_device;
pub mod pipeline;
pub mod render_pass;
pub mod shader;
pub mod swapchain;
pub mod sync;

pub use error::{RhiError, RhiResult};
