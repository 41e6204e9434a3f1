//! Frame scheduling and renderer orchestration.
//!
//! This crate drives the rendering loop:
//! - Per-frame resources and the frame cursor
//! - The frame scheduler (wait, acquire, record, submit, present, advance)
//! - The [`Renderer`] that owns all GPU resources

pub mod frame;
pub mod renderer;
pub mod scheduler;

pub use renderer::Renderer;
pub use scheduler::FrameScheduler;
