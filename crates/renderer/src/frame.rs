//! Per-frame resources and the frame cursor.
//!
//! Each frame in flight owns its own command buffer and synchronization
//! primitives so the CPU can prepare frame N+1 while the GPU renders
//! frame N. The cursor selects which slot the current tick uses.

use std::sync::Arc;

use ash::vk;

use glint_rhi::RhiResult;
use glint_rhi::command::{CommandBuffer, CommandPool};
use glint_rhi::device::Device;
use glint_rhi::sync::{Fence, Semaphore};

/// Index cycling through the frame slots.
///
/// The cursor is advanced only by the frame scheduler after a completed
/// tick. Swapchain recreation has no access to it, so an aborted tick
/// retries with the same slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameCursor {
    index: usize,
    len: usize,
}

impl FrameCursor {
    /// Creates a cursor cycling over `len` slots, starting at slot 0.
    pub fn new(len: usize) -> Self {
        debug_assert!(len > 0);
        Self { index: 0, len }
    }

    /// Returns the current slot index.
    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Advances to the next slot, wrapping at the slot count.
    pub fn advance(&mut self) {
        self.index = (self.index + 1) % self.len;
    }
}

/// Per-frame rendering resources.
///
/// # Synchronization Flow
///
/// ```text
/// 1. Wait on in_flight fence (CPU waits for previous use of this slot)
/// 2. Acquire swapchain image (signals image_available)
/// 3. Record commands to command_buffer
/// 4. Submit command_buffer:
///    - Wait on image_available
///    - Signal render_finished
///    - Signal in_flight fence
/// 5. Present (waits on render_finished)
/// ```
pub struct InFlightFrameSlot {
    /// Command buffer re-recorded each time this slot is used.
    command_buffer: CommandBuffer,
    /// Signaled when the acquired swapchain image is ready.
    image_available: Semaphore,
    /// Signaled when rendering to the image is complete.
    render_finished: Semaphore,
    /// Signaled when this slot's GPU work has finished.
    in_flight: Fence,
}

impl InFlightFrameSlot {
    /// Creates the resources for one frame slot.
    ///
    /// # Errors
    ///
    /// Returns an error if any resource creation fails.
    pub fn new(device: Arc<Device>, command_pool: &CommandPool) -> RhiResult<Self> {
        let command_buffer = CommandBuffer::new(device.clone(), command_pool)?;
        let image_available = Semaphore::new(device.clone())?;
        let render_finished = Semaphore::new(device.clone())?;
        // Signaled so the first wait on this slot does not block forever
        let in_flight = Fence::new(device, true)?;

        Ok(Self {
            command_buffer,
            image_available,
            render_finished,
            in_flight,
        })
    }

    /// Returns a reference to the command buffer.
    #[inline]
    pub fn command_buffer(&self) -> &CommandBuffer {
        &self.command_buffer
    }

    /// Returns the image-available semaphore handle.
    #[inline]
    pub fn image_available(&self) -> vk::Semaphore {
        self.image_available.handle()
    }

    /// Returns the render-finished semaphore handle.
    #[inline]
    pub fn render_finished(&self) -> vk::Semaphore {
        self.render_finished.handle()
    }

    /// Returns a reference to the in-flight fence.
    #[inline]
    pub fn in_flight(&self) -> &Fence {
        &self.in_flight
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cursor_starts_at_zero() {
        let cursor = FrameCursor::new(2);
        assert_eq!(cursor.index(), 0);
    }

    #[test]
    fn test_cursor_cycles() {
        let mut cursor = FrameCursor::new(2);
        let mut seen = Vec::new();
        for _ in 0..6 {
            seen.push(cursor.index());
            cursor.advance();
        }
        assert_eq!(seen, vec![0, 1, 0, 1, 0, 1]);
    }

    #[test]
    fn test_cursor_single_slot() {
        let mut cursor = FrameCursor::new(1);
        cursor.advance();
        assert_eq!(cursor.index(), 0);
    }

    #[test]
    fn test_frame_slot_is_send() {
        // Compile-time check that InFlightFrameSlot is Send
        fn assert_send<T: Send>() {}
        assert_send::<InFlightFrameSlot>();
    }
}
