//! The frame scheduler.
//!
//! Coordinates the per-tick lifecycle over the frame slots:
//!
//! 1. Wait on the current slot's in-flight fence
//! 2. Acquire the next swapchain image
//! 3. Reset the fence and re-record the slot's command buffer
//! 4. Submit to the graphics queue
//! 5. Present on the present queue
//! 6. Advance the cursor
//!
//! The fence is reset only after a successful acquire; an acquire that
//! reports the swapchain out of date leaves the fence signaled and the
//! cursor in place, so the next tick retries the same slot without
//! deadlocking on a fence that will never be signaled.
//!
//! The scheduler is not thread-safe. It is driven from the event loop
//! thread only.

use std::sync::Arc;

use ash::vk;
use tracing::{debug, info};

use glint_rhi::command::{CommandBuffer, CommandPool};
use glint_rhi::device::Device;
use glint_rhi::swapchain::Swapchain;
use glint_rhi::sync::MAX_FRAMES_IN_FLIGHT;
use glint_rhi::{RhiError, RhiResult};

use crate::frame::{FrameCursor, InFlightFrameSlot};

/// Result of an image acquisition attempt.
pub enum ImageAcquire {
    /// An image was acquired; the tick proceeds with this image index.
    Acquired(u32),
    /// The swapchain no longer matches the surface. The tick must be
    /// aborted and the swapchain recreated; no fence was reset and the
    /// cursor has not moved.
    OutOfDate,
}

/// Drives the frame slots through the per-tick lifecycle.
pub struct FrameScheduler {
    /// Reference to the logical device.
    device: Arc<Device>,
    /// One slot per frame in flight, allocated once and reused.
    slots: Vec<InFlightFrameSlot>,
    /// Selects the slot for the current tick.
    cursor: FrameCursor,
}

impl FrameScheduler {
    /// Creates the scheduler with [`MAX_FRAMES_IN_FLIGHT`] frame slots.
    ///
    /// # Errors
    ///
    /// Returns an error if any slot's resources cannot be created.
    pub fn new(device: Arc<Device>, command_pool: &CommandPool) -> RhiResult<Self> {
        let mut slots = Vec::with_capacity(MAX_FRAMES_IN_FLIGHT);

        for i in 0..MAX_FRAMES_IN_FLIGHT {
            slots.push(InFlightFrameSlot::new(device.clone(), command_pool)?);
            debug!("Created frame slot {}", i);
        }

        info!(
            "Frame scheduler created with {} frames in flight",
            MAX_FRAMES_IN_FLIGHT
        );

        Ok(Self {
            device,
            cursor: FrameCursor::new(MAX_FRAMES_IN_FLIGHT),
            slots,
        })
    }

    /// Returns the slot selected for the current tick.
    #[inline]
    pub fn current_slot(&self) -> &InFlightFrameSlot {
        &self.slots[self.cursor.index()]
    }

    /// Returns the current cursor index.
    #[inline]
    pub fn current_index(&self) -> usize {
        self.cursor.index()
    }

    /// Blocks until the current slot's previous GPU work has completed.
    ///
    /// # Errors
    ///
    /// Returns an error if the fence wait fails.
    pub fn wait_for_slot(&self) -> RhiResult<()> {
        self.current_slot().in_flight().wait(u64::MAX)
    }

    /// Acquires the next swapchain image, signaling the current slot's
    /// image-available semaphore.
    ///
    /// A suboptimal result at acquire is treated as a successful acquire;
    /// the image is still usable for this frame and presentation will
    /// report the mismatch again if it persists.
    ///
    /// # Errors
    ///
    /// Returns [`RhiError::SurfaceAcquisition`] for failures other than an
    /// out-of-date swapchain.
    pub fn acquire_image(&self, swapchain: &Swapchain) -> RhiResult<ImageAcquire> {
        match swapchain.acquire_next_image(self.current_slot().image_available()) {
            Ok((image_index, suboptimal)) => {
                if suboptimal {
                    debug!("Swapchain suboptimal during acquire, continuing with the image");
                }
                Ok(ImageAcquire::Acquired(image_index))
            }
            Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => {
                debug!("Swapchain out of date during acquire");
                Ok(ImageAcquire::OutOfDate)
            }
            Err(e) => Err(RhiError::SurfaceAcquisition(e)),
        }
    }

    /// Resets the current slot's fence and re-records its command buffer.
    ///
    /// The fence reset happens here, after a successful acquire, so that
    /// an aborted tick never leaves the slot's fence unsignaled.
    ///
    /// # Errors
    ///
    /// Returns [`RhiError::CommandRecording`] if the reset, begin, supplied
    /// recording, or end fails.
    pub fn record<F>(&self, record_commands: F) -> RhiResult<()>
    where
        F: FnOnce(&CommandBuffer) -> RhiResult<()>,
    {
        let slot = self.current_slot();
        slot.in_flight().reset().map_err(as_recording_error)?;

        let cmd = slot.command_buffer();
        let recorded = (|| {
            cmd.reset()?;
            cmd.begin()?;
            record_commands(cmd)?;
            cmd.end()
        })();

        recorded.map_err(as_recording_error)
    }

    /// Submits the current slot's command buffer to the graphics queue.
    ///
    /// The submission waits on the slot's image-available semaphore at the
    /// color-attachment-output stage and signals the render-finished
    /// semaphore and the in-flight fence.
    ///
    /// # Errors
    ///
    /// Returns [`RhiError::Submission`] if queue submission fails.
    pub fn submit(&self) -> RhiResult<()> {
        let slot = self.current_slot();

        let wait_semaphores = [slot.image_available()];
        let wait_stages = [vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT];
        let signal_semaphores = [slot.render_finished()];
        let command_buffers = [slot.command_buffer().handle()];

        let submit_info = vk::SubmitInfo::default()
            .wait_semaphores(&wait_semaphores)
            .wait_dst_stage_mask(&wait_stages)
            .command_buffers(&command_buffers)
            .signal_semaphores(&signal_semaphores);

        unsafe {
            self.device
                .handle()
                .queue_submit(
                    self.device.graphics_queue(),
                    &[submit_info],
                    slot.in_flight().handle(),
                )
                .map_err(RhiError::Submission)?;
        }

        Ok(())
    }

    /// Presents the rendered image, waiting on the current slot's
    /// render-finished semaphore.
    ///
    /// # Returns
    ///
    /// Returns `true` if the swapchain is out of date or suboptimal and
    /// should be recreated after this tick completes.
    ///
    /// # Errors
    ///
    /// Returns [`RhiError::Presentation`] for failures other than an
    /// out-of-date or suboptimal swapchain.
    pub fn present(&self, swapchain: &Swapchain, image_index: u32) -> RhiResult<bool> {
        match swapchain.present(
            self.device.present_queue(),
            image_index,
            self.current_slot().render_finished(),
        ) {
            Ok(suboptimal) => {
                if suboptimal {
                    debug!("Swapchain suboptimal during present");
                }
                Ok(suboptimal)
            }
            Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => {
                debug!("Swapchain out of date during present");
                Ok(true)
            }
            Err(vk::Result::SUBOPTIMAL_KHR) => {
                debug!("Swapchain suboptimal during present");
                Ok(true)
            }
            Err(e) => Err(RhiError::Presentation(e)),
        }
    }

    /// Advances the cursor to the next frame slot.
    ///
    /// Called once at the end of each completed tick. A tick aborted at
    /// acquire does not advance; it retries with the same slot.
    pub fn advance(&mut self) {
        self.cursor.advance();
    }
}

fn as_recording_error(e: RhiError) -> RhiError {
    match e {
        RhiError::Vulkan(result) => RhiError::CommandRecording(result),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_max_frames_in_flight_constant() {
        // Two slots keep the CPU one frame ahead without deeper latency
        assert!(MAX_FRAMES_IN_FLIGHT >= 1);
        assert!(MAX_FRAMES_IN_FLIGHT <= 4);
    }

    #[test]
    fn test_scheduler_is_send() {
        // Compile-time check that FrameScheduler is Send
        fn assert_send<T: Send>() {}
        assert_send::<FrameScheduler>();
    }

    #[test]
    fn test_recording_error_wraps_vulkan_results() {
        let mapped = as_recording_error(RhiError::Vulkan(vk::Result::ERROR_DEVICE_LOST));
        assert!(matches!(
            mapped,
            RhiError::CommandRecording(vk::Result::ERROR_DEVICE_LOST)
        ));

        let passthrough = as_recording_error(RhiError::NoSuitableGpu);
        assert!(matches!(passthrough, RhiError::NoSuitableGpu));
    }
}
