//! Framebuffer management.
//!
//! One framebuffer per swapchain image view, all sharing the same render
//! pass and extent. The set is destroyed and rebuilt together with the
//! swapchain views it wraps; index correspondence with the swapchain's
//! images and views is maintained throughout.

use std::sync::Arc;

use ash::vk;
use tracing::debug;

use crate::device::Device;
use crate::error::{RhiError, RhiResult};
use crate::render_pass::RenderPass;

/// The set of framebuffers backing the swapchain images.
///
/// Framebuffers reference the render pass and the swapchain image views but
/// own neither; they must be destroyed before the views they reference,
/// which the renderer guarantees by tearing them down first on recreation.
pub struct Framebuffers {
    /// Reference to the logical device.
    device: Arc<Device>,
    /// One framebuffer per swapchain image view, same order.
    framebuffers: Vec<vk::Framebuffer>,
    /// Extent the framebuffers were created with.
    extent: vk::Extent2D,
}

impl Framebuffers {
    /// Creates one framebuffer per swapchain image view.
    ///
    /// # Arguments
    ///
    /// * `device` - The logical device
    /// * `render_pass` - The render pass the framebuffers are compatible with
    /// * `image_views` - The swapchain image views, in swapchain image order
    /// * `extent` - The swapchain extent
    ///
    /// # Errors
    ///
    /// Returns [`RhiError::ResourceCreation`] if any framebuffer cannot be
    /// created. Framebuffers created before the failure are destroyed.
    pub fn new(
        device: Arc<Device>,
        render_pass: &RenderPass,
        image_views: &[vk::ImageView],
        extent: vk::Extent2D,
    ) -> RhiResult<Self> {
        let mut framebuffers = Vec::with_capacity(image_views.len());

        for (i, &view) in image_views.iter().enumerate() {
            let attachments = [view];
            let create_info = vk::FramebufferCreateInfo::default()
                .render_pass(render_pass.handle())
                .attachments(&attachments)
                .width(extent.width)
                .height(extent.height)
                .layers(1);

            let framebuffer = unsafe {
                device.handle().create_framebuffer(&create_info, None)
            };

            match framebuffer {
                Ok(framebuffer) => framebuffers.push(framebuffer),
                Err(e) => {
                    for &created in &framebuffers {
                        unsafe {
                            device.handle().destroy_framebuffer(created, None);
                        }
                    }
                    return Err(RhiError::ResourceCreation(format!(
                        "Failed to create framebuffer {}: {:?}",
                        i, e
                    )));
                }
            }
        }

        debug!(
            "Created {} framebuffers ({}x{})",
            framebuffers.len(),
            extent.width,
            extent.height
        );

        Ok(Self {
            device,
            framebuffers,
            extent,
        })
    }

    /// Returns the framebuffer for the given swapchain image index.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    #[inline]
    pub fn get(&self, index: usize) -> vk::Framebuffer {
        self.framebuffers[index]
    }

    /// Returns the number of framebuffers.
    #[inline]
    pub fn len(&self) -> usize {
        self.framebuffers.len()
    }

    /// Returns true if there are no framebuffers.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.framebuffers.is_empty()
    }

    /// Returns the extent the framebuffers were created with.
    #[inline]
    pub fn extent(&self) -> vk::Extent2D {
        self.extent
    }

    /// Destroys all framebuffers, leaving the set empty.
    ///
    /// The device must be idle and no recorded command buffer may still
    /// reference the set. Destroying or dropping an emptied set is a no-op,
    /// so a rebuild that fails after this call leaves no handle behind to
    /// be destroyed a second time.
    pub fn destroy(&mut self) {
        if self.framebuffers.is_empty() {
            return;
        }

        let count = self.framebuffers.len();
        for framebuffer in self.framebuffers.drain(..) {
            unsafe {
                self.device.handle().destroy_framebuffer(framebuffer, None);
            }
        }
        debug!("Destroyed {} framebuffers", count);
    }
}

impl Drop for Framebuffers {
    fn drop(&mut self) {
        self.destroy();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instance::Instance;
    use crate::physical_device::{PhysicalDeviceInfo, QueueFamilyIndices};

    #[test]
    fn test_framebuffers_is_send_sync() {
        // Compile-time check that Framebuffers is Send + Sync
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Framebuffers>();
    }

    #[test]
    fn test_destroy_is_idempotent() {
        // This test requires Vulkan to be installed. No surface is needed:
        // the set is built over an empty view slice, which exercises the
        // destroy-then-drop path the renderer relies on when a swapchain
        // rebuild fails partway through.
        let instance = match Instance::new(false, &[]) {
            Ok(instance) => instance,
            Err(RhiError::Loading(_)) => {
                eprintln!("Skipping test: Vulkan not available");
                return;
            }
            Err(e) => panic!("Unexpected error: {:?}", e),
        };

        let physical_devices = match unsafe { instance.handle().enumerate_physical_devices() } {
            Ok(devices) if !devices.is_empty() => devices,
            _ => {
                eprintln!("Skipping test: no Vulkan devices");
                return;
            }
        };

        // Any device with a graphics family will do; presentation is not
        // exercised, so the present family aliases the graphics family.
        let mut selected = None;
        for physical_device in physical_devices {
            let families = unsafe {
                instance
                    .handle()
                    .get_physical_device_queue_family_properties(physical_device)
            };
            if let Some(graphics) = families
                .iter()
                .position(|f| f.queue_flags.contains(vk::QueueFlags::GRAPHICS))
            {
                let properties = unsafe {
                    instance
                        .handle()
                        .get_physical_device_properties(physical_device)
                };
                let memory_properties = unsafe {
                    instance
                        .handle()
                        .get_physical_device_memory_properties(physical_device)
                };
                selected = Some(PhysicalDeviceInfo {
                    device: physical_device,
                    properties,
                    memory_properties,
                    queue_families: QueueFamilyIndices {
                        graphics_family: Some(graphics as u32),
                        present_family: Some(graphics as u32),
                    },
                });
                break;
            }
        }
        let Some(info) = selected else {
            eprintln!("Skipping test: no graphics-capable device");
            return;
        };

        let device = match Device::new(&instance, &info) {
            Ok(device) => device,
            Err(e) => {
                eprintln!("Skipping test: device creation failed: {:?}", e);
                return;
            }
        };

        let render_pass = RenderPass::new(device.clone(), vk::Format::B8G8R8A8_UNORM)
            .expect("render pass creation");
        let extent = vk::Extent2D {
            width: 640,
            height: 480,
        };

        let mut framebuffers =
            Framebuffers::new(device, &render_pass, &[], extent).expect("framebuffer set creation");
        assert_eq!(framebuffers.extent().width, 640);

        // Repeated destroys and the final drop must each find the set empty.
        framebuffers.destroy();
        assert!(framebuffers.is_empty());
        framebuffers.destroy();
        assert_eq!(framebuffers.len(), 0);
        drop(framebuffers);
    }
}
