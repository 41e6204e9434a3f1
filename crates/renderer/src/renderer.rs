//! Main renderer orchestration.
//!
//! This module provides the [`Renderer`] struct that owns all Vulkan
//! resources and drives one frame per redraw request.

use std::mem::ManuallyDrop;
use std::path::Path;
use std::sync::Arc;

use ash::vk;
use tracing::{debug, error, info, warn};

use glint_platform::{Surface, Window, get_required_extensions};
use glint_rhi::command::{CommandBuffer, CommandPool};
use glint_rhi::device::Device;
use glint_rhi::framebuffer::Framebuffers;
use glint_rhi::instance::Instance;
use glint_rhi::physical_device::select_physical_device;
use glint_rhi::pipeline::{FrontFace, GraphicsPipelineBuilder, Pipeline, PipelineLayout};
use glint_rhi::render_pass::RenderPass;
use glint_rhi::shader::{Shader, ShaderStage};
use glint_rhi::swapchain::Swapchain;
use glint_rhi::sync::MAX_FRAMES_IN_FLIGHT;
use glint_rhi::{RhiError, RhiResult};

use crate::scheduler::{FrameScheduler, ImageAcquire};

/// Clear color for the single color attachment (opaque black).
const CLEAR_COLOR: [f32; 4] = [0.0, 0.0, 0.0, 1.0];

/// Main renderer that manages all Vulkan resources.
///
/// # Resource Destruction Order
///
/// Vulkan resources must be destroyed in the correct order:
/// 1. Wait for all GPU work to complete
/// 2. Destroy per-frame resources (command buffers, semaphores, fences)
/// 3. Destroy the command pool
/// 4. Destroy pipeline resources
/// 5. Destroy framebuffers, then the render pass
/// 6. Destroy the swapchain
/// 7. Destroy the surface
/// 8. Destroy the device
/// 9. Destroy the instance
///
/// ManuallyDrop is used to enforce this order in [`Drop`].
pub struct Renderer {
    /// Vulkan instance (destroyed last).
    instance: ManuallyDrop<Instance>,
    /// Logical device; the last `Arc` clone, released before the instance.
    device: ManuallyDrop<Arc<Device>>,
    /// Window surface (destroyed after the swapchain, before the device).
    surface: ManuallyDrop<Surface>,
    /// Swapchain and its image views.
    swapchain: ManuallyDrop<Swapchain>,
    /// Fixed render pass for the single color attachment.
    render_pass: ManuallyDrop<RenderPass>,
    /// One framebuffer per swapchain image view.
    framebuffers: ManuallyDrop<Framebuffers>,
    /// Empty pipeline layout (no descriptors or push constants).
    pipeline_layout: ManuallyDrop<PipelineLayout>,
    /// Triangle graphics pipeline.
    pipeline: ManuallyDrop<Pipeline>,
    /// Command pool the frame slots allocate from.
    command_pool: ManuallyDrop<CommandPool>,
    /// Frame slots and the per-tick state machine.
    scheduler: ManuallyDrop<FrameScheduler>,

    /// Set by the event loop's resize notification, cleared on recreation.
    framebuffer_resized: bool,
    /// Current framebuffer width in pixels (0 while minimized).
    width: u32,
    /// Current framebuffer height in pixels (0 while minimized).
    height: u32,
}

impl Renderer {
    /// Creates a new renderer for the given window.
    ///
    /// This initializes all Vulkan resources: instance, surface, device,
    /// swapchain, render pass, framebuffers, pipeline, and frame slots.
    ///
    /// # Errors
    ///
    /// Returns an error if any Vulkan resource creation fails.
    pub fn new(window: &Window) -> RhiResult<Self> {
        let (width, height) = window.framebuffer_size();

        info!("Initializing Vulkan renderer ({}x{})", width, height);

        // Create Vulkan instance with validation in debug builds
        let enable_validation = cfg!(debug_assertions);
        let display_handle = window
            .display_handle()
            .map_err(|e| RhiError::Surface(e.to_string()))?;
        let surface_extensions = get_required_extensions(display_handle.as_raw())
            .map_err(|e| RhiError::Surface(e.to_string()))?;
        let instance = Instance::new(enable_validation, &surface_extensions)?;

        // Create surface
        let surface = window
            .create_surface(instance.entry(), instance.handle())
            .map_err(|e| RhiError::Surface(e.to_string()))?;

        // Select physical device and create the logical device
        let physical_device_info =
            select_physical_device(instance.handle(), surface.handle(), surface.loader())?;
        let device = Device::new(&instance, &physical_device_info)?;

        // Create swapchain, render pass, and framebuffers
        let swapchain = Swapchain::new(&instance, device.clone(), surface.handle(), width, height)?;
        let render_pass = RenderPass::new(device.clone(), swapchain.format())?;
        let framebuffers = Framebuffers::new(
            device.clone(),
            &render_pass,
            swapchain.image_views(),
            swapchain.extent(),
        )?;

        // Create the triangle pipeline
        let (pipeline, pipeline_layout) =
            Self::create_triangle_pipeline(device.clone(), &render_pass)?;

        // Create command pool and frame slots
        let graphics_family = device
            .queue_families()
            .graphics_family
            .ok_or(RhiError::NoSuitableGpu)?;
        let command_pool = CommandPool::new(device.clone(), graphics_family)?;
        let scheduler = FrameScheduler::new(device.clone(), &command_pool)?;

        info!(
            "Renderer initialized: {} swapchain images, {} frames in flight",
            swapchain.image_count(),
            MAX_FRAMES_IN_FLIGHT
        );

        Ok(Self {
            instance: ManuallyDrop::new(instance),
            device: ManuallyDrop::new(device),
            surface: ManuallyDrop::new(surface),
            swapchain: ManuallyDrop::new(swapchain),
            render_pass: ManuallyDrop::new(render_pass),
            framebuffers: ManuallyDrop::new(framebuffers),
            pipeline_layout: ManuallyDrop::new(pipeline_layout),
            pipeline: ManuallyDrop::new(pipeline),
            command_pool: ManuallyDrop::new(command_pool),
            scheduler: ManuallyDrop::new(scheduler),
            framebuffer_resized: false,
            width,
            height,
        })
    }

    /// Creates the triangle rendering pipeline.
    ///
    /// The triangle is hard-coded in the vertex shader, so the pipeline has
    /// no vertex input and the layout carries no descriptors.
    fn create_triangle_pipeline(
        device: Arc<Device>,
        render_pass: &RenderPass,
    ) -> RhiResult<(Pipeline, PipelineLayout)> {
        let vertex_shader = Shader::from_spirv_file(
            device.clone(),
            Path::new("shaders/spirv/triangle.vert.spv"),
            ShaderStage::Vertex,
            "main",
        )?;

        let fragment_shader = Shader::from_spirv_file(
            device.clone(),
            Path::new("shaders/spirv/triangle.frag.spv"),
            ShaderStage::Fragment,
            "main",
        )?;

        let pipeline_layout = PipelineLayout::new(device.clone(), &[], &[])?;

        // The shader emits the triangle clockwise in Vulkan's y-down NDC
        let pipeline = GraphicsPipelineBuilder::new()
            .vertex_shader(&vertex_shader)
            .fragment_shader(&fragment_shader)
            .front_face(FrontFace::Clockwise)
            .render_pass(render_pass)
            .build(device, &pipeline_layout)?;

        info!("Triangle pipeline created");

        Ok((pipeline, pipeline_layout))
    }

    /// Notifies the renderer that the window has been resized.
    ///
    /// The actual swapchain recreation happens at the end of the next
    /// completed frame. A zero size marks the window minimized; frames are
    /// skipped until a nonzero size arrives.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == self.width && height == self.height {
            return;
        }

        debug!(
            "Resize: {}x{} -> {}x{}",
            self.width, self.height, width, height
        );
        self.width = width;
        self.height = height;

        if width > 0 && height > 0 {
            self.framebuffer_resized = true;
        }
    }

    /// Renders one frame.
    ///
    /// While the window is minimized this is a no-op; no frame is submitted
    /// and no swapchain is rebuilt until a nonzero size arrives.
    ///
    /// # Errors
    ///
    /// Returns an error if any unrecoverable Vulkan operation fails.
    /// Out-of-date and suboptimal swapchain conditions are handled
    /// internally by recreating the swapchain.
    pub fn render_frame(&mut self) -> RhiResult<()> {
        if self.width == 0 || self.height == 0 {
            debug!("Window minimized, skipping frame");
            return Ok(());
        }

        self.scheduler.wait_for_slot()?;

        let image_index = match self.scheduler.acquire_image(&self.swapchain)? {
            ImageAcquire::Acquired(index) => index,
            ImageAcquire::OutOfDate => {
                // Abort this tick: no fence reset happened and the cursor
                // stays put, so the next tick retries the same slot.
                self.recreate_swapchain()?;
                return Ok(());
            }
        };

        let framebuffer = self.framebuffers.get(image_index as usize);
        let extent = self.swapchain.extent();
        let render_pass = &*self.render_pass;
        let pipeline = self.pipeline.handle();

        self.scheduler.record(|cmd| {
            Self::record_triangle_pass(cmd, render_pass, framebuffer, extent, pipeline);
            Ok(())
        })?;

        self.scheduler.submit()?;

        let needs_recreate = self.scheduler.present(&self.swapchain, image_index)?;

        // The tick completed; the cursor advances even when presentation
        // asked for a recreation.
        self.scheduler.advance();

        if needs_recreate || self.framebuffer_resized {
            self.recreate_swapchain()?;
        }

        Ok(())
    }

    /// Records the triangle render pass into the given command buffer.
    fn record_triangle_pass(
        cmd: &CommandBuffer,
        render_pass: &RenderPass,
        framebuffer: vk::Framebuffer,
        extent: vk::Extent2D,
        pipeline: vk::Pipeline,
    ) {
        cmd.begin_render_pass(render_pass, framebuffer, extent, CLEAR_COLOR);

        cmd.bind_pipeline(vk::PipelineBindPoint::GRAPHICS, pipeline);

        let viewport = vk::Viewport {
            x: 0.0,
            y: 0.0,
            width: extent.width as f32,
            height: extent.height as f32,
            min_depth: 0.0,
            max_depth: 1.0,
        };
        cmd.set_viewport(&viewport);

        let scissor = vk::Rect2D {
            offset: vk::Offset2D { x: 0, y: 0 },
            extent,
        };
        cmd.set_scissor(&scissor);

        // Three vertices, one instance; positions come from gl_VertexIndex
        cmd.draw(3, 1, 0, 0);

        cmd.end_render_pass();
    }

    /// Recreates the swapchain and framebuffers for the current size.
    ///
    /// Deferred while the framebuffer size is zero (minimized window); the
    /// resize flag stays set so the rebuild happens once a nonzero size
    /// arrives.
    fn recreate_swapchain(&mut self) -> RhiResult<()> {
        if self.width == 0 || self.height == 0 {
            debug!("Deferring swapchain recreation while minimized");
            return Ok(());
        }

        // Framebuffers reference the old image views, so they go first,
        // after all GPU work on them has drained. Destroying through the
        // wrapper leaves the set empty; if recreation fails below, the
        // final teardown finds no stale handles.
        self.device.wait_idle()?;
        self.framebuffers.destroy();

        let old_format = self.swapchain.format();
        self.swapchain
            .recreate(&self.instance, self.surface.handle(), self.width, self.height)?;

        if self.swapchain.format() != old_format {
            // The render pass was built for the old format; a mismatch here
            // would need a render pass and pipeline rebuild as well.
            warn!(
                "Swapchain format changed on recreation: {:?} -> {:?}",
                old_format,
                self.swapchain.format()
            );
        }

        let framebuffers = Framebuffers::new(
            Arc::clone(&self.device),
            &self.render_pass,
            self.swapchain.image_views(),
            self.swapchain.extent(),
        )?;
        *self.framebuffers = framebuffers;

        self.framebuffer_resized = false;
        Ok(())
    }
}

impl Drop for Renderer {
    fn drop(&mut self) {
        // Wait for all GPU work to complete before destroying resources
        if let Err(e) = self.device.wait_idle() {
            error!(
                "Failed to wait for device idle during renderer drop: {:?}",
                e
            );
        }

        // Reverse creation order. The device Arc held here is the last one
        // once everything above it is gone, so the VkDevice is destroyed
        // after the surface and before the instance.
        unsafe {
            ManuallyDrop::drop(&mut self.scheduler);
            ManuallyDrop::drop(&mut self.command_pool);
            ManuallyDrop::drop(&mut self.pipeline);
            ManuallyDrop::drop(&mut self.pipeline_layout);
            ManuallyDrop::drop(&mut self.framebuffers);
            ManuallyDrop::drop(&mut self.render_pass);
            ManuallyDrop::drop(&mut self.swapchain);
            ManuallyDrop::drop(&mut self.surface);
            ManuallyDrop::drop(&mut self.device);
            ManuallyDrop::drop(&mut self.instance);
        }

        info!("Renderer destroyed");
    }
}
