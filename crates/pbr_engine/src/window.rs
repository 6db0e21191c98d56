//! GLFW window with an OpenGL 3.3 core context
//!
//! Owns the GLFW instance, the window, and its event receiver, and hands the
//! GL function loader to [`crate::rhi::GlowBackend`]. The context is made
//! current on creation and stays current — the whole render path is
//! single-threaded and thread-affine.

use glfw::Context;
use thiserror::Error;

use crate::config::WindowConfig;

/// Window management errors
#[derive(Error, Debug)]
pub enum WindowError {
    /// GLFW failed to initialize
    #[error("GLFW initialization failed")]
    InitializationFailed,

    /// The window or its GL context could not be created
    #[error("window creation failed")]
    CreationFailed,
}

/// Result type for window operations
pub type WindowResult<T> = Result<T, WindowError>;

/// GLFW window wrapper with proper resource management
pub struct Window {
    glfw: glfw::Glfw,
    window: glfw::PWindow,
    events: glfw::GlfwReceiver<(f64, glfw::WindowEvent)>,
}

impl Window {
    /// Create a window with a current OpenGL 3.3 core-profile context
    pub fn new(config: &WindowConfig) -> WindowResult<Self> {
        let mut glfw = glfw::init(glfw::fail_on_errors)
            .map_err(|_| WindowError::InitializationFailed)?;

        glfw.window_hint(glfw::WindowHint::ContextVersion(3, 3));
        glfw.window_hint(glfw::WindowHint::OpenGlProfile(
            glfw::OpenGlProfileHint::Core,
        ));
        glfw.window_hint(glfw::WindowHint::OpenGlForwardCompat(true));
        glfw.window_hint(glfw::WindowHint::Resizable(true));

        let (mut window, events) = glfw
            .create_window(
                config.width,
                config.height,
                &config.title,
                glfw::WindowMode::Windowed,
            )
            .ok_or(WindowError::CreationFailed)?;

        window.make_current();
        window.set_key_polling(true);
        window.set_mouse_button_polling(true);
        window.set_cursor_pos_polling(true);
        window.set_framebuffer_size_polling(true);

        glfw.set_swap_interval(if config.vsync {
            glfw::SwapInterval::Sync(1)
        } else {
            glfw::SwapInterval::None
        });

        log::info!(
            "created {}x{} window '{}'",
            config.width,
            config.height,
            config.title
        );

        Ok(Self {
            glfw,
            window,
            events,
        })
    }

    /// Build a glow context from this window's GL loader
    ///
    /// The context must be current, which [`new`](Self::new) guarantees.
    pub fn load_gl(&mut self) -> glow::Context {
        unsafe {
            glow::Context::from_loader_function(|s| self.window.get_proc_address(s) as *const _)
        }
    }

    /// True once the user asked to close the window
    #[must_use]
    pub fn should_close(&self) -> bool {
        self.window.should_close()
    }

    /// Request the main loop to end
    pub fn set_should_close(&mut self, value: bool) {
        self.window.set_should_close(value);
    }

    /// Pump the platform event queue
    pub fn poll_events(&mut self) {
        self.glfw.poll_events();
    }

    /// Drain the events collected by the last [`poll_events`](Self::poll_events)
    pub fn flush_events(&self) -> glfw::FlushedMessages<'_, (f64, glfw::WindowEvent)> {
        glfw::flush_messages(&self.events)
    }

    /// Present the back buffer
    pub fn swap_buffers(&mut self) {
        self.window.swap_buffers();
    }

    /// Framebuffer size in pixels
    #[must_use]
    pub fn framebuffer_size(&self) -> (u32, u32) {
        let (width, height) = self.window.get_framebuffer_size();
        (width.max(0) as u32, height.max(0) as u32)
    }

    /// Framebuffer aspect ratio, guarding against a zero-height minimize
    #[must_use]
    pub fn aspect_ratio(&self) -> f32 {
        let (width, height) = self.framebuffer_size();
        width as f32 / height.max(1) as f32
    }

    /// Replace the title (the demo puts frame timings here)
    pub fn set_title(&mut self, title: &str) {
        self.window.set_title(title);
    }
}
