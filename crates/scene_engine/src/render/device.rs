//! Texture device abstraction
//!
//! The render target manager never talks to a graphics API directly. It asks a
//! [`TextureDevice`] for opaque handles and hands them back when a target is
//! replaced or cleared. [`HeadlessDevice`] keeps the bookkeeping without any
//! GPU and is what tests and offscreen runs use.

use std::collections::HashSet;

use thiserror::Error;

use super::render_target::RenderTargetDesc;

/// Handle to a texture or renderbuffer owned by a device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureHandle(pub u64);

/// Device allocation errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeviceError {
    /// Requested size is zero or above the device limit
    #[error("Unsupported texture size {width}x{height} (limit {limit})")]
    UnsupportedSize {
        /// Requested width
        width: u32,
        /// Requested height
        height: u32,
        /// Largest edge the device accepts
        limit: u32,
    },

    /// The attachment could not be completed
    #[error("Framebuffer incomplete: {0}")]
    Incomplete(String),

    /// The device is out of texture memory
    #[error("Out of texture memory")]
    OutOfMemory,
}

/// Allocator of GPU texture storage
pub trait TextureDevice {
    /// Allocate storage for `desc` and return its handle
    fn create_texture(&mut self, desc: &RenderTargetDesc) -> Result<TextureHandle, DeviceError>;

    /// Release a handle; unknown handles are ignored
    fn release_texture(&mut self, handle: TextureHandle);

    /// Whether `handle` is currently allocated
    fn is_live(&self, handle: TextureHandle) -> bool;

    /// Number of allocated handles
    fn live_count(&self) -> usize;
}

/// Device that only tracks handles
#[derive(Debug)]
pub struct HeadlessDevice {
    next_handle: u64,
    live: HashSet<TextureHandle>,
    max_texture_size: u32,
    budget: Option<usize>,
}

impl Default for HeadlessDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessDevice {
    /// Largest edge accepted unless configured otherwise
    pub const DEFAULT_MAX_TEXTURE_SIZE: u32 = 16384;

    /// Create a device with the default size limit and no handle budget
    pub fn new() -> Self {
        Self {
            next_handle: 1,
            live: HashSet::new(),
            max_texture_size: Self::DEFAULT_MAX_TEXTURE_SIZE,
            budget: None,
        }
    }

    /// Limit the largest texture edge
    pub fn with_max_texture_size(mut self, size: u32) -> Self {
        self.max_texture_size = size;
        self
    }

    /// Fail allocations once `count` handles are live
    pub fn with_budget(mut self, count: usize) -> Self {
        self.budget = Some(count);
        self
    }
}

impl TextureDevice for HeadlessDevice {
    fn create_texture(&mut self, desc: &RenderTargetDesc) -> Result<TextureHandle, DeviceError> {
        let limit = self.max_texture_size;
        if desc.width == 0 || desc.height == 0 || desc.width > limit || desc.height > limit {
            return Err(DeviceError::UnsupportedSize {
                width: desc.width,
                height: desc.height,
                limit,
            });
        }
        if self.budget.is_some_and(|budget| self.live.len() >= budget) {
            return Err(DeviceError::OutOfMemory);
        }

        let handle = TextureHandle(self.next_handle);
        self.next_handle += 1;
        self.live.insert(handle);
        Ok(handle)
    }

    fn release_texture(&mut self, handle: TextureHandle) {
        self.live.remove(&handle);
    }

    fn is_live(&self, handle: TextureHandle) -> bool {
        self.live.contains(&handle)
    }

    fn live_count(&self) -> usize {
        self.live.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::render_target::InternalFormat;

    #[test]
    fn test_allocate_and_release() {
        let mut device = HeadlessDevice::new();
        let desc = RenderTargetDesc::texture_2d(64, 64, InternalFormat::Rgba8);
        let a = device.create_texture(&desc).unwrap();
        let b = device.create_texture(&desc).unwrap();
        assert_ne!(a, b);
        assert_eq!(device.live_count(), 2);

        device.release_texture(a);
        assert!(!device.is_live(a));
        assert!(device.is_live(b));
        device.release_texture(a);
        assert_eq!(device.live_count(), 1);
    }

    #[test]
    fn test_size_limit_and_budget() {
        let mut device = HeadlessDevice::new().with_max_texture_size(128).with_budget(1);
        let too_big = RenderTargetDesc::texture_2d(256, 16, InternalFormat::Rgba8);
        assert!(matches!(
            device.create_texture(&too_big),
            Err(DeviceError::UnsupportedSize { limit: 128, .. })
        ));

        let desc = RenderTargetDesc::texture_2d(16, 16, InternalFormat::R32F);
        device.create_texture(&desc).unwrap();
        assert_eq!(device.create_texture(&desc), Err(DeviceError::OutOfMemory));
    }
}
