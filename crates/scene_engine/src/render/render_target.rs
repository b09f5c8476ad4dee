//! Render target management
//!
//! Off-screen attachments are described by a [`RenderTargetDesc`] and owned by
//! the [`RenderTargetManager`]. Each held target owns exactly one device handle;
//! the handle goes back to the device when the target is replaced, cleared or
//! the manager is dropped.

use std::collections::{HashMap, HashSet};

use bitflags::bitflags;
use thiserror::Error;

use super::device::{DeviceError, TextureDevice, TextureHandle};
use crate::core::RenderConfig;

bitflags! {
    /// Resolution options applied when a target is allocated
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct RenderTargetOption: u32 {
        /// Allocate as described
        const NONE = 0;
        /// Multisample when MSAA is enabled
        const MSAA = 1 << 1;
        /// Double the resolution when SSAA is enabled
        const SSAA = 1 << 2;
    }
}

/// Storage kind of a target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RenderTargetKind {
    /// Plain 2D texture
    Texture2D,
    /// Layered 2D texture
    Texture2DArray,
    /// Multisampled 2D texture
    Texture2DMultisample,
    /// Six-face cube map
    TextureCube,
    /// Renderbuffer, not sampleable
    RenderBuffer,
}

/// Sized internal storage format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InternalFormat {
    /// 8-bit normalized RGBA
    Rgba8,
    /// Half float RGBA
    Rgba16F,
    /// Float RGBA
    Rgba32F,
    /// Half float RG
    Rg16F,
    /// Float RG
    Rg32F,
    /// Half float red
    R16F,
    /// Float red
    R32F,
    /// 32-bit float depth
    Depth32F,
    /// 24-bit depth with 8-bit stencil
    Depth24Stencil8,
}

impl InternalFormat {
    /// Texel layout matching the format
    pub fn texel_format(self) -> TexelFormat {
        match self {
            Self::Rgba8 | Self::Rgba16F | Self::Rgba32F => TexelFormat::Rgba,
            Self::Rg16F | Self::Rg32F => TexelFormat::Rg,
            Self::R16F | Self::R32F => TexelFormat::Red,
            Self::Depth32F => TexelFormat::DepthComponent,
            Self::Depth24Stencil8 => TexelFormat::DepthStencil,
        }
    }

    /// Component type matching the format
    pub fn data_type(self) -> DataType {
        match self {
            Self::Rgba8 => DataType::UnsignedByte,
            Self::Rgba16F | Self::Rg16F | Self::R16F => DataType::HalfFloat,
            Self::Rgba32F | Self::Rg32F | Self::R32F | Self::Depth32F => DataType::Float,
            Self::Depth24Stencil8 => DataType::UnsignedInt248,
        }
    }

    /// Whether the format is a depth attachment
    pub fn is_depth(self) -> bool {
        matches!(self, Self::Depth32F | Self::Depth24Stencil8)
    }
}

/// Texel layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TexelFormat {
    /// Four channels
    Rgba,
    /// Two channels
    Rg,
    /// One channel
    Red,
    /// Depth only
    DepthComponent,
    /// Packed depth and stencil
    DepthStencil,
}

/// Per-component data type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    /// 8-bit unsigned
    UnsignedByte,
    /// 16-bit float
    HalfFloat,
    /// 32-bit float
    Float,
    /// Packed 24-bit depth and 8-bit stencil
    UnsignedInt248,
}

/// Texture filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterMode {
    /// Nearest texel
    Nearest,
    /// Bilinear
    Linear,
    /// Trilinear across mip levels
    LinearMipmapLinear,
}

/// Texture addressing outside [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WrapMode {
    /// Tile the texture
    Repeat,
    /// Clamp to the edge texel
    ClampToEdge,
    /// Tile with mirroring
    MirrorRepeat,
    /// Use the border colour
    ClampToBorder,
}

/// Description of one render target
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RenderTargetDesc {
    /// Storage kind
    pub kind: RenderTargetKind,
    /// Width in texels
    pub width: u32,
    /// Height in texels
    pub height: u32,
    /// Layer count for array textures
    pub layers: u32,
    /// Sized storage format
    pub internal_format: InternalFormat,
    /// Texel layout
    pub texel_format: TexelFormat,
    /// Component type
    pub data_type: DataType,
    /// Minification filter
    pub min_filter: FilterMode,
    /// Magnification filter
    pub mag_filter: FilterMode,
    /// Addressing mode
    pub wrap: WrapMode,
    /// Sample count for multisampled kinds, 0 otherwise
    pub multisample_count: u32,
    /// Resolution options
    pub option: RenderTargetOption,
    /// Survives `clear(false)` and is not rebuilt once created
    pub immutable: bool,
}

impl RenderTargetDesc {
    /// Describe a target of any kind; texel layout and data type follow the format
    pub fn new(kind: RenderTargetKind, width: u32, height: u32, internal_format: InternalFormat) -> Self {
        let filter = if internal_format.is_depth() {
            FilterMode::Nearest
        } else {
            FilterMode::Linear
        };
        Self {
            kind,
            width,
            height,
            layers: 1,
            internal_format,
            texel_format: internal_format.texel_format(),
            data_type: internal_format.data_type(),
            min_filter: filter,
            mag_filter: filter,
            wrap: WrapMode::ClampToEdge,
            multisample_count: 0,
            option: RenderTargetOption::NONE,
            immutable: false,
        }
    }

    /// Describe a plain 2D texture
    pub fn texture_2d(width: u32, height: u32, internal_format: InternalFormat) -> Self {
        Self::new(RenderTargetKind::Texture2D, width, height, internal_format)
    }

    /// Set both filters
    pub fn with_filter(mut self, min_filter: FilterMode, mag_filter: FilterMode) -> Self {
        self.min_filter = min_filter;
        self.mag_filter = mag_filter;
        self
    }

    /// Set the addressing mode
    pub fn with_wrap(mut self, wrap: WrapMode) -> Self {
        self.wrap = wrap;
        self
    }

    /// Set resolution options
    pub fn with_option(mut self, option: RenderTargetOption) -> Self {
        self.option = option;
        self
    }

    /// Set the layer count
    pub fn with_layers(mut self, layers: u32) -> Self {
        self.layers = layers;
        self
    }

    /// Set the sample count
    pub fn with_multisample(mut self, count: u32) -> Self {
        self.multisample_count = count;
        self
    }

    /// Mark the target immutable
    pub fn immutable(mut self) -> Self {
        self.immutable = true;
        self
    }

    /// Copy with both edges scaled; options and immutability are dropped
    pub fn scaled(&self, scale: f32) -> Self {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
        let scale_edge = |edge: u32| ((edge as f32 * scale) as u32).max(1);
        Self {
            width: scale_edge(self.width),
            height: scale_edge(self.height),
            option: RenderTargetOption::NONE,
            immutable: false,
            ..self.clone()
        }
    }
}

/// An allocated render target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderTarget {
    name: String,
    desc: RenderTargetDesc,
    requested: RenderTargetDesc,
    handle: TextureHandle,
}

impl RenderTarget {
    /// Target name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Device handle
    pub fn handle(&self) -> TextureHandle {
        self.handle
    }

    /// Descriptor after options were applied
    pub fn desc(&self) -> &RenderTargetDesc {
        &self.desc
    }

    /// Descriptor as requested, used to rebuild the target
    pub fn requested_desc(&self) -> &RenderTargetDesc {
        &self.requested
    }

    /// Allocated width
    pub fn width(&self) -> u32 {
        self.desc.width
    }

    /// Allocated height
    pub fn height(&self) -> u32 {
        self.desc.height
    }

    /// Allocated kind
    pub fn kind(&self) -> RenderTargetKind {
        self.desc.kind
    }

    /// Storage format
    pub fn internal_format(&self) -> InternalFormat {
        self.desc.internal_format
    }

    /// Whether the target survives non-forced clears
    pub fn is_immutable(&self) -> bool {
        self.desc.immutable
    }
}

/// Render target errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderTargetError {
    /// The device refused the allocation
    #[error("Failed to create render target {name}: {source}")]
    Device {
        /// Target name
        name: String,
        /// Device failure
        source: DeviceError,
    },

    /// No target with this name
    #[error("Render target not found: {0}")]
    NotFound(String),
}

/// Names of the standard target set
pub struct RenderTargetNames;

#[allow(missing_docs)]
impl RenderTargetNames {
    pub const BACKBUFFER: &'static str = "BACKBUFFER";
    pub const DEPTHSTENCIL: &'static str = "DEPTHSTENCIL";
    pub const SCREENBUFFER: &'static str = "SCREENBUFFER";
    pub const DEPTH: &'static str = "DEPTH";
    pub const OBJECT_ID: &'static str = "OBJECT_ID";
    pub const OBJECT_ID_DEPTH: &'static str = "OBJECT_ID_DEPTH";
    pub const HDR: &'static str = "HDR";
    pub const HDR_TEMP: &'static str = "HDR_TEMP";
    pub const HDR_BACKUP: &'static str = "HDR_BACKUP";
    pub const BLOOM: [&'static str; 5] = ["BLOOM_0", "BLOOM_1", "BLOOM_2", "BLOOM_3", "BLOOM_4"];
    pub const LIGHT_SHAFT: &'static str = "LIGHT_SHAFT";
    pub const LIGHT_PROBE_ATMOSPHERE: &'static str = "LIGHT_PROBE_ATMOSPHERE";
    pub const ATMOSPHERE: &'static str = "ATMOSPHERE";
    pub const DIFFUSE: &'static str = "DIFFUSE";
    pub const MATERIAL: &'static str = "MATERIAL";
    pub const WORLD_NORMAL: &'static str = "WORLD_NORMAL";
    pub const VELOCITY: &'static str = "VELOCITY";
    pub const LINEAR_DEPTH: &'static str = "LINEAR_DEPTH";
    pub const SSAO: &'static str = "SSAO";
    pub const STATIC_SHADOWMAP: &'static str = "STATIC_SHADOWMAP";
    pub const DYNAMIC_SHADOWMAP: &'static str = "DYNAMIC_SHADOWMAP";
    pub const COMPOSITE_SHADOWMAP: &'static str = "COMPOSITE_SHADOWMAP";
    pub const TEMP_RGBA8: &'static str = "TEMP_RGBA8";
    pub const TEMP_2D_ARRAY: &'static str = "TEMP_2D_ARRAY";
    pub const TEMP_MULTISAMPLE_X4: &'static str = "TEMP_MULTISAMPLE_X4";
    pub const TEMP_RENDER_BUFFER_MULTISAMPLE: &'static str = "TEMP_RENDER_BUFFER_MULTISAMPLE";
    pub const TEMP_HEIGHT_MAP: &'static str = "TEMP_HEIGHT_MAP";
}

const OBJECT_ID_SIZE: u32 = 512;
const LIGHT_PROBE_SIZE: u32 = 512;
const HEIGHT_MAP_SIZE: u32 = 1024;

/// Owner of every persistent and temporary render target
pub struct RenderTargetManager {
    device: Box<dyn TextureDevice>,
    rendertargets: HashMap<String, RenderTarget>,
    immutable_names: HashSet<String>,
    temp_rendertargets: HashMap<String, RenderTarget>,
    msaa_enabled: bool,
    msaa_samples: u32,
    ssaa_enabled: bool,
    shadow_map_size: u32,
    width: u32,
    height: u32,
}

impl RenderTargetManager {
    /// Create an empty manager allocating through `device`
    pub fn new(device: Box<dyn TextureDevice>, config: &RenderConfig) -> Self {
        Self {
            device,
            rendertargets: HashMap::new(),
            immutable_names: HashSet::new(),
            temp_rendertargets: HashMap::new(),
            msaa_enabled: config.msaa_enabled,
            msaa_samples: config.msaa_samples,
            ssaa_enabled: config.ssaa_enabled,
            shadow_map_size: config.shadow_map_size,
            width: 0,
            height: 0,
        }
    }

    /// The device handles come from
    pub fn device(&self) -> &dyn TextureDevice {
        self.device.as_ref()
    }

    /// Screen size of the last standard set
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Take new MSAA/SSAA settings; call [`Self::recreate_rendertargets`] to apply them
    pub fn apply_config(&mut self, config: &RenderConfig) {
        self.msaa_enabled = config.msaa_enabled;
        self.msaa_samples = config.msaa_samples;
        self.ssaa_enabled = config.ssaa_enabled;
        self.shadow_map_size = config.shadow_map_size;
    }

    fn apply_options(&self, requested: &RenderTargetDesc) -> RenderTargetDesc {
        let mut desc = requested.clone();
        if desc.option.contains(RenderTargetOption::MSAA) && self.msaa_enabled {
            if desc.kind == RenderTargetKind::Texture2D {
                desc.kind = RenderTargetKind::Texture2DMultisample;
            }
            desc.multisample_count = self.msaa_samples;
        } else if desc.option.contains(RenderTargetOption::SSAA) && self.ssaa_enabled {
            desc.width *= 2;
            desc.height *= 2;
        }
        desc
    }

    /// Create or replace the target `name`.
    ///
    /// A replaced target's handle is released. An immutable target that
    /// already exists is returned untouched. When allocation fails any
    /// previous target of that name is released as well and nothing is
    /// inserted.
    pub fn create_rendertarget(&mut self, name: &str, desc: RenderTargetDesc) -> Result<&RenderTarget, RenderTargetError> {
        if desc.immutable && self.immutable_names.contains(name) && self.rendertargets.contains_key(name) {
            return self
                .rendertargets
                .get(name)
                .ok_or_else(|| RenderTargetError::NotFound(name.to_string()));
        }

        let effective = self.apply_options(&desc);
        let handle = match self.device.create_texture(&effective) {
            Ok(handle) => handle,
            Err(source) => {
                if let Some(previous) = self.rendertargets.remove(name) {
                    self.device.release_texture(previous.handle);
                }
                self.immutable_names.remove(name);
                let error = RenderTargetError::Device {
                    name: name.to_string(),
                    source,
                };
                log::error!("{error}");
                return Err(error);
            }
        };

        if desc.immutable {
            self.immutable_names.insert(name.to_string());
        } else {
            self.immutable_names.remove(name);
        }

        let target = RenderTarget {
            name: name.to_string(),
            desc: effective,
            requested: desc,
            handle,
        };
        if let Some(previous) = self.rendertargets.insert(name.to_string(), target) {
            self.device.release_texture(previous.handle);
        }
        log::debug!("Created render target {name}");

        self.rendertargets
            .get(name)
            .ok_or_else(|| RenderTargetError::NotFound(name.to_string()))
    }

    /// Look up a persistent target
    pub fn get_rendertarget(&self, name: &str) -> Option<&RenderTarget> {
        let target = self.rendertargets.get(name);
        if target.is_none() {
            log::warn!("Render target {name} does not exist");
        }
        target
    }

    /// Temporary target `name` shaped like `reference` with both edges
    /// multiplied by `scale`; cached until the temporaries are cleared
    pub fn get_temporary(&mut self, name: &str, reference: &str, scale: f32) -> Option<&RenderTarget> {
        if !self.temp_rendertargets.contains_key(name) {
            let Some(reference_target) = self
                .rendertargets
                .get(reference)
                .or_else(|| self.temp_rendertargets.get(reference))
            else {
                log::warn!("Failed to get temporary {name}: reference {reference} does not exist");
                return None;
            };

            let desc = reference_target.desc.scaled(scale);
            match self.device.create_texture(&desc) {
                Ok(handle) => {
                    let target = RenderTarget {
                        name: name.to_string(),
                        desc: desc.clone(),
                        requested: desc,
                        handle,
                    };
                    self.temp_rendertargets.insert(name.to_string(), target);
                }
                Err(error) => {
                    log::warn!("Failed to get temporary {name}: {error}");
                    return None;
                }
            }
        }
        self.temp_rendertargets.get(name)
    }

    /// Rebuild every mutable persistent target from its requested descriptor.
    ///
    /// Temporaries are dropped. Every target is attempted; the first failure
    /// is returned.
    pub fn recreate_rendertargets(&mut self) -> Result<(), RenderTargetError> {
        self.clear_temporary();

        let mut rebuild: Vec<(String, RenderTargetDesc)> = self
            .rendertargets
            .values()
            .filter(|target| !target.requested.immutable)
            .map(|target| (target.name.clone(), target.requested.clone()))
            .collect();
        rebuild.sort_by(|a, b| a.0.cmp(&b.0));

        let mut first_error = None;
        for (name, desc) in rebuild {
            if let Err(error) = self.create_rendertarget(&name, desc) {
                first_error.get_or_insert(error);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// Build the standard set for a `width` x `height` screen.
    ///
    /// Mutable targets from a previous call are released first; immutable
    /// ones are kept.
    pub fn create_rendertargets(&mut self, width: u32, height: u32) -> Result<(), RenderTargetError> {
        self.width = width;
        self.height = height;
        self.clear(false);

        let mut first_error = None;
        for (name, desc) in self.standard_targets(width, height) {
            if let Err(error) = self.create_rendertarget(name, desc) {
                first_error.get_or_insert(error);
            }
        }
        log::info!(
            "Created {} render targets for {width}x{height}",
            self.rendertargets.len()
        );
        first_error.map_or(Ok(()), Err)
    }

    fn standard_targets(&self, width: u32, height: u32) -> Vec<(&'static str, RenderTargetDesc)> {
        use InternalFormat::{Depth24Stencil8, Depth32F, Rg32F, Rgba16F, Rgba8, R16F, R32F};
        use RenderTargetKind::{RenderBuffer, Texture2DArray, Texture2DMultisample, TextureCube};
        type Names = RenderTargetNames;

        let full = |format| RenderTargetDesc::texture_2d(width, height, format);
        let divided = |format, divisor: u32| {
            RenderTargetDesc::texture_2d((width / divisor).max(1), (height / divisor).max(1), format)
        };
        let square = |format, size| RenderTargetDesc::texture_2d(size, size, format);
        let ssaa = RenderTargetOption::SSAA;
        let hdr_option = RenderTargetOption::MSAA | RenderTargetOption::SSAA;
        let shadow_size = self.shadow_map_size;

        let mut targets = vec![
            (Names::BACKBUFFER, full(Rgba8)),
            (Names::DEPTHSTENCIL, full(Depth24Stencil8)),
            (Names::SCREENBUFFER, full(Rgba8)),
            (Names::DEPTH, full(Depth32F).with_option(ssaa)),
            (Names::OBJECT_ID, square(R32F, OBJECT_ID_SIZE).with_filter(FilterMode::Nearest, FilterMode::Nearest)),
            (Names::OBJECT_ID_DEPTH, square(Depth32F, OBJECT_ID_SIZE)),
            (Names::HDR, full(Rgba16F).with_option(hdr_option)),
            (Names::HDR_TEMP, full(Rgba16F).with_option(hdr_option)),
            (Names::HDR_BACKUP, full(Rgba16F).with_option(hdr_option)),
        ];

        for (level, name) in Names::BLOOM.into_iter().enumerate() {
            targets.push((name, divided(Rgba16F, 2 << level).with_option(ssaa)));
        }

        targets.extend([
            (Names::LIGHT_SHAFT, divided(Rgba16F, 2)),
            (
                Names::LIGHT_PROBE_ATMOSPHERE,
                RenderTargetDesc::new(TextureCube, LIGHT_PROBE_SIZE, LIGHT_PROBE_SIZE, Rgba16F)
                    .with_filter(FilterMode::LinearMipmapLinear, FilterMode::Linear)
                    .immutable(),
            ),
            (Names::ATMOSPHERE, divided(Rgba16F, 4).immutable()),
            (Names::DIFFUSE, full(Rgba8).with_option(ssaa)),
            (Names::MATERIAL, full(Rgba8).with_option(ssaa)),
            (Names::WORLD_NORMAL, full(Rgba8).with_option(ssaa)),
            (Names::VELOCITY, full(Rg32F).with_option(ssaa)),
            (Names::LINEAR_DEPTH, full(R32F)),
            (Names::SSAO, divided(R16F, 2)),
            (Names::STATIC_SHADOWMAP, square(Depth32F, shadow_size)),
            (Names::DYNAMIC_SHADOWMAP, square(Depth32F, shadow_size)),
            (Names::COMPOSITE_SHADOWMAP, square(R32F, shadow_size)),
            (Names::TEMP_RGBA8, full(Rgba8)),
            (
                Names::TEMP_2D_ARRAY,
                RenderTargetDesc::new(Texture2DArray, width, height, Rgba8).with_layers(4),
            ),
            (
                Names::TEMP_MULTISAMPLE_X4,
                RenderTargetDesc::new(Texture2DMultisample, width, height, Rgba8).with_multisample(4),
            ),
            (
                Names::TEMP_RENDER_BUFFER_MULTISAMPLE,
                RenderTargetDesc::new(RenderBuffer, width, height, Rgba8).with_multisample(4),
            ),
            (
                Names::TEMP_HEIGHT_MAP,
                square(R32F, HEIGHT_MAP_SIZE).with_wrap(WrapMode::Repeat),
            ),
        ]);
        targets
    }

    /// Release persistent targets, keeping immutable ones unless `force`,
    /// then every temporary
    pub fn clear(&mut self, force: bool) {
        let names: Vec<String> = self
            .rendertargets
            .keys()
            .filter(|name| force || !self.immutable_names.contains(*name))
            .cloned()
            .collect();
        for name in names {
            if let Some(target) = self.rendertargets.remove(&name) {
                self.device.release_texture(target.handle);
            }
        }
        if force {
            self.immutable_names.clear();
        }
        self.clear_temporary();
    }

    /// Release every temporary target
    pub fn clear_temporary(&mut self) {
        for (_, target) in self.temp_rendertargets.drain() {
            self.device.release_texture(target.handle);
        }
    }

    /// Number of persistent targets
    pub fn rendertarget_count(&self) -> usize {
        self.rendertargets.len()
    }

    /// Number of cached temporaries
    pub fn temporary_count(&self) -> usize {
        self.temp_rendertargets.len()
    }

    /// Sorted names of the persistent targets
    pub fn rendertarget_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.rendertargets.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl Drop for RenderTargetManager {
    fn drop(&mut self) {
        self.clear(true);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::device::HeadlessDevice;

    fn manager(config: &RenderConfig) -> RenderTargetManager {
        RenderTargetManager::new(Box::new(HeadlessDevice::new()), config)
    }

    #[test]
    fn test_create_twice_leaves_one_live_handle() {
        let mut targets = manager(&RenderConfig::default());
        let desc = RenderTargetDesc::texture_2d(256, 256, InternalFormat::Rgba8);
        let first = targets.create_rendertarget("COLOR", desc.clone()).unwrap().handle();
        let second = targets.create_rendertarget("COLOR", desc).unwrap().handle();

        assert_ne!(first, second);
        assert!(!targets.device().is_live(first));
        assert!(targets.device().is_live(second));
        assert_eq!(targets.device().live_count(), 1);
        assert_eq!(targets.rendertarget_count(), 1);
    }

    #[test]
    fn test_msaa_and_ssaa_options() {
        let config = RenderConfig {
            msaa_enabled: true,
            msaa_samples: 8,
            ssaa_enabled: true,
            ..RenderConfig::default()
        };
        let mut targets = manager(&config);
        let base = RenderTargetDesc::texture_2d(100, 50, InternalFormat::Rgba16F);

        let both = targets
            .create_rendertarget("BOTH", base.clone().with_option(RenderTargetOption::MSAA | RenderTargetOption::SSAA))
            .unwrap();
        assert_eq!(both.kind(), RenderTargetKind::Texture2DMultisample);
        assert_eq!(both.desc().multisample_count, 8);
        assert_eq!(both.width(), 100);

        let ssaa = targets
            .create_rendertarget("SSAA", base.clone().with_option(RenderTargetOption::SSAA))
            .unwrap();
        assert_eq!((ssaa.width(), ssaa.height()), (200, 100));
        assert_eq!(ssaa.requested_desc().width, 100);

        let plain = targets.create_rendertarget("PLAIN", base).unwrap();
        assert_eq!(plain.kind(), RenderTargetKind::Texture2D);
        assert_eq!((plain.width(), plain.height()), (100, 50));
    }

    #[test]
    fn test_options_ignored_when_disabled() {
        let mut targets = manager(&RenderConfig::default());
        let desc = RenderTargetDesc::texture_2d(64, 64, InternalFormat::Rgba16F)
            .with_option(RenderTargetOption::MSAA | RenderTargetOption::SSAA);
        let target = targets.create_rendertarget("HDR", desc).unwrap();
        assert_eq!(target.kind(), RenderTargetKind::Texture2D);
        assert_eq!(target.width(), 64);
    }

    #[test]
    fn test_immutable_targets_survive_soft_clear() {
        let mut targets = manager(&RenderConfig::default());
        let desc = RenderTargetDesc::texture_2d(32, 32, InternalFormat::Rgba16F).immutable();
        let first = targets.create_rendertarget("LUT", desc.clone()).unwrap().handle();
        let again = targets.create_rendertarget("LUT", desc).unwrap().handle();
        assert_eq!(first, again);

        targets
            .create_rendertarget("SCRATCH", RenderTargetDesc::texture_2d(8, 8, InternalFormat::R32F))
            .unwrap();
        targets.clear(false);
        assert_eq!(targets.rendertarget_names(), vec!["LUT"]);

        targets.clear(true);
        assert_eq!(targets.rendertarget_count(), 0);
        assert_eq!(targets.device().live_count(), 0);
    }

    #[test]
    fn test_temporary_cache() {
        let mut targets = manager(&RenderConfig::default());
        targets
            .create_rendertarget("SOURCE", RenderTargetDesc::texture_2d(640, 480, InternalFormat::Rgba8))
            .unwrap();

        let half = targets.get_temporary("HALF", "SOURCE", 0.5).unwrap();
        assert_eq!((half.width(), half.height()), (320, 240));
        assert_eq!(half.internal_format(), InternalFormat::Rgba8);
        let handle = half.handle();

        let cached = targets.get_temporary("HALF", "SOURCE", 0.25).unwrap();
        assert_eq!(cached.handle(), handle);
        assert!(targets.get_temporary("OTHER", "MISSING", 1.0).is_none());

        targets.clear_temporary();
        assert_eq!(targets.temporary_count(), 0);
        assert!(!targets.device().is_live(handle));
        assert!(targets.get_rendertarget("SOURCE").is_some());
    }

    #[test]
    fn test_resize_rebuilds_standard_set() {
        let mut targets = manager(&RenderConfig::default());
        targets.create_rendertargets(1280, 720).unwrap();
        let old_back = targets.get_rendertarget(RenderTargetNames::BACKBUFFER).unwrap().handle();
        let old_depth = targets.get_rendertarget(RenderTargetNames::DEPTHSTENCIL).unwrap().handle();
        let probe = targets
            .get_rendertarget(RenderTargetNames::LIGHT_PROBE_ATMOSPHERE)
            .unwrap()
            .handle();

        targets.create_rendertargets(800, 600).unwrap();
        let back = targets.get_rendertarget(RenderTargetNames::BACKBUFFER).unwrap();
        assert_eq!((back.width(), back.height()), (800, 600));
        assert_eq!(back.internal_format(), InternalFormat::Rgba8);
        let depth = targets.get_rendertarget(RenderTargetNames::DEPTHSTENCIL).unwrap();
        assert_eq!((depth.width(), depth.height()), (800, 600));
        assert_eq!(depth.internal_format(), InternalFormat::Depth24Stencil8);

        assert!(!targets.device().is_live(old_back));
        assert!(!targets.device().is_live(old_depth));
        assert_eq!(
            targets
                .get_rendertarget(RenderTargetNames::LIGHT_PROBE_ATMOSPHERE)
                .unwrap()
                .handle(),
            probe
        );
        assert_eq!(targets.device().live_count(), targets.rendertarget_count());
    }

    #[test]
    fn test_standard_set_sizes() {
        let mut targets = manager(&RenderConfig::default());
        targets.create_rendertargets(1024, 512).unwrap();
        let bloom_4 = targets.get_rendertarget(RenderTargetNames::BLOOM[4]).unwrap();
        assert_eq!((bloom_4.width(), bloom_4.height()), (32, 16));
        let object_id = targets.get_rendertarget(RenderTargetNames::OBJECT_ID).unwrap();
        assert_eq!((object_id.width(), object_id.height()), (512, 512));
        let shadow = targets.get_rendertarget(RenderTargetNames::STATIC_SHADOWMAP).unwrap();
        assert_eq!(shadow.width(), 2048);
        let cube = targets
            .get_rendertarget(RenderTargetNames::LIGHT_PROBE_ATMOSPHERE)
            .unwrap();
        assert_eq!(cube.kind(), RenderTargetKind::TextureCube);
    }

    #[test]
    fn test_failed_allocation_releases_previous() {
        let device = HeadlessDevice::new().with_max_texture_size(1024);
        let mut targets = RenderTargetManager::new(Box::new(device), &RenderConfig::default());
        targets
            .create_rendertarget("BIG", RenderTargetDesc::texture_2d(512, 512, InternalFormat::Rgba8))
            .unwrap();

        let result = targets.create_rendertarget("BIG", RenderTargetDesc::texture_2d(4096, 512, InternalFormat::Rgba8));
        assert!(matches!(result, Err(RenderTargetError::Device { .. })));
        assert!(targets.get_rendertarget("BIG").is_none());
        assert_eq!(targets.device().live_count(), 0);
    }

    #[test]
    fn test_recreate_applies_new_options() {
        let mut targets = manager(&RenderConfig::default());
        targets.create_rendertargets(320, 240).unwrap();
        targets.get_temporary("TMP", RenderTargetNames::HDR, 0.5).unwrap();
        assert_eq!(
            targets.get_rendertarget(RenderTargetNames::HDR).unwrap().kind(),
            RenderTargetKind::Texture2D
        );

        targets.apply_config(&RenderConfig {
            msaa_enabled: true,
            ..RenderConfig::default()
        });
        targets.recreate_rendertargets().unwrap();
        let hdr = targets.get_rendertarget(RenderTargetNames::HDR).unwrap();
        assert_eq!(hdr.kind(), RenderTargetKind::Texture2DMultisample);
        assert_eq!(hdr.desc().multisample_count, 4);
        assert_eq!(targets.temporary_count(), 0);
        assert_eq!(targets.device().live_count(), targets.rendertarget_count());
    }
}
