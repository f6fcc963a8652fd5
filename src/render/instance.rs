use bytemuck::{Pod, Zeroable};

/// Shape kinds understood by the fragment shader.
pub const KIND_ELLIPSE: u32 = 0;
/// Lower-half arc stroke (the mouth). `param` = stroke width in px.
pub const KIND_ARC: u32 = 1;
/// Rounded rectangle. `param` = corner radius in px.
pub const KIND_ROUNDED_RECT: u32 = 2;
/// A "Z" stroke glyph. `param` = stroke width in px.
pub const KIND_GLYPH_Z: u32 = 3;
/// The "Yay!" glyph row. `param` = stroke width in px.
pub const KIND_GLYPH_YAY: u32 = 4;

/// Per-instance data uploaded to the GPU each frame.
/// Stride = 28 bytes.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct ShapeInstance {
    /// Shape center in widget-local pixels.
    pub center: [f32; 2],
    /// Half extents in pixels.
    pub half_size: [f32; 2],
    /// RGBA packed as u32.
    pub color: u32,
    /// One of the KIND_* constants.
    pub kind: u32,
    /// Kind-specific scalar (stroke width or corner radius).
    pub param: f32,
}

/// Pack RGBA bytes the way the shader unpacks them.
pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> u32 {
    (r as u32) << 24 | (g as u32) << 16 | (b as u32) << 8 | (a as u32)
}
