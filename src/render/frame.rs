use crate::foundation::{
    color::Color,
    core::Size,
    error::{GenSceneError, GenSceneResult},
    math::mul_div255_u8,
};

/// Largest edge, in pixels, of a frame built from outside input.
pub const MAX_FRAME_DIM: u32 = 8192;

/// One premultiplied RGBA8 pixel.
pub type PremulRgba8 = [u8; 4];

/// Source-over of premultiplied `src` onto `dst`, scaled by `opacity`.
pub fn over(dst: PremulRgba8, src: PremulRgba8, opacity: f32) -> PremulRgba8 {
    let opacity = opacity.clamp(0.0, 1.0);
    if opacity <= 0.0 || src[3] == 0 {
        return dst;
    }
    let op = ((opacity * 255.0).round() as i32).clamp(0, 255) as u16;
    let sa = mul_div255_u8(u16::from(src[3]), op);
    if sa == 0 {
        return dst;
    }
    let inv = 255u16 - u16::from(sa);

    let mut out = [0u8; 4];
    out[3] = sa.saturating_add(mul_div255_u8(u16::from(dst[3]), inv));
    for i in 0..3 {
        let sc = mul_div255_u8(u16::from(src[i]), op);
        let dc = mul_div255_u8(u16::from(dst[i]), inv);
        out[i] = sc.saturating_add(dc);
    }
    out
}

/// Premultiplied RGBA8 pixel buffer, row-major, no padding.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameBuffer {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// `width * height * 4` bytes.
    pub data: Vec<u8>,
}

impl FrameBuffer {
    /// Transparent buffer of `size`.
    pub fn new(size: Size) -> Self {
        Self {
            width: size.width,
            height: size.height,
            data: vec![0; size.rgba8_len()],
        }
    }

    /// Buffer of `size` filled with `color`.
    pub fn filled(size: Size, color: Color) -> Self {
        let px = color.to_rgba8_premul();
        let mut data = Vec::with_capacity(size.rgba8_len());
        for _ in 0..(size.width as usize * size.height as usize) {
            data.extend_from_slice(&px);
        }
        Self {
            width: size.width,
            height: size.height,
            data,
        }
    }

    /// Wrap premultiplied bytes, checking their length.
    pub fn from_premul(size: Size, data: Vec<u8>) -> GenSceneResult<Self> {
        if data.len() != size.rgba8_len() {
            return Err(GenSceneError::validation(format!(
                "frame {size} expects {} bytes, got {}",
                size.rgba8_len(),
                data.len()
            )));
        }
        Ok(Self {
            width: size.width,
            height: size.height,
            data,
        })
    }

    /// Buffer dimensions.
    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Pixel at `(x, y)`.
    pub fn pixel(&self, x: u32, y: u32) -> Option<PremulRgba8> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;
        Some([
            self.data[i],
            self.data[i + 1],
            self.data[i + 2],
            self.data[i + 3],
        ])
    }

    /// Composite an equally sized premultiplied buffer over this one.
    pub fn over_in_place(&mut self, src: &[u8], opacity: f32) -> GenSceneResult<()> {
        if self.data.len() != src.len() {
            return Err(GenSceneError::validation(
                "over_in_place expects equal-length rgba8 buffers",
            ));
        }
        for (d, s) in self.data.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
            let out = over([d[0], d[1], d[2], d[3]], [s[0], s[1], s[2], s[3]], opacity);
            d.copy_from_slice(&out);
        }
        Ok(())
    }

    /// Composite `src` with its top-left corner at `(x, y)`, clipped to this buffer.
    pub fn blit_over(&mut self, src: &FrameBuffer, x: i64, y: i64) {
        let (dw, dh) = (i64::from(self.width), i64::from(self.height));
        for sy in 0..i64::from(src.height) {
            let ty = y + sy;
            if !(0..dh).contains(&ty) {
                continue;
            }
            for sx in 0..i64::from(src.width) {
                let tx = x + sx;
                if !(0..dw).contains(&tx) {
                    continue;
                }
                let si = ((sy * i64::from(src.width) + sx) * 4) as usize;
                let di = ((ty * dw + tx) * 4) as usize;
                let s = [
                    src.data[si],
                    src.data[si + 1],
                    src.data[si + 2],
                    src.data[si + 3],
                ];
                let d = [
                    self.data[di],
                    self.data[di + 1],
                    self.data[di + 2],
                    self.data[di + 3],
                ];
                self.data[di..di + 4].copy_from_slice(&over(d, s, 1.0));
            }
        }
    }

    /// Straight-alpha copy for encoders.
    pub fn to_straight_rgba8(&self) -> Vec<u8> {
        let mut out = self.data.clone();
        for px in out.chunks_exact_mut(4) {
            let a = u16::from(px[3]);
            if a == 0 {
                px[..3].fill(0);
            } else if a < 255 {
                for c in &mut px[..3] {
                    *c = ((u16::from(*c) * 255 + a / 2) / a).min(255) as u8;
                }
            }
        }
        out
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/frame.rs"]
mod tests;
