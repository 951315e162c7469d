const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01B3;

fn fnv1a(state: u64, bytes: &[u8]) -> u64 {
    bytes
        .iter()
        .fold(state, |h, &b| (h ^ u64::from(b)).wrapping_mul(FNV_PRIME))
}

/// Derive the per-layer builder seed from the session seed.
///
/// Stable across runs so identical documents rebuild identical scenes.
pub(crate) fn layer_seed(session_seed: u64, layer: usize, kind_tag: u8) -> u64 {
    let h = fnv1a(FNV_OFFSET_BASIS, &session_seed.to_le_bytes());
    let h = fnv1a(h, &(layer as u64).to_le_bytes());
    fnv1a(h, &[kind_tag])
}

/// SplitMix64 generator used by all procedural builders.
#[derive(Clone, Copy, Debug)]
pub struct Rng64 {
    state: u64,
}

impl Rng64 {
    /// Seed a new generator.
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    /// Next raw 64-bit value.
    pub fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }

    /// Uniform value in `[0, 1)` with 53 bits of precision.
    pub fn next_f64_01(&mut self) -> f64 {
        let v = self.next_u64() >> 11;
        (v as f64) * (1.0 / ((1u64 << 53) as f64))
    }

    /// Uniform value in `[min, max)`; returns `min` when the range is empty.
    pub fn range_f64(&mut self, min: f64, max: f64) -> f64 {
        if max <= min {
            return min;
        }
        min + (max - min) * self.next_f64_01()
    }

    /// Uniform integer in `[min, max]` (inclusive).
    pub fn range_u32(&mut self, min: u32, max: u32) -> u32 {
        if max <= min {
            return min;
        }
        let span = u64::from(max - min) + 1;
        min + (self.next_u64() % span) as u32
    }

    /// Uniform value in `[-1, 1)`.
    pub fn signed_unit(&mut self) -> f64 {
        self.next_f64_01() * 2.0 - 1.0
    }
}

/// `x * y / 255`, rounded.
pub(crate) fn mul_div255_u8(x: u16, y: u16) -> u8 {
    ((u32::from(x) * u32::from(y) + 127) / 255) as u8
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/math.rs"]
mod tests;
