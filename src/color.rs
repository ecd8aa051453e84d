//! Floating-point RGBA color shared by text, tints and checkbox fades.

/// RGBA color with channels in `[0.0, 1.0]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rgba {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Rgba {
    pub const BLACK: Self = Self::new(0.0, 0.0, 0.0, 1.0);
    pub const WHITE: Self = Self::new(1.0, 1.0, 1.0, 1.0);
    pub const TRANSPARENT: Self = Self::new(0.0, 0.0, 0.0, 0.0);

    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Decode a packed `0xAARRGGBB` value.
    pub fn from_argb32(argb: u32) -> Self {
        let channel = |shift: u32| ((argb >> shift) & 0xff) as f32 / 255.0;
        Self {
            r: channel(16),
            g: channel(8),
            b: channel(0),
            a: channel(24),
        }
    }

    /// Pack into `0xAARRGGBB`, clamping each channel.
    pub fn to_argb32(self) -> u32 {
        let channel = |v: f32| (v.clamp(0.0, 1.0) * 255.0 + 0.5) as u32;
        (channel(self.a) << 24) | (channel(self.r) << 16) | (channel(self.g) << 8) | channel(self.b)
    }

    /// Move every channel toward `target` by at most `step`.
    ///
    /// Channels already within `step` of the target snap onto it exactly.
    /// Returns `true` while any channel still had to move by a full step.
    pub fn step_toward(&mut self, target: Rgba, step: f32) -> bool {
        let mut moving = false;
        for (current, want) in [
            (&mut self.r, target.r),
            (&mut self.g, target.g),
            (&mut self.b, target.b),
            (&mut self.a, target.a),
        ] {
            if want > *current + step {
                *current += step;
                moving = true;
            } else if want < *current - step {
                *current -= step;
                moving = true;
            } else {
                *current = want;
            }
        }
        moving
    }
}

impl Default for Rgba {
    fn default() -> Self {
        Self::WHITE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn argb_decode_splits_channels() {
        let c = Rgba::from_argb32(0xff00_80ff);
        assert_eq!(c.a, 1.0);
        assert_eq!(c.r, 0.0);
        assert!((c.g - 128.0 / 255.0).abs() < 1e-6);
        assert_eq!(c.b, 1.0);
        assert_eq!(c.to_argb32(), 0xff00_80ff);
    }

    #[test]
    fn step_toward_converges_and_snaps() {
        let mut c = Rgba::new(0.0, 0.0, 0.0, 0.0);
        let target = Rgba::new(0.25, 0.0, 0.05, 1.0);
        let mut steps = 0;
        while c.step_toward(target, 0.1) {
            steps += 1;
            assert!(steps < 20, "fade never converged");
        }
        assert_eq!(c, target);
        assert!(steps >= 9);
    }
}
