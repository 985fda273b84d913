//! [`PixelColor`]: an RGB(W) LED color.

use std::fmt;

/// A single LED color: red, green, blue and an optional white channel.
///
/// Channels are stored as `u8`, so every value is in range by construction.
/// The wider constructors ([`clamped`](PixelColor::clamped),
/// [`from_normalized`](PixelColor::from_normalized),
/// [`scale`](PixelColor::scale)) clamp instead of failing, since derived
/// arithmetic such as dimming routinely overshoots.
///
/// Two colors are equal iff all channels match; an absent white channel is
/// not equal to a white channel of zero.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PixelColor {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
    pub white: Option<u8>,
}

#[inline]
fn clamp_channel(v: i32) -> u8 {
    v.clamp(0, 255) as u8
}

#[inline]
fn round_channel(v: f32) -> u8 {
    if v.is_nan() {
        return 0;
    }
    v.round().clamp(0.0, 255.0) as u8
}

impl PixelColor {
    /// All channels off (no white channel).
    pub const OFF: Self = Self::rgb(0, 0, 0);

    /// Construct an RGB color.
    #[inline]
    pub const fn rgb(red: u8, green: u8, blue: u8) -> Self {
        Self {
            red,
            green,
            blue,
            white: None,
        }
    }

    /// Construct an RGBW color.
    #[inline]
    pub const fn rgbw(red: u8, green: u8, blue: u8, white: u8) -> Self {
        Self {
            red,
            green,
            blue,
            white: Some(white),
        }
    }

    /// Construct an RGB color from arbitrary integers, clamping each channel
    /// to [0, 255].
    pub fn clamped(red: i32, green: i32, blue: i32) -> Self {
        Self::rgb(clamp_channel(red), clamp_channel(green), clamp_channel(blue))
    }

    /// Construct an RGBW color from arbitrary integers, clamping each channel
    /// to [0, 255].
    pub fn clamped_rgbw(red: i32, green: i32, blue: i32, white: i32) -> Self {
        Self::rgbw(
            clamp_channel(red),
            clamp_channel(green),
            clamp_channel(blue),
            clamp_channel(white),
        )
    }

    /// Construct an RGB color from normalized components in [0, 1].
    ///
    /// Components are scaled by 255 and truncated, so 0.5 becomes 127.
    pub fn from_normalized(red: f32, green: f32, blue: f32) -> Self {
        let d = |v: f32| (v.clamp(0.0, 1.0) * 255.0) as u8;
        Self::rgb(d(red), d(green), d(blue))
    }

    /// Return a copy with the white channel set.
    #[inline]
    pub const fn with_white(mut self, white: u8) -> Self {
        self.white = Some(white);
        self
    }

    /// Whether this color carries a white channel.
    #[inline]
    pub const fn is_rgbw(self) -> bool {
        self.white.is_some()
    }

    /// Scale every channel by `factor`, rounding to nearest and clamping to
    /// [0, 255]. Negative factors behave as zero.
    pub fn scale(self, factor: f32) -> Self {
        let factor = factor.max(0.0);
        let s = |c: u8| round_channel(c as f32 * factor);
        Self {
            red: s(self.red),
            green: s(self.green),
            blue: s(self.blue),
            white: self.white.map(s),
        }
    }

    /// The color packed as `0xWWRRGGBB`, the layout most WS281x drivers
    /// expect. A missing white channel packs as zero.
    #[inline]
    pub const fn to_u32(self) -> u32 {
        let w = match self.white {
            Some(w) => w,
            None => 0,
        };
        ((w as u32) << 24) | ((self.red as u32) << 16) | ((self.green as u32) << 8) | (self.blue as u32)
    }

    /// Unpack from `0xWWRRGGBB`. The white channel is present only when
    /// non-zero.
    #[inline]
    pub const fn from_u32(v: u32) -> Self {
        let w = ((v >> 24) & 0xFF) as u8;
        Self {
            red: ((v >> 16) & 0xFF) as u8,
            green: ((v >> 8) & 0xFF) as u8,
            blue: (v & 0xFF) as u8,
            white: if w == 0 { None } else { Some(w) },
        }
    }

    /// The RGB channels as a tuple.
    #[inline]
    pub const fn to_rgb(self) -> (u8, u8, u8) {
        (self.red, self.green, self.blue)
    }

    /// The RGBW channels as a tuple, white defaulting to zero.
    #[inline]
    pub const fn to_rgbw(self) -> (u8, u8, u8, u8) {
        let w = match self.white {
            Some(w) => w,
            None => 0,
        };
        (self.red, self.green, self.blue, w)
    }
}

impl From<(u8, u8, u8)> for PixelColor {
    fn from((r, g, b): (u8, u8, u8)) -> Self {
        Self::rgb(r, g, b)
    }
}

impl From<(u8, u8, u8, u8)> for PixelColor {
    fn from((r, g, b, w): (u8, u8, u8, u8)) -> Self {
        Self::rgbw(r, g, b, w)
    }
}

impl fmt::Display for PixelColor {
    /// Channels right-aligned to three places, `128,  0,  0` or
    /// `128,  1,  2,  3` when a white channel is present.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:3},{:3},{:3}", self.red, self.green, self.blue)?;
        if let Some(w) = self.white {
            write!(f, ",{w:3}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamping_constructors() {
        assert_eq!(PixelColor::clamped(300, -5, 128), PixelColor::rgb(255, 0, 128));
        assert_eq!(
            PixelColor::clamped_rgbw(0, 256, 1, -1),
            PixelColor::rgbw(0, 255, 1, 0)
        );
    }

    #[test]
    fn equality_covers_white_channel() {
        assert_eq!(PixelColor::rgb(1, 2, 3), PixelColor::rgb(1, 2, 3));
        assert_ne!(PixelColor::rgb(1, 2, 3), PixelColor::rgbw(1, 2, 3, 0));
        assert_ne!(PixelColor::rgbw(1, 2, 3, 4), PixelColor::rgbw(1, 2, 3, 5));
    }

    #[test]
    fn scale_rounds_and_clamps() {
        let c = PixelColor::rgbw(100, 201, 255, 3);
        assert_eq!(c.scale(0.5), PixelColor::rgbw(50, 101, 128, 2));
        assert_eq!(c.scale(0.0), PixelColor::rgbw(0, 0, 0, 0));
        assert_eq!(c.scale(2.0), PixelColor::rgbw(200, 255, 255, 6));
        assert_eq!(c.scale(-1.0), PixelColor::rgbw(0, 0, 0, 0));
        assert_eq!(PixelColor::rgb(10, 20, 30).scale(1.0), PixelColor::rgb(10, 20, 30));
    }

    #[test]
    fn packed_integer_layout() {
        let c = PixelColor::rgbw(0, 127, 255, 16);
        assert_eq!(c.to_u32(), 268468223);
        assert_eq!(PixelColor::from_u32(c.to_u32()), c);
        assert_eq!(PixelColor::rgb(0xAB, 0xCD, 0xEF).to_u32(), 0x00AB_CDEF);
    }

    #[test]
    fn normalized_components_truncate() {
        assert_eq!(
            PixelColor::from_normalized(0.0, 0.5, 1.0),
            PixelColor::rgb(0, 127, 255)
        );
        assert_eq!(
            PixelColor::from_normalized(-1.0, 2.0, 0.25),
            PixelColor::rgb(0, 255, 63)
        );
    }

    #[test]
    fn display_pads_channels() {
        assert_eq!(PixelColor::rgb(128, 0, 0).to_string(), "128,  0,  0");
        assert_eq!(PixelColor::rgbw(128, 1, 2, 3).to_string(), "128,  1,  2,  3");
    }
}
