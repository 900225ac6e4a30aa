//! Straight (non-premultiplied) RGBA colours with 8 bits per channel.

use crate::color_565::Color565;

/// Represents a single RGBA8888 colour, as stored in palettes.
///
/// The field order matches the in-memory order of a palette entry, so two
/// palettes can be compared byte-for-byte by comparing their colours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(C)]
pub struct Color8888 {
    /// Red component (0-255)
    pub r: u8,
    /// Green component (0-255)
    pub g: u8,
    /// Blue component (0-255)
    pub b: u8,
    /// Alpha component (0-255)
    pub a: u8,
}

impl Color8888 {
    /// Fully opaque white; the value freshly allocated palette entries take.
    pub const OPAQUE_WHITE: Self = Self::new(255, 255, 255, 255);

    /// Constructs a new [`Color8888`] from the specified red, green, blue, and alpha components.
    ///
    /// Each parameter represents the intensity of its corresponding colour channel (0–255).
    ///
    /// # Examples
    ///
    /// ```
    /// use pixel_blit_common::color_8888::Color8888;
    ///
    /// let pixel = Color8888::new(255, 0, 0, 255);
    /// assert_eq!(pixel.r, 255);
    /// assert_eq!(pixel.g, 0);
    /// assert_eq!(pixel.b, 0);
    /// assert_eq!(pixel.a, 255);
    /// ```
    #[inline]
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Constructs an opaque colour from red, green and blue.
    #[inline]
    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }

    /// Squared Euclidean distance between two colours over all four channels.
    ///
    /// This is the metric nearest-colour palette searches use; zero means the
    /// colours are identical.
    ///
    /// ```
    /// use pixel_blit_common::color_8888::Color8888;
    ///
    /// let a = Color8888::new(10, 20, 30, 255);
    /// let b = Color8888::new(13, 16, 30, 255);
    /// assert_eq!(a.distance_squared(&b), 9 + 16);
    /// ```
    #[inline]
    pub fn distance_squared(&self, other: &Self) -> u32 {
        let rd = self.r as i32 - other.r as i32;
        let gd = self.g as i32 - other.g as i32;
        let bd = self.b as i32 - other.b as i32;
        let ad = self.a as i32 - other.a as i32;
        (rd * rd + gd * gd + bd * bd + ad * ad) as u32
    }

    /// Scales each channel by the matching modulation factor (`c * m / 255`).
    #[inline]
    pub fn modulate(&self, modulation: Color8888) -> Self {
        Self {
            r: ((self.r as u32 * modulation.r as u32) / 255) as u8,
            g: ((self.g as u32 * modulation.g as u32) / 255) as u8,
            b: ((self.b as u32 * modulation.b as u32) / 255) as u8,
            a: ((self.a as u32 * modulation.a as u32) / 255) as u8,
        }
    }

    /// Truncates this colour to RGB565, dropping alpha.
    #[inline]
    pub fn to_color_565(&self) -> Color565 {
        Color565::from_rgb(self.r, self.g, self.b)
    }
}
