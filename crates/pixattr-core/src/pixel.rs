//! Pixels and channel masks
//!
//! A [`Pixel`] carries red, green, blue, opacity, and index samples. The
//! opacity sample follows the "0 is opaque" convention: a fully opaque
//! pixel has `opacity == 0` and a fully transparent one has
//! `opacity == QuantumRange`.
//!
//! The index sample has two meanings depending on the image: for
//! [`StorageClass::Indexed`](crate::StorageClass::Indexed) images it is the
//! palette index, and in the CMYK separation colorspace it is the black
//! channel.

use crate::quantum::Quantum;
use std::ops::{BitAnd, BitOr, BitOrAssign};

/// Opacity value of a fully opaque pixel.
pub const OPAQUE_OPACITY: Quantum = 0;

/// One pixel: channel samples in `[0, QuantumRange]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Pixel {
    pub red: Quantum,
    pub green: Quantum,
    pub blue: Quantum,
    /// 0 = opaque, QuantumRange = transparent
    pub opacity: Quantum,
    /// Palette index or black channel
    pub index: Quantum,
}

impl Pixel {
    /// Create an opaque RGB pixel.
    pub const fn rgb(red: Quantum, green: Quantum, blue: Quantum) -> Self {
        Self {
            red,
            green,
            blue,
            opacity: OPAQUE_OPACITY,
            index: 0,
        }
    }

    /// Create an RGB pixel with an explicit opacity.
    pub const fn rgbo(red: Quantum, green: Quantum, blue: Quantum, opacity: Quantum) -> Self {
        Self {
            red,
            green,
            blue,
            opacity,
            index: 0,
        }
    }

    /// Create an opaque gray pixel.
    pub const fn gray(value: Quantum) -> Self {
        Self::rgb(value, value, value)
    }

    /// Alpha sample derived from opacity.
    #[inline]
    pub fn alpha(&self, quantum_range: Quantum) -> Quantum {
        quantum_range.saturating_sub(self.opacity)
    }

    /// Whether red, green and blue are equal.
    #[inline]
    pub fn is_gray(&self) -> bool {
        self.red == self.green && self.green == self.blue
    }

    /// Whether the pixel is gray and either black or white.
    #[inline]
    pub fn is_monochrome(&self, quantum_range: Quantum) -> bool {
        self.is_gray() && (self.red == 0 || self.red == quantum_range)
    }

    /// Copy the color samples of `other`, keeping this pixel's index.
    #[inline]
    pub fn set_color(&mut self, other: &Pixel) {
        self.red = other.red;
        self.green = other.green;
        self.blue = other.blue;
        self.opacity = other.opacity;
    }

    /// Get one channel sample.
    #[inline]
    pub fn channel(&self, channel: Channel) -> Quantum {
        match channel {
            Channel::Red => self.red,
            Channel::Green => self.green,
            Channel::Blue => self.blue,
            Channel::Opacity => self.opacity,
            Channel::Index => self.index,
        }
    }

    /// Get a mutable reference to one channel sample.
    #[inline]
    pub fn channel_mut(&mut self, channel: Channel) -> &mut Quantum {
        match channel {
            Channel::Red => &mut self.red,
            Channel::Green => &mut self.green,
            Channel::Blue => &mut self.blue,
            Channel::Opacity => &mut self.opacity,
            Channel::Index => &mut self.index,
        }
    }
}

/// A single pixel channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Red,
    Green,
    Blue,
    Opacity,
    Index,
}

impl Channel {
    /// All channels, in mask bit order.
    pub const ALL: [Channel; 5] = [
        Channel::Red,
        Channel::Green,
        Channel::Blue,
        Channel::Opacity,
        Channel::Index,
    ];

    fn bit(self) -> u8 {
        match self {
            Channel::Red => 0x01,
            Channel::Green => 0x02,
            Channel::Blue => 0x04,
            Channel::Opacity => 0x08,
            Channel::Index => 0x20,
        }
    }
}

/// Set of channels an operation applies to.
///
/// # Examples
///
/// ```
/// use pixattr_core::{Channel, ChannelMask};
///
/// let mask = ChannelMask::RED | ChannelMask::BLUE;
/// assert!(mask.contains(Channel::Red));
/// assert!(!mask.contains(Channel::Green));
/// assert!(ChannelMask::COMPOSITE.contains(Channel::Index));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ChannelMask(u8);

impl ChannelMask {
    pub const NONE: ChannelMask = ChannelMask(0);
    pub const RED: ChannelMask = ChannelMask(0x01);
    pub const GREEN: ChannelMask = ChannelMask(0x02);
    pub const BLUE: ChannelMask = ChannelMask(0x04);
    pub const OPACITY: ChannelMask = ChannelMask(0x08);
    pub const INDEX: ChannelMask = ChannelMask(0x20);
    /// Red, green and blue.
    pub const RGB: ChannelMask = ChannelMask(0x07);
    /// Every channel: red, green, blue, opacity and index.
    pub const COMPOSITE: ChannelMask = ChannelMask(0x2F);

    /// Raw mask bits.
    #[inline]
    pub fn bits(self) -> u8 {
        self.0
    }

    /// Whether `channel` is selected.
    #[inline]
    pub fn contains(self, channel: Channel) -> bool {
        self.0 & channel.bit() != 0
    }

    /// Whether no channel is selected.
    #[inline]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Drop `channel` from the mask.
    #[inline]
    pub fn without(self, channel: Channel) -> Self {
        ChannelMask(self.0 & !channel.bit())
    }

    /// Selected channels, in mask bit order.
    pub fn channels(self) -> impl Iterator<Item = Channel> {
        Channel::ALL.into_iter().filter(move |c| self.contains(*c))
    }
}

impl From<Channel> for ChannelMask {
    fn from(channel: Channel) -> Self {
        ChannelMask(channel.bit())
    }
}

impl BitOr for ChannelMask {
    type Output = ChannelMask;

    fn bitor(self, rhs: ChannelMask) -> ChannelMask {
        ChannelMask(self.0 | rhs.0)
    }
}

impl BitOrAssign for ChannelMask {
    fn bitor_assign(&mut self, rhs: ChannelMask) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for ChannelMask {
    type Output = ChannelMask;

    fn bitand(self, rhs: ChannelMask) -> ChannelMask {
        ChannelMask(self.0 & rhs.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_channels() {
        let mask = ChannelMask::RGB | ChannelMask::OPACITY;
        let channels: Vec<Channel> = mask.channels().collect();
        assert_eq!(
            channels,
            vec![Channel::Red, Channel::Green, Channel::Blue, Channel::Opacity]
        );
        assert!(!mask.without(Channel::Opacity).contains(Channel::Opacity));
    }

    #[test]
    fn test_monochrome() {
        assert!(Pixel::gray(0).is_monochrome(255));
        assert!(Pixel::gray(255).is_monochrome(255));
        assert!(!Pixel::gray(128).is_monochrome(255));
        assert!(!Pixel::rgb(255, 0, 255).is_monochrome(255));
    }

    #[test]
    fn test_alpha_from_opacity() {
        assert_eq!(Pixel::rgb(1, 2, 3).alpha(255), 255);
        assert_eq!(Pixel::rgbo(1, 2, 3, 255).alpha(255), 0);
    }
}
