use std::fmt;
use std::ops::Mul;

/// 8-bit RGB colour with an optional palette name.
///
/// Equality compares channels only, so a named `Green` equals an anonymous
/// `(0, 255, 0)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Colour {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
    pub name: Option<&'static str>,
}

impl Colour {
    pub const BLACK: Colour = Colour::named("Black", 0, 0, 0);
    pub const WHITE: Colour = Colour::named("White", 255, 255, 255);
    pub const GREY: Colour = Colour::named("Grey", 125, 125, 125);
    pub const CYAN: Colour = Colour::named("Cyan", 0, 255, 255);
    pub const GREEN: Colour = Colour::named("Green", 0, 255, 0);
    pub const MAGENTA: Colour = Colour::named("Magenta", 255, 0, 255);
    pub const YELLOW: Colour = Colour::named("Yellow", 255, 255, 0);
    pub const RED: Colour = Colour::named("Red", 255, 0, 0);
    pub const BLUE: Colour = Colour::named("Blue", 0, 0, 255);

    const PALETTE: [Colour; 8] = [
        Colour::WHITE,
        Colour::GREY,
        Colour::CYAN,
        Colour::GREEN,
        Colour::MAGENTA,
        Colour::YELLOW,
        Colour::RED,
        Colour::BLUE,
    ];

    pub const fn new(red: u8, green: u8, blue: u8) -> Self {
        Self {
            red,
            green,
            blue,
            name: None,
        }
    }

    pub const fn named(name: &'static str, red: u8, green: u8, blue: u8) -> Self {
        Self {
            red,
            green,
            blue,
            name: Some(name),
        }
    }

    /// Looks up a palette entry by its material name. Unknown names are black.
    pub fn from_name(name: &str) -> Self {
        Self::PALETTE
            .iter()
            .find(|c| c.name.is_some_and(|n| n.eq_ignore_ascii_case(name.trim())))
            .copied()
            .unwrap_or(Colour::BLACK)
    }

    /// Returns true if `name` is one of the palette entries.
    pub fn is_palette_name(name: &str) -> bool {
        Self::PALETTE
            .iter()
            .any(|c| c.name.is_some_and(|n| n.eq_ignore_ascii_case(name.trim())))
    }

    /// Builds a colour from normalized `[0, 1]` channels, e.g. an MTL `Kd`.
    pub fn from_unit_rgb(rgb: [f32; 3]) -> Self {
        let channel = |v: f32| (v.clamp(0.0, 1.0) * 255.0) as u8;
        Self::new(channel(rgb[0]), channel(rgb[1]), channel(rgb[2]))
    }

    /// Packs into `0xAARRGGBB` with opaque alpha.
    #[inline]
    pub fn to_argb(self) -> u32 {
        (255 << 24) | ((self.red as u32) << 16) | ((self.green as u32) << 8) | self.blue as u32
    }

    pub fn from_argb(argb: u32) -> Self {
        Self::new(
            ((argb >> 16) & 0xFF) as u8,
            ((argb >> 8) & 0xFF) as u8,
            (argb & 0xFF) as u8,
        )
    }
}

impl PartialEq for Colour {
    fn eq(&self, other: &Self) -> bool {
        self.red == other.red && self.green == other.green && self.blue == other.blue
    }
}

impl Eq for Colour {}

/// Scales every channel, truncating toward zero and saturating at 0..=255.
impl Mul<f32> for Colour {
    type Output = Colour;

    fn mul(self, rhs: f32) -> Colour {
        let scale = |c: u8| {
            let v = c as f32 * rhs;
            if v.is_nan() { 0 } else { v.clamp(0.0, 255.0) as u8 }
        };
        Colour {
            red: scale(self.red),
            green: scale(self.green),
            blue: scale(self.blue),
            name: self.name,
        }
    }
}

impl fmt::Display for Colour {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name {
            Some(name) => write!(f, "{} [{}, {}, {}]", name, self.red, self.green, self.blue),
            None => write!(f, "[{}, {}, {}]", self.red, self.green, self.blue),
        }
    }
}
