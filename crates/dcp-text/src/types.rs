//! Styling and layout value types.

use std::fmt;
use std::str::FromStr;

use dcp_core::{Error, Result};

/// Positions closer than this are treated as the same line when grouping.
pub const ALIGN_EPSILON: f32 = 1e-3;

/// Tolerance when comparing aspect adjustments.
pub const ASPECT_ADJUST_EPSILON: f32 = 1e-3;

/// Tolerance when comparing and emitting leading space.
pub const SPACE_BEFORE_EPSILON: f32 = 1e-3;

// ============================================================================
// Color
// ============================================================================

/// An opaque RGB colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Color {
    /// Red, 0-255.
    pub r: u8,
    /// Green, 0-255.
    pub g: u8,
    /// Blue, 0-255.
    pub b: u8,
}

impl Color {
    /// White.
    pub const WHITE: Color = Color::new(255, 255, 255);
    /// Black.
    pub const BLACK: Color = Color::new(0, 0, 0);

    /// Creates a colour.
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parses an `AARRGGBB` hex string. Alpha is ignored.
    ///
    /// ```rust
    /// use dcp_text::Color;
    ///
    /// assert_eq!(Color::from_argb_hex("FF800040")?, Color::new(128, 0, 64));
    /// # Ok::<(), dcp_core::Error>(())
    /// ```
    pub fn from_argb_hex(argb: &str) -> Result<Self> {
        let byte = |i: usize| {
            argb.get(i * 2..i * 2 + 2)
                .and_then(|h| u8::from_str_radix(h, 16).ok())
                .ok_or_else(|| Error::Xml(format!("could not parse colour string {}", argb)))
        };
        let _alpha = byte(0)?;
        Ok(Self::new(byte(1)?, byte(2)?, byte(3)?))
    }

    /// `FFRRGGBB`, upper case.
    pub fn to_argb_string(&self) -> String {
        format!("FF{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }

    /// `RRGGBB`, upper case.
    pub fn to_rgb_string(&self) -> String {
        format!("{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.r, self.g, self.b)
    }
}

// ============================================================================
// Enumerations
// ============================================================================

macro_rules! string_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $what:literal {
            $($(#[$vmeta:meta])* $variant:ident => $s:literal $(| $alias:literal)*,)+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        pub enum $name {
            $(
                $(#[$vmeta])*
                $variant,
            )+
        }

        impl $name {
            /// Name as written in XML.
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $s,)+
                }
            }
        }

        impl FromStr for $name {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self> {
                match s {
                    $($s $(| $alias)* => Ok($name::$variant),)+
                    _ => Err(Error::Read(format!(concat!("unknown subtitle ", $what, " type {}"), s))),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

string_enum! {
    /// Decoration drawn around glyphs.
    Effect, "effect" {
        /// Plain glyphs.
        #[default]
        None => "none",
        /// Outline.
        Border => "border",
        /// Drop shadow.
        Shadow => "shadow",
    }
}

string_enum! {
    /// Horizontal anchor of a text or image.
    HAlign, "halign" {
        /// Measured from the left edge.
        Left => "left",
        /// Measured from the centre.
        #[default]
        Center => "center",
        /// Measured from the right edge.
        Right => "right",
    }
}

string_enum! {
    /// Vertical anchor of a text or image.
    VAlign, "valign" {
        /// Measured from the top edge.
        Top => "top",
        /// Measured from the centre.
        #[default]
        Center => "center",
        /// Measured from the bottom edge.
        Bottom => "bottom",
    }
}

string_enum! {
    /// Writing direction. Interop's `horizontal`/`vertical` are read as
    /// left-to-right and top-to-bottom.
    Direction, "direction" {
        /// Left to right.
        #[default]
        Ltr => "ltr" | "horizontal",
        /// Right to left.
        Rtl => "rtl",
        /// Top to bottom.
        Ttb => "ttb" | "vertical",
        /// Bottom to top.
        Btt => "btt",
    }
}

// ============================================================================
// Fraction
// ============================================================================

/// A rational number such as an edit rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Fraction {
    /// Numerator.
    pub numerator: i32,
    /// Denominator.
    pub denominator: i32,
}

impl Fraction {
    /// Creates a fraction.
    pub const fn new(numerator: i32, denominator: i32) -> Self {
        Self {
            numerator,
            denominator,
        }
    }

    /// `"<numerator> <denominator>"`, as written in XML.
    pub fn as_string(&self) -> String {
        format!("{} {}", self.numerator, self.denominator)
    }

    /// Value as a float.
    pub fn as_f64(&self) -> f64 {
        self.numerator as f64 / self.denominator as f64
    }
}

impl Default for Fraction {
    fn default() -> Self {
        Self::new(24, 1)
    }
}

impl FromStr for Fraction {
    type Err = Error;

    /// Parses `"24 1"`. A lone integer such as `"24"` is read as `24/1`;
    /// such edit rates turn up in the wild.
    fn from_str(s: &str) -> Result<Self> {
        let malformed = || Error::Xml(format!("malformed fraction {} in XML node", s));
        let int = |p: &str| p.parse::<i32>().map_err(|_| malformed());

        let parts: Vec<&str> = s.split(' ').collect();
        match parts.as_slice() {
            [n] => Ok(Self::new(int(n)?, 1)),
            [n, d] => Ok(Self::new(int(n)?, int(d)?)),
            _ => Err(malformed()),
        }
    }
}

impl fmt::Display for Fraction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.numerator, self.denominator)
    }
}

/// A ratio written either as a fraction or as a decimal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Ratio {
    /// `"1998 1080"`.
    Fraction(Fraction),
    /// `"1.85"`.
    Float(f64),
}

impl Ratio {
    /// Tries a fraction first, then a decimal.
    pub fn parse(s: &str) -> Result<Self> {
        if let Ok(f) = s.parse::<Fraction>() {
            return Ok(Ratio::Fraction(f));
        }
        s.trim()
            .parse::<f64>()
            .map(Ratio::Float)
            .map_err(|_| Error::Xml(format!("malformed ratio {}", s)))
    }

    /// Value as a float.
    pub fn as_f64(&self) -> f64 {
        match self {
            Ratio::Fraction(f) => f.as_f64(),
            Ratio::Float(v) => *v,
        }
    }
}

// ============================================================================
// Ruby and variable Z
// ============================================================================

/// Where a ruby annotation sits relative to its base text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RubyPosition {
    /// Above horizontal text, right of vertical text.
    #[default]
    Before,
    /// Below horizontal text, left of vertical text.
    After,
}

impl RubyPosition {
    /// Name as written in XML.
    pub const fn as_str(&self) -> &'static str {
        match self {
            RubyPosition::Before => "before",
            RubyPosition::After => "after",
        }
    }
}

impl FromStr for RubyPosition {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "before" => Ok(RubyPosition::Before),
            "after" => Ok(RubyPosition::After),
            _ => Err(Error::Xml(format!("unknown ruby position {}", s))),
        }
    }
}

/// An annotation attached to a run of base text.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Ruby {
    /// Base text.
    pub base: String,
    /// Annotation text.
    pub annotation: String,
    /// Annotation size relative to the base.
    pub size: f32,
    /// Placement.
    pub position: RubyPosition,
    /// Offset from the base, in ems.
    pub offset: f32,
    /// Spacing between annotation glyphs, in ems.
    pub spacing: f32,
    /// Horizontal scaling of annotation glyphs.
    pub aspect_adjust: f32,
}

impl Ruby {
    /// Creates a ruby with default styling.
    pub fn new(base: impl Into<String>, annotation: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            annotation: annotation.into(),
            size: 0.5,
            position: RubyPosition::Before,
            offset: 0.0,
            spacing: 0.0,
            aspect_adjust: 1.0,
        }
    }
}

/// One step of a variable Z curve: a depth held for `duration` editable units.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VariableZPosition {
    /// Depth as a percentage of screen height.
    pub position: f32,
    /// Length in editable units; always positive.
    pub duration: i64,
}

impl VariableZPosition {
    /// Creates a step.
    pub const fn new(position: f32, duration: i64) -> Self {
        Self { position, duration }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_parse() {
        assert_eq!(Color::from_argb_hex("FFFFFFFF").unwrap(), Color::WHITE);
        assert_eq!(Color::from_argb_hex("00010203").unwrap(), Color::new(1, 2, 3));
        assert!(Color::from_argb_hex("FF0000").is_err());
        assert!(Color::from_argb_hex("FFGG0000").is_err());
    }

    #[test]
    fn test_color_strings() {
        let c = Color::new(128, 0, 64);
        assert_eq!(c.to_argb_string(), "FF800040");
        assert_eq!(c.to_rgb_string(), "800040");
    }

    #[test]
    fn test_enum_strings() {
        assert_eq!("border".parse::<Effect>().unwrap(), Effect::Border);
        assert_eq!(HAlign::Right.as_str(), "right");
        assert_eq!("bottom".parse::<VAlign>().unwrap(), VAlign::Bottom);
        assert_eq!("horizontal".parse::<Direction>().unwrap(), Direction::Ltr);
        assert_eq!("vertical".parse::<Direction>().unwrap(), Direction::Ttb);
        assert_eq!(Direction::Ttb.to_string(), "ttb");
        assert!("diagonal".parse::<Direction>().is_err());
        assert!("Border".parse::<Effect>().is_err());
    }

    #[test]
    fn test_defaults() {
        assert_eq!(Effect::default(), Effect::None);
        assert_eq!(HAlign::default(), HAlign::Center);
        assert_eq!(VAlign::default(), VAlign::Center);
        assert_eq!(Direction::default(), Direction::Ltr);
    }

    #[test]
    fn test_fraction() {
        assert_eq!("24 1".parse::<Fraction>().unwrap(), Fraction::new(24, 1));
        assert_eq!("25".parse::<Fraction>().unwrap(), Fraction::new(25, 1));
        assert!("24 1 1".parse::<Fraction>().is_err());
        assert!("24/1".parse::<Fraction>().is_err());
        assert_eq!(Fraction::new(48, 1).as_string(), "48 1");
        assert_eq!(Fraction::new(48, 1).to_string(), "48/1");
    }

    #[test]
    fn test_ratio() {
        assert_eq!(Ratio::parse("1998 1080").unwrap(), Ratio::Fraction(Fraction::new(1998, 1080)));
        assert_eq!(Ratio::parse("1.85").unwrap(), Ratio::Float(1.85));
        assert!(Ratio::parse("wide").is_err());
    }

    #[test]
    fn test_ruby_defaults() {
        let r = Ruby::new("漢", "かん");
        assert_eq!(r.size, 0.5);
        assert_eq!(r.position, RubyPosition::Before);
        assert_eq!(r.aspect_adjust, 1.0);
    }
}
