//! CSS Length Values
//!
//! Length parsing and resolution to CSS pixels.

/// CSS length
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Length {
    pub value: f32,
    pub unit: LengthUnit,
}

/// Length unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LengthUnit {
    Px,
    Em,
    Rem,
    Percent,
    Vw,
    Vh,
    Vmin,
    Vmax,
    Ch,
    Ex,
    Cm,
    Mm,
    Q,
    In,
    Pt,
    Pc,
}

impl LengthUnit {
    /// Parse a unit suffix (case-insensitive); an empty suffix is `px`
    pub fn parse(s: &str) -> Option<Self> {
        let unit = match s.to_ascii_lowercase().as_str() {
            "" | "px" => Self::Px,
            "em" => Self::Em,
            "rem" => Self::Rem,
            "%" => Self::Percent,
            "vw" => Self::Vw,
            "vh" => Self::Vh,
            "vmin" => Self::Vmin,
            "vmax" => Self::Vmax,
            "ch" => Self::Ch,
            "ex" => Self::Ex,
            "cm" => Self::Cm,
            "mm" => Self::Mm,
            "q" => Self::Q,
            "in" => Self::In,
            "pt" => Self::Pt,
            "pc" => Self::Pc,
            _ => return None,
        };
        Some(unit)
    }

    /// Unit depends on a font size
    pub fn is_font_relative(self) -> bool {
        matches!(self, Self::Em | Self::Rem | Self::Ch | Self::Ex)
    }

    /// Unit depends on the viewport
    pub fn is_viewport_relative(self) -> bool {
        matches!(self, Self::Vw | Self::Vh | Self::Vmin | Self::Vmax)
    }
}

/// Inputs needed to turn relative lengths into pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolutionContext {
    /// Font size of the element the length applies to
    pub font_size: f32,
    /// Font size of the root element
    pub root_font_size: f32,
    pub viewport_width: f32,
    pub viewport_height: f32,
}

impl Default for ResolutionContext {
    fn default() -> Self {
        Self {
            font_size: 16.0,
            root_font_size: 16.0,
            viewport_width: 0.0,
            viewport_height: 0.0,
        }
    }
}

impl Length {
    pub fn new(value: f32, unit: LengthUnit) -> Self {
        Self { value, unit }
    }

    pub fn px(value: f32) -> Self {
        Self::new(value, LengthUnit::Px)
    }

    /// Parse `<number><unit>`, e.g. `300px`, `-1.5e1em`, `.5rem`, `40`
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        let (number, unit) = split_number(s)?;
        let value: f32 = number.parse().ok()?;
        Some(Self::new(value, LengthUnit::parse(unit)?))
    }

    /// Resolve to pixels; percentages have no basis here and yield `None`
    pub fn to_px(&self, ctx: &ResolutionContext) -> Option<f32> {
        let factor = match self.unit {
            LengthUnit::Px => 1.0,
            LengthUnit::Em => ctx.font_size,
            LengthUnit::Rem => ctx.root_font_size,
            // Common approximation when no font metrics are available
            LengthUnit::Ch | LengthUnit::Ex => ctx.font_size * 0.5,
            LengthUnit::Vw => ctx.viewport_width / 100.0,
            LengthUnit::Vh => ctx.viewport_height / 100.0,
            LengthUnit::Vmin => ctx.viewport_width.min(ctx.viewport_height) / 100.0,
            LengthUnit::Vmax => ctx.viewport_width.max(ctx.viewport_height) / 100.0,
            LengthUnit::In => 96.0,
            LengthUnit::Cm => 96.0 / 2.54,
            LengthUnit::Mm => 96.0 / 25.4,
            LengthUnit::Q => 96.0 / 101.6,
            LengthUnit::Pt => 96.0 / 72.0,
            LengthUnit::Pc => 16.0,
            LengthUnit::Percent => return None,
        };
        Some(self.value * factor)
    }
}

/// Split a leading CSS number (sign, digits, fraction, exponent) from the rest
fn split_number(s: &str) -> Option<(&str, &str)> {
    let bytes = s.as_bytes();
    let mut i = 0;

    if matches!(bytes.first(), Some(b'+' | b'-')) {
        i += 1;
    }
    let int_start = i;
    while bytes.get(i).is_some_and(u8::is_ascii_digit) {
        i += 1;
    }
    let mut digits = i - int_start;

    if bytes.get(i) == Some(&b'.') {
        let frac_start = i + 1;
        let mut j = frac_start;
        while bytes.get(j).is_some_and(u8::is_ascii_digit) {
            j += 1;
        }
        // `1.` is a number, `.` alone is not
        if digits > 0 || j > frac_start {
            digits += j - frac_start;
            i = j;
        }
    }
    if digits == 0 {
        return None;
    }

    if matches!(bytes.get(i), Some(b'e' | b'E')) {
        let mut j = i + 1;
        if matches!(bytes.get(j), Some(b'+' | b'-')) {
            j += 1;
        }
        let exp_start = j;
        while bytes.get(j).is_some_and(u8::is_ascii_digit) {
            j += 1;
        }
        if j > exp_start {
            i = j;
        }
    }

    Some(s.split_at(i))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_lengths() {
        assert_eq!(Length::parse("300px"), Some(Length::px(300.0)));
        assert_eq!(Length::parse("40"), Some(Length::px(40.0)));
        assert_eq!(Length::parse("2.5em"), Some(Length::new(2.5, LengthUnit::Em)));
        assert_eq!(Length::parse(".5REM"), Some(Length::new(0.5, LengthUnit::Rem)));
        assert_eq!(Length::parse("1e2px"), Some(Length::px(100.0)));
        assert_eq!(Length::parse("-10vw"), Some(Length::new(-10.0, LengthUnit::Vw)));
        assert_eq!(Length::parse("50%"), Some(Length::new(50.0, LengthUnit::Percent)));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert_eq!(Length::parse("px"), None);
        assert_eq!(Length::parse("."), None);
        assert_eq!(Length::parse("10furlongs"), None);
        assert_eq!(Length::parse(""), None);
    }

    #[test]
    fn test_resolve_to_px() {
        let ctx = ResolutionContext {
            font_size: 20.0,
            root_font_size: 10.0,
            viewport_width: 1000.0,
            viewport_height: 500.0,
        };
        assert_eq!(Length::new(2.0, LengthUnit::Em).to_px(&ctx), Some(40.0));
        assert_eq!(Length::new(2.0, LengthUnit::Rem).to_px(&ctx), Some(20.0));
        assert_eq!(Length::new(10.0, LengthUnit::Vw).to_px(&ctx), Some(100.0));
        assert_eq!(Length::new(10.0, LengthUnit::Vmin).to_px(&ctx), Some(50.0));
        assert_eq!(Length::new(1.0, LengthUnit::In).to_px(&ctx), Some(96.0));
        assert_eq!(Length::new(50.0, LengthUnit::Percent).to_px(&ctx), None);
    }
}
