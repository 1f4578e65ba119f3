//! CSS color strings as used for stroke styles.
//!
//! Only the forms a whiteboard palette realistically produces are understood:
//! hex (`#rgb`, `#rgba`, `#rrggbb`, `#rrggbbaa`), `rgb()` / `rgba()` and a
//! set of common named colors. Anything else yields `None`, and callers keep
//! their previous color the way a canvas ignores an invalid `strokeStyle`.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const BLACK: Self = Self::opaque(0, 0, 0);

    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }
}

const NAMED: &[(&str, Rgba)] = &[
    ("black", Rgba::opaque(0, 0, 0)),
    ("white", Rgba::opaque(255, 255, 255)),
    ("red", Rgba::opaque(255, 0, 0)),
    ("green", Rgba::opaque(0, 128, 0)),
    ("lime", Rgba::opaque(0, 255, 0)),
    ("blue", Rgba::opaque(0, 0, 255)),
    ("yellow", Rgba::opaque(255, 255, 0)),
    ("cyan", Rgba::opaque(0, 255, 255)),
    ("aqua", Rgba::opaque(0, 255, 255)),
    ("magenta", Rgba::opaque(255, 0, 255)),
    ("fuchsia", Rgba::opaque(255, 0, 255)),
    ("orange", Rgba::opaque(255, 165, 0)),
    ("purple", Rgba::opaque(128, 0, 128)),
    ("pink", Rgba::opaque(255, 192, 203)),
    ("brown", Rgba::opaque(165, 42, 42)),
    ("gray", Rgba::opaque(128, 128, 128)),
    ("grey", Rgba::opaque(128, 128, 128)),
    ("silver", Rgba::opaque(192, 192, 192)),
    ("navy", Rgba::opaque(0, 0, 128)),
    ("teal", Rgba::opaque(0, 128, 128)),
    ("maroon", Rgba::opaque(128, 0, 0)),
    ("olive", Rgba::opaque(128, 128, 0)),
    ("transparent", Rgba { r: 0, g: 0, b: 0, a: 0 }),
];

/// Parses a CSS color string.
pub fn parse_css_color(value: &str) -> Option<Rgba> {
    let value = value.trim();

    if let Some(hex) = value.strip_prefix('#') {
        return parse_hex(hex);
    }

    let lower = value.to_ascii_lowercase();
    if let Some(args) = lower
        .strip_prefix("rgba(")
        .or_else(|| lower.strip_prefix("rgb("))
        .and_then(|rest| rest.strip_suffix(')'))
    {
        return parse_rgb_args(args);
    }

    NAMED
        .iter()
        .find(|(name, _)| *name == lower)
        .map(|(_, color)| *color)
}

fn parse_hex(hex: &str) -> Option<Rgba> {
    if !hex.is_ascii() {
        return None;
    }

    let channel = |s: &str| u8::from_str_radix(s, 16).ok();
    // Expands a short-form nibble, e.g. `a` -> `aa`.
    let short = |s: &str| channel(s).map(|v| (v << 4) | v);

    match hex.len() {
        3 | 4 => Some(Rgba {
            r: short(&hex[0..1])?,
            g: short(&hex[1..2])?,
            b: short(&hex[2..3])?,
            a: if hex.len() == 4 { short(&hex[3..4])? } else { 255 },
        }),
        6 | 8 => Some(Rgba {
            r: channel(&hex[0..2])?,
            g: channel(&hex[2..4])?,
            b: channel(&hex[4..6])?,
            a: if hex.len() == 8 { channel(&hex[6..8])? } else { 255 },
        }),
        _ => None,
    }
}

fn parse_rgb_args(args: &str) -> Option<Rgba> {
    let parts: Vec<&str> = args.split(',').map(str::trim).collect();
    if parts.len() != 3 && parts.len() != 4 {
        return None;
    }

    let channel = |s: &str| s.parse::<f64>().ok().map(|v| v.round().clamp(0.0, 255.0) as u8);
    let alpha = match parts.get(3) {
        Some(a) => {
            let a = a.parse::<f64>().ok()?;
            (a.clamp(0.0, 1.0) * 255.0).round() as u8
        }
        None => 255,
    };

    Some(Rgba {
        r: channel(parts[0])?,
        g: channel(parts[1])?,
        b: channel(parts[2])?,
        a: alpha,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_hex_forms() {
        assert_eq!(parse_css_color("#4d4d4d"), Some(Rgba::opaque(0x4d, 0x4d, 0x4d)));
        assert_eq!(parse_css_color("#0f0"), Some(Rgba::opaque(0, 255, 0)));
        assert_eq!(
            parse_css_color("#ff000080"),
            Some(Rgba { r: 255, g: 0, b: 0, a: 0x80 })
        );
        assert_eq!(
            parse_css_color("#f008"),
            Some(Rgba { r: 255, g: 0, b: 0, a: 0x88 })
        );
    }

    #[test]
    fn parses_functional_and_named_forms() {
        assert_eq!(parse_css_color("rgb(10, 20, 30)"), Some(Rgba::opaque(10, 20, 30)));
        assert_eq!(
            parse_css_color("RGBA(255,255,255,0.5)"),
            Some(Rgba { r: 255, g: 255, b: 255, a: 128 })
        );
        assert_eq!(parse_css_color(" Blue "), Some(Rgba::opaque(0, 0, 255)));
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(parse_css_color(""), None);
        assert_eq!(parse_css_color("#12345"), None);
        assert_eq!(parse_css_color("#gggggg"), None);
        assert_eq!(parse_css_color("#ééé"), None);
        assert_eq!(parse_css_color("rgb(1,2)"), None);
        assert_eq!(parse_css_color("chartreuse-ish"), None);
    }
}
