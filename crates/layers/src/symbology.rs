use foundation::points::{Category, CategoryKind};
use serde::Serialize;

/// RGBA, linear 0..1.
pub type Color = [f32; 4];

pub const CHANTERELLE_YELLOW: Color = [0.918, 0.702, 0.031, 1.0];
pub const BLUEBERRY_BLUE: Color = [0.231, 0.510, 0.965, 1.0];
pub const LINGONBERRY_RED: Color = [0.937, 0.267, 0.267, 1.0];
pub const CLOUDBERRY_ORANGE: Color = [0.976, 0.451, 0.086, 1.0];
pub const DEFAULT_GREEN: Color = [0.133, 0.773, 0.369, 1.0];
pub const CLUSTER_GREEN: Color = [0.086, 0.639, 0.290, 1.0];
pub const LOCATION_BLUE: Color = BLUEBERRY_BLUE;

#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
pub struct PinStyle {
    pub color: Color,
    /// Icon asset name.
    pub glyph: &'static str,
    pub label: &'static str,
}

/// Categories with a dedicated icon; the rest fall back to their kind's icon.
const DEDICATED_ICONS: &[Category] = &[
    Category::Chanterelle,
    Category::Blueberry,
    Category::Lingonberry,
    Category::Cloudberry,
    Category::Porcini,
    Category::Oyster,
    Category::Elderberry,
    Category::Rosehip,
    Category::Seabuckthorn,
];

pub fn pin_style(category: Category) -> PinStyle {
    let color = match category {
        Category::Chanterelle => CHANTERELLE_YELLOW,
        Category::Blueberry => BLUEBERRY_BLUE,
        Category::Lingonberry => LINGONBERRY_RED,
        Category::Cloudberry => CLOUDBERRY_ORANGE,
        _ => DEFAULT_GREEN,
    };
    let glyph = if DEDICATED_ICONS.contains(&category) {
        category.as_str()
    } else {
        match category.kind() {
            CategoryKind::Mushroom => "generic_mushroom",
            CategoryKind::Berry => "generic_berry",
            CategoryKind::Other => "pin",
        }
    };
    PinStyle {
        color,
        glyph,
        label: category.as_str(),
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
pub struct ClusterStyle {
    pub color: Color,
    pub diameter_px: f32,
}

impl Default for ClusterStyle {
    fn default() -> Self {
        Self {
            color: CLUSTER_GREEN,
            diameter_px: 48.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use foundation::points::Category;

    use super::{BLUEBERRY_BLUE, CHANTERELLE_YELLOW, DEFAULT_GREEN, pin_style};

    #[test]
    fn signature_colors() {
        assert_eq!(pin_style(Category::Chanterelle).color, CHANTERELLE_YELLOW);
        assert_eq!(pin_style(Category::Blueberry).color, BLUEBERRY_BLUE);
        assert_eq!(pin_style(Category::Sloe).color, DEFAULT_GREEN);
        assert_eq!(pin_style(Category::Other).color, DEFAULT_GREEN);
    }

    #[test]
    fn glyph_falls_back_by_kind() {
        assert_eq!(pin_style(Category::Porcini).glyph, "porcini");
        assert_eq!(pin_style(Category::BlackTrumpet).glyph, "generic_mushroom");
        assert_eq!(pin_style(Category::Raspberry).glyph, "generic_berry");
        assert_eq!(pin_style(Category::Other).glyph, "pin");
        assert_eq!(pin_style(Category::Raspberry).label, "raspberry");
    }
}
