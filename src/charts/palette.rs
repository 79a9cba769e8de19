//! Region Color Palette
//! Fixed six-region palette for the map markers.

use egui::Color32;

/// Region colors, keyed by normalized region name.
pub const REGION_PALETTE: [(&str, Color32); 6] = [
    ("AFRICA", Color32::from_rgb(237, 28, 36)),
    ("ASIA", Color32::from_rgb(237, 219, 22)),
    ("EUROPE", Color32::from_rgb(21, 24, 237)),
    ("NORTH_AMERICA", Color32::from_rgb(237, 142, 226)),
    ("OCEANIA", Color32::from_rgb(138, 237, 181)),
    ("SOUTH_AMERICA", Color32::from_rgb(170, 255, 0)),
];

/// Neutral color for regions outside the fixed palette. The marker still
/// renders; the gap is cosmetic, not an error.
pub const FALLBACK_REGION_COLOR: Color32 = Color32::from_rgb(128, 128, 128);

/// Normalize a region label for lookup: case and separator insensitive, so
/// "North America" and "NORTH_AMERICA" resolve to the same entry.
pub fn normalize_region(region: &str) -> String {
    region.trim().to_uppercase().replace([' ', '-'], "_")
}

/// Color for a region, or `None` when it is not one of the six fixed ones.
pub fn region_color(region: &str) -> Option<Color32> {
    let key = normalize_region(region);
    REGION_PALETTE
        .iter()
        .find(|(name, _)| *name == key)
        .map(|(_, color)| *color)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_is_case_and_separator_insensitive() {
        assert_eq!(region_color("EUROPE"), region_color("Europe"));
        assert_eq!(region_color("North America"), region_color("NORTH_AMERICA"));
        assert_eq!(region_color("south-america"), region_color("SOUTH_AMERICA"));
    }

    #[test]
    fn unknown_region_has_no_palette_entry() {
        assert_eq!(region_color("ANTARCTICA"), None);
        assert_eq!(region_color(""), None);
    }

    #[test]
    fn every_fixed_region_resolves() {
        for (name, color) in REGION_PALETTE {
            assert_eq!(region_color(name), Some(color));
        }
    }
}
