use std::collections::BTreeMap;

use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

use crate::series::assemble::ChartSpec;

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<Color32> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            let hsl = Hsl::new(hue, 0.75, 0.55);
            let rgb: Srgb = hsl.into_color();
            Color32::from_rgb(
                (rgb.red * 255.0) as u8,
                (rgb.green * 255.0) as u8,
                (rgb.blue * 255.0) as u8,
            )
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Color mapping: sex_age key → Color32
// ---------------------------------------------------------------------------

/// Assigns one colour per `sex_age` group, in order of first appearance, so
/// the gross and instantaneous lines of a group share a colour.
#[derive(Debug, Clone, Default)]
pub struct ColorMap {
    mapping: BTreeMap<String, Color32>,
    order: Vec<String>,
}

impl ColorMap {
    pub fn new<'a>(keys: impl IntoIterator<Item = &'a str>) -> Self {
        let mut order: Vec<String> = Vec::new();
        for key in keys {
            if !order.iter().any(|k| k == key) {
                order.push(key.to_string());
            }
        }
        let mapping = order
            .iter()
            .cloned()
            .zip(generate_palette(order.len()))
            .collect();
        ColorMap { mapping, order }
    }

    pub fn for_chart(chart: &ChartSpec) -> Self {
        Self::new(chart.series.iter().map(|s| s.sex_age.as_str()))
    }

    /// Look up the colour for a group key.
    pub fn color_for(&self, key: &str) -> Color32 {
        self.mapping.get(key).copied().unwrap_or(Color32::GRAY)
    }

    /// Return the legend entries (group → colour) in first-appearance order.
    pub fn legend_entries(&self) -> Vec<(String, Color32)> {
        self.order
            .iter()
            .map(|k| (k.clone(), self.color_for(k)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_has_requested_size() {
        assert!(generate_palette(0).is_empty());
        let colors = generate_palette(5);
        assert_eq!(colors.len(), 5);
        assert_ne!(colors[0], colors[1]);
    }

    #[test]
    fn repeated_keys_share_a_colour() {
        let map = ColorMap::new(["f_16-64", "m_16-64", "f_16-64"]);
        let legend = map.legend_entries();
        assert_eq!(legend.len(), 2);
        assert_eq!(legend[0].0, "f_16-64");
        assert_ne!(map.color_for("f_16-64"), map.color_for("m_16-64"));
        assert_eq!(map.color_for("t_20-24"), Color32::GRAY);
    }
}
