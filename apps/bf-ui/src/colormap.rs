//! Viridis colormap for the source-map display.

/// Viridis anchor colors at evenly spaced positions; intermediate values
/// are linearly interpolated.
const VIRIDIS: [[u8; 3]; 9] = [
    [68, 1, 84],
    [71, 44, 122],
    [59, 81, 139],
    [44, 113, 142],
    [33, 144, 141],
    [39, 173, 129],
    [92, 200, 99],
    [170, 220, 50],
    [253, 231, 37],
];

/// Sample the colormap at `t` in `[0, 1]` (clamped).
pub fn viridis(t: f64) -> [u8; 3] {
    let t = t.clamp(0.0, 1.0);
    let scaled = t * (VIRIDIS.len() - 1) as f64;
    let lo = scaled.floor() as usize;
    let hi = (lo + 1).min(VIRIDIS.len() - 1);
    let frac = scaled - lo as f64;
    let mut out = [0u8; 3];
    for (i, channel) in out.iter_mut().enumerate() {
        let a = VIRIDIS[lo][i] as f64;
        let b = VIRIDIS[hi][i] as f64;
        *channel = (a + (b - a) * frac).round() as u8;
    }
    out
}

/// Map a level to a display color. Levels below `lo` (and undefined
/// levels, passed as `None`) are transparent; levels above `hi` clamp to
/// the top of the map.
pub fn level_color(level: Option<f64>, lo: f64, hi: f64) -> egui::Color32 {
    match level {
        Some(level) if level >= lo => {
            let span = (hi - lo).max(1e-9);
            let [r, g, b] = viridis((level - lo) / span);
            egui::Color32::from_rgb(r, g, b)
        }
        _ => egui::Color32::TRANSPARENT,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_match_anchors() {
        assert_eq!(viridis(0.0), [68, 1, 84]);
        assert_eq!(viridis(1.0), [253, 231, 37]);
        assert_eq!(viridis(-0.5), viridis(0.0));
    }

    #[test]
    fn below_range_is_transparent() {
        assert_eq!(level_color(Some(10.0), 20.0, 60.0), egui::Color32::TRANSPARENT);
        assert_eq!(level_color(None, 20.0, 60.0), egui::Color32::TRANSPARENT);
        assert_ne!(level_color(Some(30.0), 20.0, 60.0), egui::Color32::TRANSPARENT);
    }
}
