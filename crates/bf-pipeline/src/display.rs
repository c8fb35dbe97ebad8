//! Display buffers: the only data the views read.
//!
//! A buffer is replaced wholesale by its single writer; readers detect a
//! new frame through the generation counter and never observe a frame
//! whose metadata and values disagree.

use bf_acoustics::{SectorSpectrum, SourceMap};
use bf_core::level_or_undefined;

/// One rendered source map: levels in dB with the grid metadata captured at
/// compute time. Sub-floor points are `None` (drawn as holes, not as a
/// sentinel level).
#[derive(Debug, Clone)]
pub struct MapFrame {
    pub nx: usize,
    pub ny: usize,
    /// `[x_min, x_max, y_min, y_max]`
    pub extent: [f64; 4],
    pub z: f64,
    pub freq: f64,
    pub band_label: &'static str,
    pub levels: Vec<Option<f64>>,
}

impl MapFrame {
    pub fn from_source_map(map: &SourceMap) -> Self {
        Self {
            nx: map.nx,
            ny: map.ny,
            extent: map.extent,
            z: map.z,
            freq: map.freq,
            band_label: map.band.label(),
            levels: map.values.iter().map(|&p| level_or_undefined(p)).collect(),
        }
    }

    /// Highest defined level, if any point is defined.
    pub fn max_level(&self) -> Option<f64> {
        self.levels
            .iter()
            .flatten()
            .copied()
            .reduce(f64::max)
    }
}

/// Source-map buffer. Holds the last published frame until the next
/// successful compute replaces it.
#[derive(Debug, Default)]
pub struct SourceMapBuffer {
    frame: Option<MapFrame>,
    generation: u64,
}

impl SourceMapBuffer {
    pub fn publish(&mut self, frame: MapFrame) {
        self.frame = Some(frame);
        self.generation += 1;
    }

    pub fn frame(&self) -> Option<&MapFrame> {
        self.frame.as_ref()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// One sector's integrated spectrum, already converted to levels.
#[derive(Debug, Clone)]
pub struct SpectrumSeries {
    pub freqs: Vec<f64>,
    pub levels: Vec<Option<f64>>,
    pub color: [u8; 3],
}

impl SpectrumSeries {
    pub fn from_spectrum(spectrum: &SectorSpectrum, color: [u8; 3]) -> Self {
        Self {
            freqs: spectrum.freqs.clone(),
            levels: spectrum.power.iter().map(|&p| level_or_undefined(p)).collect(),
            color,
        }
    }
}

/// Sector-spectrum display state. When the last sector is removed the
/// series are hidden, not dropped, so re-adding a sector restores a
/// consistent view immediately.
#[derive(Debug, Clone, Default)]
pub struct SpectrumFrame {
    pub series: Vec<SpectrumSeries>,
    pub visible: bool,
}

#[derive(Debug, Default)]
pub struct SpectrumBuffer {
    frame: SpectrumFrame,
    generation: u64,
}

impl SpectrumBuffer {
    pub fn publish(&mut self, series: Vec<SpectrumSeries>) {
        self.frame = SpectrumFrame {
            series,
            visible: true,
        };
        self.generation += 1;
    }

    /// Keep the series but stop drawing them.
    pub fn hide(&mut self) {
        self.frame.visible = false;
        self.generation += 1;
    }

    pub fn frame(&self) -> &SpectrumFrame {
        &self.frame
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bf_acoustics::{Band, SourceMap};

    #[test]
    fn zero_power_points_become_holes() {
        let map = SourceMap {
            nx: 2,
            ny: 1,
            extent: [0.0, 1.0, 0.0, 0.0],
            z: 0.5,
            freq: 4000.0,
            band: Band::ThirdOctave,
            values: vec![0.0, 4e-10],
        };
        let frame = MapFrame::from_source_map(&map);
        assert_eq!(frame.levels[0], None);
        let level = frame.levels[1].unwrap();
        assert!((level - 0.0).abs() < 1e-9);
        assert_eq!(frame.max_level(), frame.levels[1]);
    }

    #[test]
    fn hide_preserves_series() {
        let mut buffer = SpectrumBuffer::default();
        buffer.publish(vec![SpectrumSeries {
            freqs: vec![100.0],
            levels: vec![Some(60.0)],
            color: [158, 1, 66],
        }]);
        let generation = buffer.generation();
        buffer.hide();
        assert!(!buffer.frame().visible);
        assert_eq!(buffer.frame().series.len(), 1);
        assert_eq!(buffer.generation(), generation + 1);
    }
}
