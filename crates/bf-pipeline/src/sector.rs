//! Integration sectors and their color assignment.

use crate::catalog::EstimatorHandle;
use crate::display::{SpectrumFrame, SpectrumSeries};
use crate::error::{PipelineError, PipelineResult};
use bf_acoustics::{Rect, read_lock};

/// Fixed sector color table. Its length is a hard cap on the number of
/// sectors: a sector without a color cannot be drawn, so the set refuses
/// additions past the table instead of recycling colors.
pub const PALETTE: [[u8; 3]; 11] = [
    [158, 1, 66],
    [213, 62, 79],
    [244, 109, 67],
    [253, 174, 97],
    [254, 224, 139],
    [255, 255, 191],
    [230, 245, 152],
    [171, 221, 164],
    [102, 194, 165],
    [50, 136, 189],
    [94, 79, 162],
];

/// One integration sector, center + size in grid coordinates (meters).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sector {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Sector {
    pub fn rect(&self) -> Rect {
        Rect::from_center(self.x, self.y, self.width, self.height)
    }
}

/// Ordered sector set. Colors are assigned by position, so the i-th
/// sector always draws in the i-th palette color.
#[derive(Debug, Default)]
pub struct SectorSet {
    sectors: Vec<Sector>,
}

impl SectorSet {
    /// Add a sector, returning its index. Fails when the palette is
    /// exhausted; the existing sectors are untouched.
    pub fn add(&mut self, sector: Sector) -> PipelineResult<usize> {
        if self.sectors.len() >= PALETTE.len() {
            return Err(PipelineError::SectorLimit { max: PALETTE.len() });
        }
        self.sectors.push(sector);
        Ok(self.sectors.len() - 1)
    }

    pub fn remove_last(&mut self) -> Option<Sector> {
        self.sectors.pop()
    }

    pub fn len(&self) -> usize {
        self.sectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sectors.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Sector> {
        self.sectors.iter()
    }

    pub fn color_for(index: usize) -> [u8; 3] {
        PALETTE[index]
    }

    /// Integrate every sector through `estimator` and build the display
    /// series. An empty set yields a hidden frame with no series.
    pub fn build_spectrum(&self, estimator: &EstimatorHandle) -> PipelineResult<SpectrumFrame> {
        if self.sectors.is_empty() {
            return Ok(SpectrumFrame::default());
        }
        let estimator = read_lock(estimator);
        let mut series = Vec::with_capacity(self.sectors.len());
        for (i, sector) in self.sectors.iter().enumerate() {
            let spectrum = estimator.integrate(sector.rect())?;
            series.push(SpectrumSeries::from_spectrum(&spectrum, PALETTE[i]));
        }
        Ok(SpectrumFrame {
            series,
            visible: true,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_sector() -> Sector {
        Sector {
            x: 0.0,
            y: 0.0,
            width: 0.1,
            height: 0.1,
        }
    }

    #[test]
    fn refuses_twelfth_sector() {
        let mut set = SectorSet::default();
        for _ in 0..11 {
            set.add(unit_sector()).unwrap();
        }
        let err = set.add(unit_sector()).unwrap_err();
        assert!(matches!(err, PipelineError::SectorLimit { max: 11 }));
        assert_eq!(set.len(), 11);
    }

    #[test]
    fn colors_follow_position() {
        assert_eq!(SectorSet::color_for(0), [158, 1, 66]);
        assert_eq!(SectorSet::color_for(10), [94, 79, 162]);
    }

    #[test]
    fn sector_rect_is_centered() {
        let rect = unit_sector().rect();
        assert!(rect.contains(0.0, 0.0));
        assert!(rect.contains(-0.05, 0.05));
        assert!(!rect.contains(0.06, 0.0));
    }
}
