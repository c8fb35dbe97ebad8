use bf_pipeline::{SectorSet, Session, SpectrumSeries};
use egui_plot::{Legend, Line, Plot, PlotPoints};

/// Sector-spectrum display: one line per sector, log-frequency axis.
#[derive(Default)]
pub struct SpectrumView;

impl SpectrumView {
    pub fn show(&mut self, ui: &mut egui::Ui, session: &Session) {
        ui.heading("Sector spectra");
        let frame = session.spectrum();
        if !frame.visible {
            ui.label("Shift-drag on the map to draw an integration sector");
        }

        Plot::new("sector_spectrum")
            .legend(Legend::default())
            .x_axis_label("Frequency (Hz)")
            .y_axis_label("Lp (dB)")
            .x_axis_formatter(|mark, _range| format!("{:.0}", 10f64.powf(mark.value)))
            .show(ui, |plot_ui| {
                if !frame.visible {
                    return;
                }
                for (i, series) in frame.series.iter().enumerate() {
                    let [r, g, b] = SectorSet::color_for(i);
                    let color = egui::Color32::from_rgb(r, g, b);
                    for segment in contiguous_segments(series) {
                        plot_ui.line(
                            Line::new(PlotPoints::from(segment))
                                .color(color)
                                .name(format!("Sector {}", i + 1)),
                        );
                    }
                }
            });
    }
}

/// Split a series at undefined levels (and the DC line, which has no
/// log-frequency position) so gaps stay gaps instead of being bridged.
fn contiguous_segments(series: &SpectrumSeries) -> Vec<Vec<[f64; 2]>> {
    let mut segments = Vec::new();
    let mut current: Vec<[f64; 2]> = Vec::new();
    for (freq, level) in series.freqs.iter().zip(&series.levels) {
        match level {
            Some(level) if *freq > 0.0 => current.push([freq.log10(), *level]),
            _ => {
                if current.len() > 1 {
                    segments.push(std::mem::take(&mut current));
                } else {
                    current.clear();
                }
            }
        }
    }
    if current.len() > 1 {
        segments.push(current);
    }
    segments
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gaps_split_the_line() {
        let series = SpectrumSeries {
            freqs: vec![0.0, 100.0, 200.0, 300.0, 400.0, 500.0],
            levels: vec![Some(1.0), Some(60.0), Some(61.0), None, Some(55.0), Some(54.0)],
            color: [158, 1, 66],
        };
        let segments = contiguous_segments(&series);
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].len(), 2);
        assert_eq!(segments[1].len(), 2);
        // DC line is excluded even though it has a defined level
        assert!((segments[0][0][0] - 2.0).abs() < 1e-12);
    }
}
