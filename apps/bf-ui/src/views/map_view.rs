use crate::colormap;
use bf_pipeline::{MapFrame, Sector, SectorSet, Session};
use egui_plot::{Plot, PlotImage, PlotPoint, PlotPoints, Polygon};

/// Source-map display. Shift-drag draws an integration sector; Backspace
/// removes the last one while the plot is hovered.
pub struct MapView {
    texture: Option<egui::TextureHandle>,
    cached_generation: Option<u64>,
    cached_window: (f64, f64),
    range_low: f64,
    range_high: f64,
    drag_start: Option<[f64; 2]>,
}

impl Default for MapView {
    fn default() -> Self {
        Self {
            texture: None,
            cached_generation: None,
            cached_window: (0.0, 0.0),
            range_low: 40.0,
            range_high: 50.0,
            drag_start: None,
        }
    }
}

impl MapView {
    pub fn show(&mut self, ui: &mut egui::Ui, session: &mut Session) -> Option<String> {
        let mut status = None;

        ui.horizontal(|ui| {
            ui.label("Color range (dB):");
            ui.add(egui::Slider::new(&mut self.range_low, 0.0..=120.0).text("low"));
            ui.add(egui::Slider::new(&mut self.range_high, 0.0..=120.0).text("high"));
        });
        if self.range_high < self.range_low {
            self.range_high = self.range_low;
        }

        if let Some(frame) = session.map_frame() {
            let window = (self.range_low, self.range_high);
            if self.cached_generation != Some(session.map_generation())
                || self.cached_window != window
            {
                self.texture = Some(Self::build_texture(ui.ctx(), frame, window));
                self.cached_generation = Some(session.map_generation());
                self.cached_window = window;
            }
            match frame.max_level() {
                Some(peak) => ui.label(format!(
                    "{:.0} Hz, {}: peak {:.1} dB",
                    frame.freq, frame.band_label, peak
                )),
                None => ui.label(format!(
                    "{:.0} Hz, {}: no level above the display floor",
                    frame.freq, frame.band_label
                )),
            };
        } else {
            ui.label("No source map yet, press Calculate");
        }

        let shift = ui.input(|i| i.modifiers.shift);
        let extent = session.map_frame().map(|f| f.extent);
        let texture = self.texture.clone();
        let sectors: Vec<Sector> = session.sectors().iter().copied().collect();
        let mut new_sector = None;

        let plot = Plot::new("source_map")
            .data_aspect(1.0)
            .allow_drag(!shift)
            .allow_boxed_zoom(false)
            .x_axis_label("x (m)")
            .y_axis_label("y (m)")
            .show(ui, |plot_ui| {
                if let (Some(texture), Some([x0, x1, y0, y1])) = (&texture, extent) {
                    let center = PlotPoint::new((x0 + x1) / 2.0, (y0 + y1) / 2.0);
                    let size = egui::vec2((x1 - x0) as f32, (y1 - y0) as f32);
                    plot_ui.image(PlotImage::new(texture.id(), center, size));
                }

                for (i, sector) in sectors.iter().enumerate() {
                    let [r, g, b] = SectorSet::color_for(i);
                    let color = egui::Color32::from_rgb(r, g, b);
                    let rect = sector.rect();
                    let corners = vec![
                        [rect.x_min, rect.y_min],
                        [rect.x_max, rect.y_min],
                        [rect.x_max, rect.y_max],
                        [rect.x_min, rect.y_max],
                    ];
                    plot_ui.polygon(
                        Polygon::new(PlotPoints::from(corners))
                            .fill_color(color.gamma_multiply(0.15))
                            .stroke(egui::Stroke::new(2.0, color)),
                    );
                }

                if shift {
                    if plot_ui.response().drag_started() {
                        self.drag_start = plot_ui.pointer_coordinate().map(|p| [p.x, p.y]);
                    }
                    if plot_ui.response().drag_stopped() {
                        if let (Some(start), Some(end)) =
                            (self.drag_start.take(), plot_ui.pointer_coordinate())
                        {
                            let width = (end.x - start[0]).abs();
                            let height = (end.y - start[1]).abs();
                            if width > 1e-6 && height > 1e-6 {
                                new_sector = Some(Sector {
                                    x: (start[0] + end.x) / 2.0,
                                    y: (start[1] + end.y) / 2.0,
                                    width,
                                    height,
                                });
                            }
                        }
                    }
                } else {
                    self.drag_start = None;
                }
            });

        if let Some(sector) = new_sector {
            if let Err(e) = session.add_sector(sector) {
                status = Some(format!("{e}"));
            }
        }
        if plot.response.hovered() && ui.input(|i| i.key_pressed(egui::Key::Backspace)) {
            if let Err(e) = session.remove_last_sector() {
                status = Some(format!("Sector removal: {e}"));
            }
        }

        status
    }

    fn build_texture(
        ctx: &egui::Context,
        frame: &MapFrame,
        (low, high): (f64, f64),
    ) -> egui::TextureHandle {
        // image rows run top-down, grid rows bottom-up
        let mut pixels = Vec::with_capacity(frame.nx * frame.ny);
        for row in (0..frame.ny).rev() {
            for col in 0..frame.nx {
                let level = frame.levels[row * frame.nx + col];
                pixels.push(colormap::level_color(level, low, high));
            }
        }
        let image = egui::ColorImage {
            size: [frame.nx, frame.ny],
            pixels,
        };
        ctx.load_texture("source_map", image, egui::TextureOptions::LINEAR)
    }
}
