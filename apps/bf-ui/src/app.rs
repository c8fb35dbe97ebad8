use crate::compute_worker::{ComputeWorker, WorkerMessage};
use crate::views::{MapView, SettingsView, SpectrumView};
use bf_acoustics::Band;
use bf_pipeline::{PipelineConfig, PipelineRegistry, Session};
use egui_file_dialog::{DialogMode, FileDialog};
use std::path::PathBuf;

pub struct BeamflowApp {
    session: Option<Session>,
    config_path: Option<PathBuf>,
    file_dialog: FileDialog,
    last_directory: Option<PathBuf>,
    worker: Option<ComputeWorker>,
    status: Option<String>,
    map_view: MapView,
    spectrum_view: SpectrumView,
    settings_view: SettingsView,
}

impl BeamflowApp {
    pub fn new(_cc: &eframe::CreationContext<'_>) -> Self {
        Self {
            session: None,
            config_path: None,
            file_dialog: FileDialog::new(),
            last_directory: None,
            worker: None,
            status: None,
            map_view: MapView::default(),
            spectrum_view: SpectrumView::default(),
            settings_view: SettingsView::default(),
        }
    }

    fn open_config(&mut self, path: PathBuf) {
        let built =
            PipelineConfig::from_yaml(&path).and_then(|config| PipelineRegistry::build(&config));
        match built {
            Ok(registry) => {
                if let Some(parent) = path.parent() {
                    self.last_directory = Some(parent.to_path_buf());
                }
                self.session = Some(Session::new(registry));
                tracing::info!(path = %path.display(), "pipeline config loaded");
                self.config_path = Some(path);
                self.status = Some("Pipeline loaded".to_string());
            }
            Err(e) => {
                tracing::error!(path = %path.display(), error = %e, "pipeline load failed");
                self.status = Some(format!("Failed to load pipeline: {e}"));
            }
        }
    }

    fn start_compute(&mut self) {
        if self.worker.is_some() {
            return;
        }
        let Some(session) = self.session.as_mut() else {
            return;
        };
        match session.begin_compute() {
            Ok((stage, request)) => {
                self.worker = Some(ComputeWorker::start(stage, request));
                self.status = Some("Computing source map...".to_string());
            }
            Err(e) => self.status = Some(format!("{e}")),
        }
    }

    fn poll_worker(&mut self) {
        let mut finished = None;
        if let Some(worker) = &self.worker {
            if let Ok(msg) = worker.result_rx.try_recv() {
                finished = Some(msg);
            }
        }
        let Some(msg) = finished else {
            return;
        };
        self.worker = None;
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let result = match msg {
            WorkerMessage::Complete { frame } => Ok(frame),
            WorkerMessage::Error { error } => Err(error),
        };
        match session.complete_compute(result) {
            Ok(()) => self.status = Some("Source map ready".to_string()),
            Err(e) => {
                tracing::warn!(error = %e, "source map computation failed");
                self.status = Some(format!("Computation failed: {e}"));
            }
        }
    }
}

impl eframe::App for BeamflowApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_worker();
        if self.worker.is_some() {
            ctx.request_repaint();
        }

        let mut calculate = false;
        let computing = self.worker.is_some();

        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if ui.button("Open").clicked() {
                    let initial_dir = self.last_directory.as_ref().and_then(|p| p.to_str());
                    let _ = self
                        .file_dialog
                        .open(DialogMode::SelectFile, true, initial_dir);
                }

                ui.separator();

                if let Some(session) = self.session.as_mut() {
                    let names = session.beamformer_names();
                    let mut active = session.active_name().to_string();
                    egui::ComboBox::from_id_salt("beamformer")
                        .selected_text(active.clone())
                        .width(220.0)
                        .show_ui(ui, |ui| {
                            for name in &names {
                                ui.selectable_value(&mut active, name.clone(), name);
                            }
                        });
                    if active != session.active_name() {
                        session.select_beamformer(&active);
                    }

                    let settings = session.map_settings();
                    let mut freq = settings.freq;
                    ui.label("Frequency:");
                    if ui
                        .add(
                            egui::DragValue::new(&mut freq)
                                .speed(50.0)
                                .range(20.0..=20_000.0)
                                .suffix(" Hz"),
                        )
                        .changed()
                    {
                        session.set_frequency(freq);
                    }

                    let mut band = settings.band;
                    egui::ComboBox::from_id_salt("band")
                        .selected_text(band.label())
                        .show_ui(ui, |ui| {
                            for candidate in [Band::Line, Band::Octave, Band::ThirdOctave] {
                                ui.selectable_value(&mut band, candidate, candidate.label());
                            }
                        });
                    if band != settings.band {
                        session.set_band(band);
                    }

                    ui.separator();
                    if ui
                        .add_enabled(!computing, egui::Button::new("Calculate"))
                        .clicked()
                    {
                        calculate = true;
                    }
                    if computing {
                        ui.spinner();
                    }
                }
            });
        });

        if calculate {
            self.start_compute();
        }

        self.file_dialog.update(ctx);
        if let Some(path) = self.file_dialog.take_selected() {
            self.open_config(path.to_path_buf());
        }

        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                match (&self.status, &self.config_path) {
                    (Some(status), _) => {
                        ui.label(status);
                    }
                    (None, Some(path)) => {
                        ui.label(path.display().to_string());
                    }
                    (None, None) => {
                        ui.label("Open a pipeline config (YAML) to begin");
                    }
                };
            });
        });

        egui::SidePanel::left("settings")
            .default_width(320.0)
            .show(ctx, |ui| {
                ui.heading("Pipeline Settings");
                ui.separator();
                if let Some(session) = self.session.as_mut() {
                    if let Some(msg) = self.settings_view.show(ui, session) {
                        self.status = Some(msg);
                    }
                } else {
                    ui.label("No pipeline loaded");
                }
            });

        egui::SidePanel::right("spectrum")
            .default_width(480.0)
            .show(ctx, |ui| {
                if let Some(session) = self.session.as_ref() {
                    self.spectrum_view.show(ui, session);
                } else {
                    ui.label("No pipeline loaded");
                }
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            if let Some(session) = self.session.as_mut() {
                if let Some(msg) = self.map_view.show(ui, session) {
                    self.status = Some(msg);
                }
            } else {
                ui.heading("Beamflow");
                ui.label("Open a pipeline config to load a recording and array geometry.");
            }
        });
    }
}
