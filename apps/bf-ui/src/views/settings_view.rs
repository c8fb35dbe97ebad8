use bf_core::{ParamKind, ParamSpec, ParamValue};
use bf_pipeline::Session;

/// Settings panel: one group selector plus auto-generated controls for the
/// selected stage's parameters. The "Beamforming Method" group follows the
/// beamformer selector, so its controls always belong to the active
/// variant.
#[derive(Default)]
pub struct SettingsView;

impl SettingsView {
    pub fn show(&mut self, ui: &mut egui::Ui, session: &mut Session) -> Option<String> {
        let mut status = None;

        let groups = session.group_names();
        let mut selected = session.selected_group_name().to_string();
        egui::ComboBox::from_id_salt("settings_group")
            .selected_text(selected.clone())
            .width(220.0)
            .show_ui(ui, |ui| {
                for name in &groups {
                    ui.selectable_value(&mut selected, name.clone(), name);
                }
            });
        if selected != session.selected_group_name() {
            session.select_group(&selected);
        }

        ui.separator();

        for spec in session.visible_controls() {
            let Ok(value) = session.visible_param(spec.name) else {
                continue;
            };
            let update = ui
                .horizontal(|ui| {
                    ui.label(spec.label);
                    Self::control(ui, &spec, value)
                })
                .inner;
            if let Some(new_value) = update {
                if let Err(e) = session.set_visible_param(spec.name, new_value) {
                    status = Some(format!("{}: {e}", spec.label));
                }
            }
        }

        status
    }

    /// Render one control; returns the new value when the user changed it.
    fn control(ui: &mut egui::Ui, spec: &ParamSpec, value: ParamValue) -> Option<ParamValue> {
        match (&spec.kind, value) {
            (ParamKind::Float { min, max, step }, ParamValue::Float(mut v)) => {
                let response = ui.add_enabled(
                    spec.editable,
                    egui::DragValue::new(&mut v).speed(*step).range(*min..=*max),
                );
                response.changed().then_some(ParamValue::Float(v))
            }
            (ParamKind::Int { min, max }, ParamValue::Int(mut v)) => {
                let response = ui.add_enabled(
                    spec.editable,
                    egui::DragValue::new(&mut v).range(*min..=*max),
                );
                response.changed().then_some(ParamValue::Int(v))
            }
            (ParamKind::Bool, ParamValue::Bool(mut v)) => {
                let response = ui.add_enabled(spec.editable, egui::Checkbox::without_text(&mut v));
                response.changed().then_some(ParamValue::Bool(v))
            }
            (ParamKind::Choice { options }, ParamValue::Choice(current)) => {
                let mut selected = current.clone();
                egui::ComboBox::from_id_salt(spec.name)
                    .selected_text(selected.clone())
                    .show_ui(ui, |ui| {
                        for option in options {
                            ui.selectable_value(&mut selected, option.to_string(), *option);
                        }
                    });
                (selected != current).then_some(ParamValue::Choice(selected))
            }
            (ParamKind::Text, ParamValue::Text(v)) => {
                ui.label(v);
                None
            }
            (ParamKind::IndexList, ParamValue::IndexList(v)) => {
                let text = v
                    .iter()
                    .map(usize::to_string)
                    .collect::<Vec<_>>()
                    .join(", ");
                ui.label(if text.is_empty() {
                    "none".to_string()
                } else {
                    text
                });
                None
            }
            _ => None,
        }
    }
}
