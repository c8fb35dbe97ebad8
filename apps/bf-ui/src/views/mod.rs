pub mod map_view;
pub mod settings_view;
pub mod spectrum_view;

pub use map_view::MapView;
pub use settings_view::SettingsView;
pub use spectrum_view::SpectrumView;
