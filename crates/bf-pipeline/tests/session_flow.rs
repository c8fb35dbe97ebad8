//! Session-level behavior: selection coupling, trigger atomicity, sector
//! bookkeeping.

use bf_acoustics::{Environment, FocusGrid, MicArray, TimeRecords};
use bf_pipeline::{PipelineError, PipelineRegistry, Sector, Session};

fn registry(records: TimeRecords) -> PipelineRegistry {
    let mics = MicArray::from_positions(vec![[-0.1, 0.0, 0.0], [0.1, 0.0, 0.0]], vec![]);
    PipelineRegistry::from_stages(
        records,
        None,
        mics,
        Environment::new(346.04),
        FocusGrid::new(-0.1, 0.1, -0.1, 0.1, 0.5, 0.1),
        256,
    )
}

/// Coherent sine on both channels; every CSM line is well defined.
fn sine_session() -> Session {
    let channel: Vec<f64> = (0..8192)
        .map(|i| (2.0 * std::f64::consts::PI * 1024.0 * i as f64 / 8192.0).sin())
        .collect();
    Session::new(registry(TimeRecords::from_channel_data(
        8192.0,
        vec![channel.clone(), channel],
    )))
}

/// Silent recording; the CSM is exactly zero.
fn quiet_session() -> Session {
    Session::new(registry(TimeRecords::from_channel_data(
        8192.0,
        vec![vec![0.0; 2048]; 2],
    )))
}

fn unit_sector() -> Sector {
    Sector {
        x: 0.0,
        y: 0.0,
        width: 0.25,
        height: 0.25,
    }
}

#[test]
fn trigger_publishes_a_whole_consistent_frame() {
    let mut session = sine_session();
    assert!(session.map_frame().is_none());
    assert_eq!(session.map_generation(), 0);

    session.calculate().unwrap();

    let frame = session.map_frame().expect("frame published");
    assert_eq!(session.map_generation(), 1);
    assert_eq!(frame.nx, 3);
    assert_eq!(frame.ny, 3);
    assert_eq!(frame.levels.len(), 9);
    assert!((frame.freq - 4000.0).abs() < 1e-9);
    assert_eq!(frame.band_label, "Third octave");
    assert!(frame.max_level().is_some());
}

#[test]
fn failed_compute_leaves_the_previous_frame_in_place() {
    let mut session = quiet_session();
    session.calculate().unwrap();
    let generation = session.map_generation();

    // Capon cannot invert the zero CSM
    session.select_beamformer("Capon Beamforming");
    let err = session.calculate().unwrap_err();
    assert!(matches!(err, PipelineError::Acoustic(_)));

    assert_eq!(session.map_generation(), generation);
    assert!(session.map_frame().is_some());
    assert!(!session.is_computing(), "trigger must be released on error");
    // and the session recovers once a workable variant is selected again
    session.select_beamformer("Conventional Beamforming");
    session.calculate().unwrap();
    assert_eq!(session.map_generation(), generation + 1);
}

#[test]
fn silence_renders_as_undefined_not_as_a_level() {
    let mut session = quiet_session();
    session.calculate().unwrap();
    let frame = session.map_frame().unwrap();
    assert!(frame.levels.iter().all(Option::is_none));
    assert_eq!(frame.max_level(), None);
}

#[test]
fn selection_swaps_stage_and_controls_together() {
    let mut session = sine_session();
    session.select_group("Beamforming Method");

    session.select_beamformer("Eigenvalue Beamforming");
    assert_eq!(session.active_name(), "Eigenvalue Beamforming");
    let controls = session.visible_controls();
    assert_eq!(controls.len(), 1);
    assert_eq!(controls[0].name, "n");

    // the parameter read goes to the newly active stage
    session
        .set_visible_param("n", bf_core::ParamValue::Int(2))
        .unwrap();
    session.calculate().unwrap();
    assert!(session.map_frame().is_some());
}

#[test]
fn sector_set_stops_at_the_palette() {
    let mut session = sine_session();
    for _ in 0..11 {
        session.add_sector(unit_sector()).unwrap();
    }
    let err = session.add_sector(unit_sector()).unwrap_err();
    assert!(matches!(err, PipelineError::SectorLimit { max: 11 }));
    assert_eq!(session.sectors().len(), 11);
    assert_eq!(session.spectrum().series.len(), 11);
    assert!(session.spectrum().visible);
}

#[test]
fn removing_the_last_sector_hides_but_keeps_the_series() {
    let mut session = sine_session();
    session.add_sector(unit_sector()).unwrap();
    assert!(session.spectrum().visible);
    assert_eq!(session.spectrum().series.len(), 1);
    assert_eq!(session.spectrum().series[0].color, [158, 1, 66]);

    session.remove_last_sector().unwrap();
    assert!(!session.spectrum().visible);
    assert_eq!(session.spectrum().series.len(), 1);

    // re-adding restores the display
    session.add_sector(unit_sector()).unwrap();
    assert!(session.spectrum().visible);
}

#[test]
fn sector_spectra_follow_the_active_beamformer() {
    let mut session = sine_session();
    session.add_sector(unit_sector()).unwrap();
    let generation = session.spectrum_generation();

    // recomputing through a different variant rebuilds the spectra
    session.select_beamformer("Functional Beamforming");
    session.calculate().unwrap();
    assert!(session.spectrum_generation() > generation);
}

#[test]
fn worker_style_split_compute() {
    // the UI runs begin/compute/complete on separate turns
    let mut session = sine_session();
    let (stage, request) = session.begin_compute().unwrap();
    assert!(session.is_computing());
    assert!(matches!(
        session.begin_compute().unwrap_err(),
        PipelineError::ComputeBusy
    ));

    let result = bf_pipeline::compute_frame(&stage, request);
    session.complete_compute(result).unwrap();
    assert!(!session.is_computing());
    assert_eq!(session.map_generation(), 1);
}
