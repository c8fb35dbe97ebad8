//! End-to-end check: a synthetic monopole source placed on the focus grid
//! must come back at the right position and level.

use bf_acoustics::{
    Band, CaponBeamformer, ConventionalBeamformer, Environment, FocusGrid, MicArray, Overlap,
    PowerSpectra, SourceEstimator, SteeringVector, TimeRecords, share,
};

const FS: f64 = 8192.0;
const FREQ: f64 = 1024.0; // exactly bin 32 at block size 256
const SPEED: f64 = 343.0;

fn mic_positions() -> Vec<[f64; 3]> {
    vec![
        [-0.3, 0.0, 0.0],
        [0.3, 0.0, 0.0],
        [0.0, -0.3, 0.0],
        [0.0, 0.3, 0.0],
    ]
}

/// Monopole at `source` sampled at each microphone: amplitude falls off as
/// 1/r and the phase lags by k*r.
fn monopole_records(source: [f64; 3], amplitude: f64, frames: usize) -> TimeRecords {
    let k = 2.0 * std::f64::consts::PI * FREQ / SPEED;
    let channels: Vec<Vec<f64>> = mic_positions()
        .iter()
        .map(|pos| {
            let r = ((source[0] - pos[0]).powi(2)
                + (source[1] - pos[1]).powi(2)
                + (source[2] - pos[2]).powi(2))
            .sqrt();
            (0..frames)
                .map(|i| {
                    let phase = 2.0 * std::f64::consts::PI * FREQ * i as f64 / FS - k * r;
                    amplitude / r * phase.sin()
                })
                .collect()
        })
        .collect();
    TimeRecords::from_channel_data(FS, channels)
}

fn pipeline(records: TimeRecords) -> (ConventionalBeamformer, CaponBeamformer) {
    let time = share(records);
    let freq_data = share(PowerSpectra::new(time, 256, Overlap::Half));
    let mics = share(MicArray::from_positions(mic_positions(), vec![]));
    let env = share(Environment::new(SPEED));
    // 3x3 grid centered on (0, 0, 0.5)
    let grid = share(FocusGrid::new(-0.1, 0.1, -0.1, 0.1, 0.5, 0.1));
    let steer = share(SteeringVector::new(grid, mics, env));
    (
        ConventionalBeamformer::new(freq_data.clone(), steer.clone()),
        CaponBeamformer::new(freq_data, steer),
    )
}

#[test]
fn conventional_map_peaks_at_the_source() {
    // Source on the center grid point, r0 = 0.5 m
    let amplitude = 2f64.sqrt();
    let (bf, _) = pipeline(monopole_records([0.0, 0.0, 0.5], amplitude, 8192));

    let map = bf.source_map(FREQ, Band::Line).unwrap();
    assert_eq!(map.values.len(), 9);

    let peak = map
        .values
        .iter()
        .enumerate()
        .max_by(|(_, a), (_, b)| a.total_cmp(b))
        .map(|(i, _)| i)
        .unwrap();
    assert_eq!(peak, 4, "peak should sit on the source grid point");

    // True-level steering recovers the source's squared pressure at the
    // reference distance: (A^2/2) / r0^2 = 1.0 / 0.25
    let expected = 4.0;
    let got = map.values[4];
    assert!(
        (got - expected).abs() / expected < 0.05,
        "peak power {got}, expected {expected}"
    );
}

#[test]
fn sector_integration_captures_the_peak() {
    let amplitude = 2f64.sqrt();
    let (bf, _) = pipeline(monopole_records([0.0, 0.0, 0.5], amplitude, 8192));

    let center = bf
        .integrate(bf_acoustics::Rect::from_center(0.0, 0.0, 0.05, 0.05))
        .unwrap();
    let line = 32;
    assert!((center.freqs[line] - FREQ).abs() < 1e-9);
    assert!(center.power[line] > 3.5, "power = {}", center.power[line]);

    // A sector with no grid points inside integrates to zero everywhere
    let empty = bf
        .integrate(bf_acoustics::Rect::from_center(5.0, 5.0, 0.01, 0.01))
        .unwrap();
    assert!(empty.power.iter().all(|&p| p == 0.0));
}

#[test]
fn capon_rejects_a_singular_csm() {
    // Silence gives an exactly-zero CSM, which has no inverse
    let (_, capon) = pipeline(TimeRecords::from_channel_data(FS, vec![vec![0.0; 2048]; 4]));
    let err = capon.source_map(FREQ, Band::Line).unwrap_err();
    assert!(matches!(
        err,
        bf_acoustics::AcousticError::SingularCsm { .. }
    ));
}
