//! Explicit recompute trigger.
//!
//! Source maps are only recomputed on request, never reactively. At most
//! one computation is in flight; a failed computation leaves the display
//! buffers exactly as they were.

use crate::catalog::EstimatorHandle;
use crate::display::MapFrame;
use crate::error::{PipelineError, PipelineResult};
use bf_acoustics::{Band, read_lock};

/// Parameters of one map computation, captured when the trigger fires so
/// later edits cannot leak into a running computation.
#[derive(Debug, Clone, Copy)]
pub struct MapRequest {
    pub freq: f64,
    pub band: Band,
}

/// Guards the single-computation-in-flight rule.
#[derive(Debug, Default)]
pub struct ComputeTrigger {
    in_flight: bool,
}

impl ComputeTrigger {
    pub fn try_begin(&mut self) -> PipelineResult<()> {
        if self.in_flight {
            return Err(PipelineError::ComputeBusy);
        }
        self.in_flight = true;
        Ok(())
    }

    pub fn finish(&mut self) {
        self.in_flight = false;
    }

    pub fn in_flight(&self) -> bool {
        self.in_flight
    }
}

/// Run one map computation against the given estimator. Safe to call from
/// a worker thread; the result is published (or discarded) by the session.
pub fn compute_frame(stage: &EstimatorHandle, request: MapRequest) -> PipelineResult<MapFrame> {
    let map = read_lock(stage).source_map(request.freq, request.band)?;
    Ok(MapFrame::from_source_map(&map))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_begin_while_in_flight_is_busy() {
        let mut trigger = ComputeTrigger::default();
        trigger.try_begin().unwrap();
        assert!(matches!(
            trigger.try_begin().unwrap_err(),
            PipelineError::ComputeBusy
        ));
        trigger.finish();
        trigger.try_begin().unwrap();
    }
}
