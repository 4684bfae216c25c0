//! Remote-entity display interpolation. Predicted position is only ever
//! computed for the local player (see `seedfall_net::prediction`); every
//! other networked entity is displayed at `now - interp_delay`, linearly
//! interpolated between the two most recently received snapshots, with
//! extrapolation capped before the display freezes on stale data.

use std::collections::HashMap;

#[derive(Debug, Clone, Copy)]
struct Sample {
    time_ms: f64,
    x: f32,
    y: f32,
}

#[derive(Debug, Default)]
pub struct RemoteInterpolator {
    history: HashMap<u64, (Option<Sample>, Option<Sample>)>,
}

impl RemoteInterpolator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a newly received position for `entity_id` at `time_ms`,
    /// pushing the previous "latest" sample back into the "previous" slot.
    pub fn record(&mut self, entity_id: u64, time_ms: f64, x: f32, y: f32) {
        let entry = self.history.entry(entity_id).or_insert((None, None));
        entry.0 = entry.1;
        entry.1 = Some(Sample { time_ms, x, y });
    }

    /// Interpolate (or capped-extrapolate) every tracked entity's position
    /// at `display_time_ms`.
    pub fn positions_at(&self, display_time_ms: f64, extrapolation_cap_ms: f64) -> HashMap<u64, (f32, f32)> {
        let mut out = HashMap::new();
        for (entity_id, (previous, latest)) in &self.history {
            let Some(latest) = latest else { continue };
            let pos = match previous {
                Some(previous) if previous.time_ms < latest.time_ms => {
                    interpolate_or_extrapolate(*previous, *latest, display_time_ms, extrapolation_cap_ms)
                }
                _ => (latest.x, latest.y),
            };
            out.insert(*entity_id, pos);
        }
        out
    }
}

fn interpolate_or_extrapolate(previous: Sample, latest: Sample, display_time_ms: f64, cap_ms: f64) -> (f32, f32) {
    let span = latest.time_ms - previous.time_ms;
    if span <= 0.0 {
        return (latest.x, latest.y);
    }
    let clamped_time = display_time_ms.min(latest.time_ms + cap_ms);
    let t = ((clamped_time - previous.time_ms) / span) as f32;
    (
        previous.x + (latest.x - previous.x) * t,
        previous.y + (latest.y - previous.y) * t,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interpolates_between_two_samples() {
        let mut interp = RemoteInterpolator::new();
        interp.record(1, 0.0, 0.0, 0.0);
        interp.record(1, 100.0, 10.0, 0.0);
        let positions = interp.positions_at(50.0, 100.0);
        let (x, _) = positions[&1];
        assert!((x - 5.0).abs() < 1e-4);
    }

    #[test]
    fn extrapolation_freezes_past_the_cap() {
        let mut interp = RemoteInterpolator::new();
        interp.record(1, 0.0, 0.0, 0.0);
        interp.record(1, 100.0, 10.0, 0.0);
        let far_future = interp.positions_at(1000.0, 100.0);
        let capped_at_200 = interp.positions_at(200.0, 100.0);
        assert_eq!(far_future[&1], capped_at_200[&1]);
    }

    #[test]
    fn single_sample_holds_position() {
        let mut interp = RemoteInterpolator::new();
        interp.record(1, 0.0, 3.0, 4.0);
        let positions = interp.positions_at(50.0, 100.0);
        assert_eq!(positions[&1], (3.0, 4.0));
    }
}
