#[cfg(test)]
mod sim_tests {
    use crate::core::alerts::dispatch::RecordingSink;
    use crate::core::alerts::engine::{Destination, ProximityEngine};
    use crate::core::alerts::model::DisplayState;
    use crate::core::coordinator::Coordinator;
    use crate::core::geo::{GeoPoint, ProximityThreshold, EARTH_RADIUS_METERS};
    use crate::core::log_io::StartAt;
    use crate::core::tracker::TrackedPositionLog;
    use std::fs::File;
    use std::io::Write;
    use std::time::{Duration, Instant};
    use tempfile::tempdir;

    const TARGET: (f64, f64) = (12.9716, 77.5946);

    fn line_at(meters_north: f64) -> String {
        let lat = TARGET.0 + (meters_north / EARTH_RADIUS_METERS).to_degrees();
        format!("{},{}", lat, TARGET.1)
    }

    #[test]
    fn simulate_arrival_from_position_log() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("positions.log");
        let mut file = File::create(&path).unwrap();

        let sink = RecordingSink::default();
        let calls = sink.calls();
        let mut coord = Coordinator::new(ProximityEngine::default(), Box::new(sink), Duration::from_secs(1));
        coord.start_route(Destination {
            target: GeoPoint::new(TARGET.0, TARGET.1).unwrap(),
            threshold: ProximityThreshold::new(300.0).unwrap(),
        });

        let mut log = TrackedPositionLog::open(&path, StartAt::End).unwrap();
        let base = Instant::now();
        let mut displays = Vec::new();

        for (i, meters) in [500.0, 250.0, 200.0, 260.0, 310.0].iter().enumerate() {
            writeln!(file, "{}", line_at(*meters)).unwrap();
            file.sync_all().unwrap();

            let output = coord.tick(&mut log, base + Duration::from_secs(i as u64));
            assert_eq!(output.evaluations.len(), 1);
            displays.push(output.evaluations[0].display);
        }

        assert_eq!(
            displays,
            vec![
                DisplayState::NoAlert,
                DisplayState::Alert,
                DisplayState::Alert,
                DisplayState::Alert,
                DisplayState::Alert,
            ]
        );
        assert_eq!(*calls.lock().unwrap(), vec![250.0]);

        // Walk away past the band, then come back after the cooldown
        writeln!(file, "{}", line_at(400.0)).unwrap();
        writeln!(file, "{}", line_at(100.0)).unwrap();
        file.sync_all().unwrap();
        let output = coord.tick(&mut log, base + Duration::from_secs(10));
        assert_eq!(output.evaluations[0].display, DisplayState::NoAlert);
        assert!(output.evaluations[1].dispatched);
        assert_eq!(calls.lock().unwrap().len(), 2);
    }
}
