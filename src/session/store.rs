//! Append-only frame history.

use std::sync::Arc;

use crate::models::{BerPoint, Frame};

/// One version of the session's frame history.
///
/// Frames live behind an `Arc`, so handing a copy of the store to a
/// reader is cheap and that copy never changes afterwards. Appending to a
/// store that still has readers copies the frames first.
#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    frames: Arc<Vec<Frame>>,
    version: u64,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next version with `frame` at the end.
    pub fn append(mut self, frame: Frame) -> Self {
        Arc::make_mut(&mut self.frames).push(frame);
        self.version += 1;
        self
    }

    /// Next version with no frames. The version counter keeps counting.
    pub fn clear(self) -> Self {
        Self {
            frames: Arc::new(Vec::new()),
            version: self.version + 1,
        }
    }

    /// Frames in insertion order.
    #[cfg(test)]
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// Shared handle on the frames of this version.
    pub fn shared_frames(&self) -> Arc<Vec<Frame>> {
        Arc::clone(&self.frames)
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Number of state transitions since the store was created.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// One BER point per frame, numbered from 1.
    pub fn ber_history(&self) -> Vec<BerPoint> {
        self.frames
            .iter()
            .enumerate()
            .map(|(i, frame)| BerPoint {
                run: i + 1,
                ber_before: frame.result.ber_before,
                ber_after: frame.result.ber_after,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EccUsage, FrameId, SimulationConfig, SimulationResult};

    fn create_test_frame(id: u64, ber_before: f64) -> Frame {
        Frame {
            id: FrameId(id),
            config: SimulationConfig::default(),
            result: SimulationResult {
                success: true,
                ber_before,
                ber_after: ber_before / 2.0,
                ecc_used: EccUsage::flag(true),
                noise_type: "awgn".to_string(),
                ai_corrected: false,
                latency_ms: 1.0,
            },
        }
    }

    #[test]
    fn test_append_preserves_order() {
        let store = SessionStore::new()
            .append(create_test_frame(10, 0.1))
            .append(create_test_frame(11, 0.2))
            .append(create_test_frame(12, 0.3));

        let ids: Vec<u64> = store.frames().iter().map(|f| f.id.0).collect();
        assert_eq!(ids, vec![10, 11, 12]);
        assert_eq!(store.version(), 3);
    }

    #[test]
    fn test_ber_history_matches_frames() {
        let store = SessionStore::new()
            .append(create_test_frame(1, 0.1))
            .append(create_test_frame(2, 0.2));

        let history = store.ber_history();
        assert_eq!(history.len(), store.len());
        assert_eq!(history[0].run, 1);
        assert_eq!(history[1].run, 2);
        assert_eq!(history[1].ber_before, 0.2);
        assert_eq!(history[1].ber_after, 0.1);
    }

    #[test]
    fn test_earlier_versions_are_untouched() {
        let first = SessionStore::new().append(create_test_frame(1, 0.1));
        let snapshot = first.shared_frames();

        let second = first.append(create_test_frame(2, 0.2));

        assert_eq!(snapshot.len(), 1);
        assert_eq!(second.len(), 2);
        assert_eq!(second.frames()[0], snapshot[0]);
    }

    #[test]
    fn test_clear_empties_and_bumps_version() {
        let store = SessionStore::new()
            .append(create_test_frame(1, 0.1))
            .append(create_test_frame(2, 0.2));
        let cleared = store.clear();

        assert!(cleared.is_empty());
        assert!(cleared.ber_history().is_empty());
        assert_eq!(cleared.version(), 3);

        let next = cleared.append(create_test_frame(3, 0.4));
        assert_eq!(next.ber_history()[0].run, 1);
    }
}
