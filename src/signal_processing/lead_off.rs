use crate::config::LeadOffConfig;

/// Flags samples taken while an electrode is disconnected
///
/// With a lead off the front end drifts to a rail, so any raw sample whose
/// magnitude exceeds `rail_limit` marks the signal as unusable. The flag is
/// held for `hold_samples` clean samples afterwards, long enough for the
/// railed values to leave every trailing buffer that feeds a decision.
#[derive(Debug, Clone)]
pub struct LeadOffDetector {
    rail_limit: Option<u32>,
    hold_samples: usize,
    remaining: usize,
    railed_samples: u64,
}

impl LeadOffDetector {
    pub fn new(config: &LeadOffConfig, hold_samples: usize) -> Self {
        Self {
            rail_limit: config.enabled.then_some(config.rail_limit),
            hold_samples,
            remaining: 0,
            railed_samples: 0,
        }
    }

    /// Feed the next raw sample; returns whether the leads count as off
    pub fn update(&mut self, raw: i32) -> bool {
        let Some(limit) = self.rail_limit else {
            return false;
        };

        if raw.unsigned_abs() > limit {
            self.railed_samples += 1;
            self.remaining = self.hold_samples;
            return true;
        }
        if self.remaining > 0 {
            self.remaining -= 1;
            return true;
        }
        false
    }

    pub fn is_off(&self) -> bool {
        self.remaining > 0
    }

    /// Total samples beyond the rail limit
    pub fn railed_samples(&self) -> u64 {
        self.railed_samples
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detector(hold: usize) -> LeadOffDetector {
        LeadOffDetector::new(&LeadOffConfig::default(), hold)
    }

    #[test]
    fn test_normal_signal_is_connected() {
        let mut det = detector(3);
        for raw in [0, 2000, -2000, 35000, -35000] {
            assert!(!det.update(raw));
        }
        assert_eq!(det.railed_samples(), 0);
    }

    #[test]
    fn test_railed_sample_holds_flag() {
        let mut det = detector(3);
        assert!(det.update(35001));
        assert!(det.update(0));
        assert!(det.update(0));
        assert!(det.update(0));
        assert!(!det.update(0));
        assert!(!det.is_off());

        // Negative rail and full-scale code both count
        assert!(det.update(-40000));
        assert!(det.update(0x7F_FFFF));
        assert!(det.update(i32::MIN));
        assert_eq!(det.railed_samples(), 4);
    }

    #[test]
    fn test_disabled_never_flags() {
        let config = LeadOffConfig {
            enabled: false,
            ..LeadOffConfig::default()
        };
        let mut det = LeadOffDetector::new(&config, 10);
        assert!(!det.update(i32::MAX));
        assert_eq!(det.railed_samples(), 0);
    }
}
