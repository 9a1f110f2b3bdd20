use crate::types::LocationFix;

/// Reduces the fix history to a single reference origin
///
/// # Selection
/// - Fixes with accuracy radius above the threshold are skipped silently
/// - Smallest accuracy radius wins
/// - Ties go to the later timestamp, then to the later arrival
///
/// Pure: the caller stores the returned fix and triggers any recomputation.
#[derive(Clone, Copy, Debug)]
pub struct LocationEstimator {
    accuracy_threshold_m: f64,
}

impl LocationEstimator {
    pub fn new(accuracy_threshold_m: f64) -> Self {
        LocationEstimator {
            accuracy_threshold_m,
        }
    }

    pub fn accuracy_threshold_m(&self) -> f64 {
        self.accuracy_threshold_m
    }

    /// Whether a fix may ever become the origin
    pub fn is_admissible(&self, fix: &LocationFix) -> bool {
        fix.horizontal_accuracy <= self.accuracy_threshold_m
    }

    /// Best fix in the history, or None while nothing qualifies
    pub fn estimate(&self, fixes: &[LocationFix]) -> Option<LocationFix> {
        fixes
            .iter()
            .filter(|fix| self.is_admissible(fix))
            .fold(None, |best: Option<&LocationFix>, candidate| match best {
                None => Some(candidate),
                Some(current) => {
                    let better = candidate.horizontal_accuracy < current.horizontal_accuracy
                        || (candidate.horizontal_accuracy == current.horizontal_accuracy
                            && candidate.timestamp >= current.timestamp);
                    if better {
                        Some(candidate)
                    } else {
                        Some(current)
                    }
                }
            })
            .copied()
    }
}
