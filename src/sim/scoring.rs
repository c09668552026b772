//! Food points and score milestones

/// Points for one food pickup: base, doubled by double-score, times the
/// combo multiplier, floored.
pub fn food_points(base: u64, double_score: bool, multiplier: f64) -> u64 {
    let base = if double_score { base * 2 } else { base };
    (base as f64 * multiplier).floor() as u64
}

/// Milestone boundaries crossed when the score rises to `score`.
///
/// `last_milestone` is the highest boundary already reported. Every boundary
/// in between is returned once, in ascending order.
pub fn milestones_crossed(last_milestone: u64, score: u64, step: u64) -> Vec<u64> {
    if step == 0 {
        return Vec::new();
    }
    let reached = score / step * step;
    let mut out = Vec::new();
    let mut next = last_milestone / step * step + step;
    while next <= reached {
        out.push(next);
        next += step;
    }
    out
}
