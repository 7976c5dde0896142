use std::cmp::Ordering;

use glam::Vec3;

use crate::catalog::catalog::Body;
use crate::{RankedDistance, ScenePosition, ScreenPosition, SCALE_FACTOR};

/// Rounds half away from zero to two decimals.
pub fn round_to_hundredths(value: f32) -> f32 {
    (value * 100.0).round() / 100.0
}

/// Distance from `reference` to `position`, in AU rounded to two decimals.
pub fn distance_au(position: Vec3, reference: Vec3) -> f32 {
    round_to_hundredths((reference - position).length() / SCALE_FACTOR)
}

/// Orders by the published two-decimal distance, then id. Bodies that round
/// to the same distance order by id even when one is marginally closer.
fn by_distance_then_id(a: &RankedDistance, b: &RankedDistance) -> Ordering {
    a.distance_au
        .total_cmp(&b.distance_au)
        .then_with(|| a.body_id.cmp(&b.body_id))
}

/// Per-frame distance ranking. Keeps its output buffer between frames so a
/// steady-state frame does not allocate.
#[derive(Debug, Default)]
pub struct DistanceRanker {
    ranked: Vec<RankedDistance>,
}

impl DistanceRanker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ranks every entry by its rounded distance to `reference`, ascending,
    /// ties broken by body id. The sort key is the `distance_au` value in the
    /// output, so the published list is always monotonic.
    pub fn rank<'a, I>(&mut self, entries: I, reference: Vec3) -> &[RankedDistance]
    where
        I: IntoIterator<Item = (&'a Body, &'a ScenePosition, ScreenPosition)>,
    {
        self.ranked.clear();
        self.ranked
            .extend(entries.into_iter().map(|(body, position, screen_pos)| RankedDistance {
                body_id: body.id.clone(),
                name: body.name.clone(),
                distance_au: distance_au(position.pos, reference),
                screen_pos,
            }));
        // keys are unique per body, so the unstable sort is still deterministic
        self.ranked.sort_unstable_by(by_distance_then_id);
        &self.ranked
    }

    /// Result of the most recent `rank` call.
    pub fn ranked(&self) -> &[RankedDistance] {
        &self.ranked
    }
}

/// One-shot form of [`DistanceRanker::rank`].
pub fn rank_distances<'a, I>(entries: I, reference: Vec3) -> Vec<RankedDistance>
where
    I: IntoIterator<Item = (&'a Body, &'a ScenePosition, ScreenPosition)>,
{
    let mut ranker = DistanceRanker::new();
    ranker.rank(entries, reference);
    ranker.ranked
}
