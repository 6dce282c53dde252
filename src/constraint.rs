//! Per-step fragment constraint.
//!
//! After the host integrates a fragment, its ground position is pulled back
//! into the zone that contains it or, failing that, into the zone whose
//! center is nearest. A fragment that had to be moved has left its zone and
//! settles on the spot: its kinematics are zeroed and it is never touched
//! again until the session resets.

use crate::types::{DamageZone, DebrisFragment};

/// What a single constraint pass did to a fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintOutcome {
    /// Already settled; nothing was read or written.
    Frozen,
    /// No zones exist, so there is nothing to constrain against.
    Unconstrained,
    /// Inside a zone; the fragment stays live.
    Inside,
    /// Clamped to a zone edge and frozen this step.
    Settled,
}

/// Index of the zone the fragment should be held to, if any.
///
/// The first containing zone wins. Otherwise the zone with the smallest
/// squared center distance wins, first one on ties.
pub fn select_zone(zones: &[DamageZone], x: f32, z: f32) -> Option<usize> {
    if let Some(i) = zones.iter().position(|zone| zone.contains(x, z)) {
        return Some(i);
    }

    let mut best: Option<(usize, f32)> = None;
    for (i, zone) in zones.iter().enumerate() {
        let d2 = zone.distance_sq_to_center(x, z);
        match best {
            Some((_, best_d2)) if d2 >= best_d2 => {}
            _ => best = Some((i, d2)),
        }
    }
    best.map(|(i, _)| i)
}

/// Apply the constraint in place.
pub fn constrain(fragment: &mut DebrisFragment, zones: &[DamageZone]) -> ConstraintOutcome {
    if fragment.settled {
        return ConstraintOutcome::Frozen;
    }

    let (x, z) = (fragment.position.x, fragment.position.z);
    let Some(index) = select_zone(zones, x, z) else {
        return ConstraintOutcome::Unconstrained;
    };

    let (cx, cz) = zones[index].clamp(x, z);
    if cx == x && cz == z {
        return ConstraintOutcome::Inside;
    }

    fragment.position.x = cx;
    fragment.position.z = cz;
    fragment.freeze();
    ConstraintOutcome::Settled
}

/// Functional form of [`constrain`]: returns the corrected fragment.
pub fn advance(fragment: &DebrisFragment, zones: &[DamageZone]) -> DebrisFragment {
    let mut next = fragment.clone();
    constrain(&mut next, zones);
    next
}
