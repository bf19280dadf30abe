//! Target selection over one sweep's candidates.

use tankstrike_core::state::ObservedObject;
use tankstrike_core::types::{ObjectId, Position};

/// The chosen target and why.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub id: ObjectId,
    pub position: Position,
    pub health: i32,
    pub distance: f64,
    /// The previous target was still present and kept.
    pub retained: bool,
}

/// Pick a target among `candidates`.
///
/// The current target wins whenever it is still present. Otherwise the
/// lowest-health tank is chosen, ties broken by distance. Non-tanks and
/// tanks without positive health are never eligible.
pub fn select_target<'a, I>(candidates: I, own: &Position, current: Option<ObjectId>) -> Option<Selection>
where
    I: IntoIterator<Item = &'a ObservedObject>,
{
    let eligible: Vec<(&ObservedObject, i32)> = candidates
        .into_iter()
        .filter(|o| o.is_tank())
        .filter_map(|o| o.health.filter(|h| *h > 0).map(|h| (o, h)))
        .collect();

    let selection = |o: &ObservedObject, health: i32, retained: bool| Selection {
        id: o.id,
        position: o.position,
        health,
        distance: own.range_to(&o.position),
        retained,
    };

    if let Some(current) = current {
        if let Some((o, h)) = eligible.iter().find(|(o, _)| o.id == current) {
            return Some(selection(o, *h, true));
        }
    }

    eligible
        .iter()
        .min_by(|(a, ha), (b, hb)| {
            ha.cmp(hb)
                .then_with(|| own.range_to(&a.position).total_cmp(&own.range_to(&b.position)))
        })
        .map(|(o, h)| selection(o, *h, false))
}
