use roam_engine::{intersects, is_near, Marker, MarkerId, Rect};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Proximity {
    Overlapping,
    Near,
    Far,
}

pub(crate) fn classify(player: &Rect, marker: &Rect, margin: u32) -> Proximity {
    if intersects(player, marker) {
        Proximity::Overlapping
    } else if is_near(player, marker, margin) {
        Proximity::Near
    } else {
        Proximity::Far
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct InteractionReport {
    pub(crate) blocking_overlap: bool,
    pub(crate) near_marker_id: Option<MarkerId>,
    /// One flag per marker, in marker order.
    pub(crate) highlights: Vec<bool>,
}

/// Classifies every marker against `player`. When several markers qualify,
/// the last one in order is the active marker; it only becomes
/// `near_marker_id` if it is near rather than overlapping.
pub(crate) fn detect(player: &Rect, markers: &[Marker], margin: u32) -> InteractionReport {
    let mut report = InteractionReport {
        highlights: Vec::with_capacity(markers.len()),
        ..InteractionReport::default()
    };
    let mut active: Option<(&MarkerId, Proximity)> = None;

    for marker in markers {
        let proximity = classify(player, &marker.rect, margin);
        match proximity {
            Proximity::Overlapping => report.blocking_overlap = true,
            Proximity::Near | Proximity::Far => {}
        }
        if proximity != Proximity::Far {
            active = Some((&marker.id, proximity));
        }
        report.highlights.push(proximity == Proximity::Near);
    }

    report.near_marker_id = match active {
        Some((id, Proximity::Near)) => Some(id.clone()),
        _ => None,
    };
    report
}
