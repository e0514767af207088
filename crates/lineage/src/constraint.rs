//! Position constraint engine.
//!
//! Keeps derived geometry consistent after a person moves or is resized:
//!
//! 1. the person's spouse stays directly beside it,
//! 2. every arrow touching either of them is re-routed,
//! 3. the marriage anchor stays on the junction of the two boxes.
//!
//! Spouse mirroring is a nested move of both spouses. The nested calls carry
//! [`Propagation::SpouseMirror`], which stops them from mirroring back.

use std::f32::consts::FRAC_PI_6;

use log::{trace, warn};

use lineage_core::{
    geometry::{Point, Size},
    identifier::Id,
    text::TextMeasure,
};

use crate::{
    config::GeometryConfig,
    error::DocumentError,
    model::EdgeRoute,
    store::NodeStore,
};

/// Whether a move was requested directly or caused by a spouse moving.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Propagation {
    Origin,
    SpouseMirror,
}

struct Couple {
    left: Id,
    right: Id,
    offset: f32,
}

pub(crate) struct ConstraintEngine<'a> {
    store: &'a mut NodeStore,
    geometry: &'a GeometryConfig,
    measure: &'a dyn TextMeasure,
}

impl<'a> ConstraintEngine<'a> {
    pub(crate) fn new(
        store: &'a mut NodeStore,
        geometry: &'a GeometryConfig,
        measure: &'a dyn TextMeasure,
    ) -> Self {
        Self {
            store,
            geometry,
            measure,
        }
    }

    /// Moves a person and brings its spouse, arrows and anchor along.
    ///
    /// A married couple is always laid out from the left spouse: moving the
    /// right spouse moves the left one by the same amount and re-derives the
    /// right position from it.
    pub(crate) fn move_person(
        &mut self,
        id: Id,
        position: Point,
        propagation: Propagation,
    ) -> Result<(), DocumentError> {
        if propagation == Propagation::Origin {
            if let Some(couple) = self.couple(id)? {
                let left = if couple.left == id {
                    position
                } else {
                    Point::new(position.x() - couple.offset, position.y())
                };
                let right = Point::new(left.x() + couple.offset, left.y());
                self.move_person(couple.left, left, Propagation::SpouseMirror)?;
                return self.move_person(couple.right, right, Propagation::SpouseMirror);
            }
        }

        trace!(id:% = id, x = position.x(), y = position.y(); "Moving person");
        self.store.person_mut(id)?.set_position(position);
        self.refresh_edges(id)?;
        self.refresh_anchor(id)
    }

    /// Refits the box to its label, then re-applies the move follow-ups.
    pub(crate) fn resize(&mut self, id: Id) -> Result<(), DocumentError> {
        let person = self.store.person(id)?;
        let position = person.position();
        let (size, label) = self.fit(&person.details().display_name);
        trace!(id:% = id, width = size.width(), height = size.height(); "Resizing person");
        self.store.person_mut(id)?.set_size(size, label);
        self.move_person(id, position, Propagation::Origin)
    }

    /// Box and label sizes for a display name.
    ///
    /// The box never shrinks below the configured default size.
    pub(crate) fn fit(&self, label: &str) -> (Size, Size) {
        let label_size = self.measure.measure(label);
        let size = label_size
            .add_padding(self.geometry.label_padding())
            .max(self.geometry.default_size());
        (size, label_size)
    }

    /// Sets positions without mirroring, then refreshes derived geometry.
    ///
    /// Used to restore exact snapshots, where the spouse's position is part
    /// of the snapshot.
    pub(crate) fn place(&mut self, placements: &[(Id, Point)]) -> Result<(), DocumentError> {
        for (id, position) in placements {
            self.store.person_mut(*id)?.set_position(*position);
        }
        for (id, _) in placements {
            self.refresh_edges(*id)?;
            self.refresh_anchor(*id)?;
        }
        Ok(())
    }

    /// The marriage `id` belongs to, with the distance between the two centers.
    fn couple(&self, id: Id) -> Result<Option<Couple>, DocumentError> {
        let person = self.store.person(id)?;
        let Some(marriage_id) = person.marriage() else {
            return Ok(None);
        };
        let marriage = self.store.marriage(marriage_id)?;
        let (left, right) = (marriage.left(), marriage.right());
        let (Ok(left_person), Ok(right_person)) = (self.store.person(left), self.store.person(right))
        else {
            warn!(marriage:% = marriage_id; "Marriage references a missing spouse");
            return Ok(None);
        };

        let offset = (left_person.size().width() + right_person.size().width()) / 2.0;
        Ok(Some(Couple {
            left,
            right,
            offset,
        }))
    }

    /// Re-routes every arrow touching `person`.
    pub(crate) fn refresh_edges(&mut self, person: Id) -> Result<(), DocumentError> {
        let edges: Vec<Id> = self.store.person(person)?.edges().collect();
        for edge in edges {
            let Ok(route) = self.route(edge) else {
                warn!(edge:% = edge, person:% = person; "Skipping arrow with a missing endpoint");
                continue;
            };
            self.store.relationship_mut(edge)?.set_route(route);
        }
        Ok(())
    }

    /// Straight arrow from the parent's center to the child's border.
    ///
    /// Hidden while the two boxes overlap.
    pub(crate) fn route(&self, edge: Id) -> Result<EdgeRoute, DocumentError> {
        let relationship = self.store.relationship(edge)?;
        let from = self.store.person(relationship.from())?;
        let to = self.store.person(relationship.to())?;

        let target = to.bounds();
        if from.bounds().intersects(&target) {
            return Ok(EdgeRoute::Hidden);
        }

        let start = from.position();
        let Some(tip) = target.boundary_intersection(start, to.position()) else {
            return Ok(EdgeRoute::Hidden);
        };
        let back = start.sub_point(tip);
        let length = back.hypot();
        if length == 0.0 {
            return Ok(EdgeRoute::Hidden);
        }

        let back = back.scale(self.geometry.arrow_size() / length);
        let left = tip.add_point(back.rotate(FRAC_PI_6));
        let right = tip.add_point(back.rotate(-FRAC_PI_6));
        Ok(EdgeRoute::Visible {
            start,
            end: left.midpoint(right),
            head: [tip, left, right],
        })
    }

    /// Puts the marriage anchor of `person`, if any, on the junction of the boxes.
    pub(crate) fn refresh_anchor(&mut self, person: Id) -> Result<(), DocumentError> {
        let Some(marriage_id) = self.store.person(person)?.marriage() else {
            return Ok(());
        };
        let left_id = self.store.marriage(marriage_id)?.left();
        let anchor = match self.store.person(left_id) {
            Ok(left) => Point::new(
                left.position().x() + left.size().width() / 2.0,
                left.position().y(),
            ),
            Err(_) => {
                warn!(marriage:% = marriage_id; "Marriage references a missing left spouse");
                return Ok(());
            }
        };
        self.store.marriage_mut(marriage_id)?.set_anchor(anchor);
        Ok(())
    }
}
