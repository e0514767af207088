//! Graph mutator: the only way the document's structure changes.
//!
//! Every operation validates its inputs against the store before touching
//! anything, so a rejected call leaves the document as it was. A successful
//! call returns the [`Operation`] record describing what it did, which the
//! command stack keeps for undo and redo.
//!
//! Links between entities are derived here and nowhere else:
//!
//! - a relationship is listed in the edge set of both endpoints
//! - a marriage sets `spouse` and `marriage` on both spouses
//!
//! Detaching an entity clears the links that point at it, and reattaching a
//! detached record re-derives them, so the detached records themselves are
//! plain snapshots.

use std::{collections::HashSet, sync::Arc};

use log::{debug, warn};
use serde::Serialize;

use lineage_core::{
    color::Color,
    geometry::{Point, Size},
    identifier::Id,
    text::TextMeasure,
};

use crate::{
    config::{GeometryConfig, LayoutConfig},
    constraint::{ConstraintEngine, Propagation},
    error::DocumentError,
    history::{Operation, Placement},
    model::{
        DetailsPatch, Entity, ItemKind, Marriage, MarriageDetails, Person, PersonDetails,
        PersonStyle, Relationship,
    },
    store::{Detached, NodeStore},
};

/// Default colors and line width given to new items.
#[derive(Debug, Clone)]
pub(crate) struct Palette {
    pub(crate) fill: Color,
    pub(crate) text: Color,
    pub(crate) border: Color,
    pub(crate) line: Color,
    pub(crate) line_width: f32,
}

impl Palette {
    pub(crate) fn person_style(&self) -> PersonStyle {
        PersonStyle {
            fill: self.fill,
            text: self.text,
            border: self.border,
        }
    }
}

/// Resolved settings shared by every operation on a document.
#[derive(Debug, Clone)]
pub(crate) struct Settings {
    pub(crate) geometry: GeometryConfig,
    pub(crate) layout: LayoutConfig,
    pub(crate) palette: Palette,
    pub(crate) measure: Arc<dyn TextMeasure>,
}

/// How [`marry`](crate::document::Document::marry) picks the left spouse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MarryMode {
    /// The person further left on the canvas becomes the left spouse. On a
    /// tie the person whose id sorts first is left.
    Interactive,
    /// The arguments are taken as `(left, right)` exactly. The left spouse
    /// keeps its position and the right one is placed beside it.
    Replay,
}

/// Result of a successful marriage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MarriageOutcome {
    pub marriage: Id,
    pub left: Id,
    pub right: Id,
    /// `true` if the left spouse was the second argument.
    pub swapped: bool,
}

/// A style attribute that can be changed on a group of items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum StyleProperty {
    /// Person box fill.
    Fill,
    /// Person label color.
    Text,
    /// Person box border.
    Border,
    /// Relationship arrow color.
    LineColor,
    /// Relationship arrow width.
    LineWidth,
}

impl StyleProperty {
    fn target_kind(self) -> ItemKind {
        match self {
            StyleProperty::Fill | StyleProperty::Text | StyleProperty::Border => ItemKind::Person,
            StyleProperty::LineColor | StyleProperty::LineWidth => ItemKind::Relationship,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum StyleValue {
    Color(Color),
    Width(f32),
}

/// One item's style attribute before and after a restyle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StyleChange {
    pub item: Id,
    pub property: StyleProperty,
    pub before: StyleValue,
    pub after: StyleValue,
}

pub(crate) struct GraphMutator<'a> {
    store: &'a mut NodeStore,
    canvas: &'a mut Size,
    settings: &'a Settings,
}

impl<'a> GraphMutator<'a> {
    pub(crate) fn new(store: &'a mut NodeStore, canvas: &'a mut Size, settings: &'a Settings) -> Self {
        Self {
            store,
            canvas,
            settings,
        }
    }

    pub(crate) fn store(&self) -> &NodeStore {
        self.store
    }

    pub(crate) fn store_mut(&mut self) -> &mut NodeStore {
        self.store
    }

    pub(crate) fn settings(&self) -> &Settings {
        self.settings
    }

    pub(crate) fn set_canvas(&mut self, size: Size) {
        *self.canvas = size;
    }

    fn engine(&mut self) -> ConstraintEngine<'_> {
        ConstraintEngine::new(
            self.store,
            &self.settings.geometry,
            self.settings.measure.as_ref(),
        )
    }

    /// Adds a person with default details and style at `position`.
    pub(crate) fn create_person(&mut self, position: Point) -> Result<(Id, Operation), DocumentError> {
        ensure_finite(position)?;
        let id = self.insert_person(
            None,
            PersonDetails::default(),
            self.settings.palette.person_style(),
            position,
        )?;
        debug!(id:% = id, x = position.x(), y = position.y(); "Person created");
        let operation = Operation::CreatePerson {
            person: self.store.snapshot(id)?,
        };
        Ok((id, operation))
    }

    /// Inserts a person with its box fitted to the display name.
    ///
    /// With `id` set, the id is used as is and must never have been seen by
    /// the store.
    pub(crate) fn insert_person(
        &mut self,
        id: Option<Id>,
        details: PersonDetails,
        style: PersonStyle,
        position: Point,
    ) -> Result<Id, DocumentError> {
        let (size, label_size) = self.engine().fit(&details.display_name);
        let mut person = Person::new(id.unwrap_or_else(|| Id::new("")), details, style, position, size);
        person.set_size(size, label_size);
        match id {
            Some(_) => self.store.create_with_id(Entity::Person(person)),
            None => Ok(self.store.create(Entity::Person(person))),
        }
    }

    /// Deletes persons, relationships and marriages in one step.
    ///
    /// A person takes its relationships and its marriage with it. Ids that
    /// are already gone, including ones removed earlier in the same call by
    /// a cascade, are skipped. Returns the removed records in removal order,
    /// empty when nothing was removed.
    pub(crate) fn delete_items(&mut self, ids: &[Id]) -> Result<Vec<Detached>, DocumentError> {
        let mut removed = Vec::new();
        for &id in ids {
            match self.store.kind_of(id) {
                None => debug!(id:% = id; "Skipping deleted item"),
                Some(ItemKind::Relationship) => removed.push(self.detach(id)?),
                Some(ItemKind::Marriage) => removed.push(self.detach(id)?),
                Some(ItemKind::Person) => {
                    let person = self.store.person(id)?;
                    let edges: Vec<Id> = person.edges().collect();
                    let marriage = person.marriage();
                    for edge in edges {
                        removed.push(self.detach(edge)?);
                    }
                    if let Some(marriage) = marriage {
                        removed.push(self.detach(marriage)?);
                    }
                    removed.push(self.detach(id)?);
                }
            }
        }

        if !removed.is_empty() {
            debug!(count = removed.len(); "Items deleted");
        }
        Ok(removed)
    }

    /// Takes one entity out of the store and clears the links pointing at it.
    ///
    /// A person must have no relationships and no marriage left.
    pub(crate) fn detach(&mut self, id: Id) -> Result<Detached, DocumentError> {
        match self.store.kind_of(id) {
            Some(ItemKind::Person) => {
                let person = self.store.person(id)?;
                if person.edges().next().is_some() || person.is_married() {
                    return Err(DocumentError::invalid(format!(
                        "person `{id}` still has relationships or a marriage"
                    )));
                }
            }
            Some(ItemKind::Relationship) => {
                let relationship = self.store.relationship(id)?;
                let (from, to) = (relationship.from(), relationship.to());
                for endpoint in [from, to] {
                    match self.store.person_mut(endpoint) {
                        Ok(person) => person.detach_edge(id),
                        Err(_) => {
                            warn!(edge:% = id, person:% = endpoint; "Relationship endpoint already removed")
                        }
                    }
                }
            }
            Some(ItemKind::Marriage) => {
                let marriage = self.store.marriage(id)?;
                let (left, right) = (marriage.left(), marriage.right());
                for spouse in [left, right] {
                    match self.store.person_mut(spouse) {
                        Ok(person) => person.set_spouse(None, None),
                        Err(_) => {
                            warn!(marriage:% = id, person:% = spouse; "Spouse already removed")
                        }
                    }
                }
            }
            None => {}
        }
        self.store.remove(id)
    }

    /// Puts a detached entity back and re-derives its links.
    pub(crate) fn reattach(&mut self, detached: Detached) -> Result<(), DocumentError> {
        match detached.entity() {
            Entity::Person(_) => {}
            Entity::Relationship(relationship) => {
                let (id, from, to) = (relationship.id(), relationship.from(), relationship.to());
                self.store.person_mut(from)?.attach_edge(id);
                self.store.person_mut(to)?.attach_edge(id);
            }
            Entity::Marriage(marriage) => {
                let (id, left, right) = (marriage.id(), marriage.left(), marriage.right());
                self.store.person_mut(left)?.set_spouse(Some(right), Some(id));
                self.store.person_mut(right)?.set_spouse(Some(left), Some(id));
            }
        }
        self.store.restore(detached);
        Ok(())
    }

    /// Adds a parent → child relationship with the default line style.
    pub(crate) fn connect(&mut self, from: Id, to: Id) -> Result<(Id, Operation), DocumentError> {
        self.store.person(from)?;
        self.store.person(to)?;
        if from == to {
            return Err(DocumentError::invalid(format!(
                "person `{from}` cannot be their own parent"
            )));
        }
        if self
            .store
            .relationships()
            .any(|relationship| relationship.from() == from && relationship.to() == to)
        {
            return Err(DocumentError::invalid(format!(
                "`{from}` is already a parent of `{to}`"
            )));
        }

        let palette = &self.settings.palette;
        let relationship = Relationship::new(Id::new(""), from, to, palette.line, palette.line_width);
        let id = self.store.create(Entity::Relationship(relationship));
        self.store.person_mut(from)?.attach_edge(id);
        self.store.person_mut(to)?.attach_edge(id);

        let route = self.engine().route(id)?;
        self.store.relationship_mut(id)?.set_route(route);
        debug!(id:% = id, from:% = from, to:% = to; "Relationship created");

        let operation = Operation::Connect {
            relationship: self.store.snapshot(id)?,
        };
        Ok((id, operation))
    }

    /// Marries two unmarried persons and snaps the right spouse beside the
    /// left one.
    pub(crate) fn marry(
        &mut self,
        first: Id,
        second: Id,
        details: MarriageDetails,
        mode: MarryMode,
    ) -> Result<(MarriageOutcome, Operation), DocumentError> {
        let a = self.store.person(first)?;
        let b = self.store.person(second)?;
        if first == second {
            return Err(DocumentError::invalid(format!(
                "person `{first}` cannot marry themself"
            )));
        }
        for person in [a, b] {
            if person.is_married() {
                return Err(DocumentError::invalid(format!(
                    "person `{}` is already married",
                    person.id()
                )));
            }
        }

        let swapped = match mode {
            MarryMode::Replay => false,
            MarryMode::Interactive => {
                let (ax, bx) = (a.position().x(), b.position().x());
                bx < ax || (bx == ax && second < first)
            }
        };
        let (left, right) = if swapped {
            (second, first)
        } else {
            (first, second)
        };

        let before = self.placements(&[left, right])?;
        let marriage = Marriage::new(Id::new(""), left, right, details);
        let id = self.store.create(Entity::Marriage(marriage));
        self.store.person_mut(left)?.set_spouse(Some(right), Some(id));
        self.store.person_mut(right)?.set_spouse(Some(left), Some(id));

        let position = self.store.person(left)?.position();
        self.engine()
            .move_person(left, position, Propagation::Origin)?;
        let after = self.placements(&[left, right])?;
        debug!(id:% = id, left:% = left, right:% = right, swapped; "Marriage created");

        let outcome = MarriageOutcome {
            marriage: id,
            left,
            right,
            swapped,
        };
        let operation = Operation::Marry {
            marriage: self.store.snapshot(id)?,
            before,
            after,
        };
        Ok((outcome, operation))
    }

    /// Dissolves a marriage. Both persons stay where they are.
    pub(crate) fn unmarry(&mut self, marriage: Id) -> Result<Operation, DocumentError> {
        self.store.marriage(marriage)?;
        let marriage = self.detach(marriage)?;
        debug!(id:% = marriage.id(); "Marriage dissolved");
        Ok(Operation::Unmarry { marriage })
    }

    /// Moves persons to new centers, with spouses following.
    ///
    /// Returns `None` for an empty move or one that changes no position.
    pub(crate) fn move_persons(
        &mut self,
        ids: &[Id],
        targets: &[Point],
    ) -> Result<Option<Operation>, DocumentError> {
        if ids.len() != targets.len() {
            return Err(DocumentError::invalid(format!(
                "{} persons but {} target positions",
                ids.len(),
                targets.len()
            )));
        }
        if ids.is_empty() {
            return Ok(None);
        }
        for &target in targets {
            ensure_finite(target)?;
        }

        let group = self.with_spouses(ids)?;
        let before = self.placements(&group)?;
        let mut engine = self.engine();
        for (&id, &target) in ids.iter().zip(targets) {
            engine.move_person(id, target, Propagation::Origin)?;
        }
        let after = self.placements(&group)?;

        if before == after {
            return Ok(None);
        }
        debug!(count = ids.len(); "Persons moved");
        Ok(Some(Operation::Move { before, after }))
    }

    /// Moves one person without recording anything, as during a drag.
    pub(crate) fn drag(&mut self, id: Id, position: Point) -> Result<(), DocumentError> {
        ensure_finite(position)?;
        self.store.person(id)?;
        self.engine().move_person(id, position, Propagation::Origin)
    }

    /// Restores exact positions, then refreshes arrows and anchors.
    pub(crate) fn place(&mut self, placements: &[Placement]) -> Result<(), DocumentError> {
        let placements: Vec<(Id, Point)> = placements
            .iter()
            .map(|placement| (placement.person, placement.position))
            .collect();
        self.engine().place(&placements)
    }

    pub(crate) fn placements(&self, ids: &[Id]) -> Result<Vec<Placement>, DocumentError> {
        self.store.placements(ids)
    }

    pub(crate) fn with_spouses(&self, ids: &[Id]) -> Result<Vec<Id>, DocumentError> {
        self.store.with_spouses(ids)
    }

    /// Applies a details patch, refitting the box if the label changes.
    ///
    /// Returns the prior values of the fields the patch sets, or `None` if
    /// the patch changes nothing.
    pub(crate) fn edit_details(
        &mut self,
        id: Id,
        patch: DetailsPatch,
    ) -> Result<Option<(DetailsPatch, Operation)>, DocumentError> {
        let group = self.with_spouses(&[id])?;
        if patch.is_empty() {
            return Ok(None);
        }

        let before_placements = self.placements(&group)?;
        let prior = patch.apply_to(self.store.person_mut(id)?.details_mut());
        if prior == patch {
            return Ok(None);
        }
        if patch.touches_label() {
            self.engine().resize(id)?;
        }
        let after_placements = self.placements(&group)?;
        debug!(id:% = id; "Person details edited");

        let operation = Operation::EditDetails {
            person: id,
            before: prior.clone(),
            after: patch,
            before_placements,
            after_placements,
        };
        Ok(Some((prior, operation)))
    }

    /// Writes a details patch during undo or redo and restores positions.
    pub(crate) fn replay_details(
        &mut self,
        id: Id,
        patch: &DetailsPatch,
        placements: &[Placement],
    ) -> Result<(), DocumentError> {
        patch.apply_to(self.store.person_mut(id)?.details_mut());
        if patch.touches_label() {
            self.engine().resize(id)?;
        }
        self.place(placements)
    }

    /// Replaces a marriage's date and place. Returns `None` if unchanged.
    pub(crate) fn edit_marriage(
        &mut self,
        id: Id,
        details: MarriageDetails,
    ) -> Result<Option<Operation>, DocumentError> {
        let marriage = self.store.marriage_mut(id)?;
        if *marriage.details() == details {
            return Ok(None);
        }
        let before = std::mem::replace(marriage.details_mut(), details.clone());
        debug!(id:% = id; "Marriage details edited");
        Ok(Some(Operation::EditMarriage {
            marriage: id,
            before,
            after: details,
        }))
    }

    pub(crate) fn set_marriage_details(
        &mut self,
        id: Id,
        details: &MarriageDetails,
    ) -> Result<(), DocumentError> {
        *self.store.marriage_mut(id)?.details_mut() = details.clone();
        Ok(())
    }

    /// Sets a style attribute on every listed item.
    ///
    /// Every id must name an item of the kind the property applies to.
    /// Returns `None` if no item's value changes.
    pub(crate) fn restyle(
        &mut self,
        ids: &[Id],
        property: StyleProperty,
        value: StyleValue,
    ) -> Result<Option<Operation>, DocumentError> {
        let kind = property.target_kind();
        match (property, value) {
            (StyleProperty::LineWidth, StyleValue::Width(width))
                if width > 0.0 && width.is_finite() => {}
            (StyleProperty::LineWidth, _) => {
                return Err(DocumentError::invalid("line width must be a positive number"));
            }
            (_, StyleValue::Color(_)) => {}
            (_, StyleValue::Width(_)) => {
                return Err(DocumentError::invalid(format!(
                    "{property:?} takes a color"
                )));
            }
        }

        let mut changes = Vec::new();
        let mut seen = HashSet::new();
        for &id in ids {
            if self.store.kind_of(id) != Some(kind) {
                return Err(DocumentError::not_found(kind, id));
            }
            if !seen.insert(id) {
                continue;
            }
            let before = self.style_value(id, property)?;
            if before != value {
                changes.push(StyleChange {
                    item: id,
                    property,
                    before,
                    after: value,
                });
            }
        }

        if changes.is_empty() {
            return Ok(None);
        }
        for change in &changes {
            self.set_style_value(change.item, property, change.after)?;
        }
        debug!(count = changes.len(), property:?; "Items restyled");
        Ok(Some(Operation::Restyle { changes }))
    }

    fn style_value(&self, id: Id, property: StyleProperty) -> Result<StyleValue, DocumentError> {
        Ok(match property {
            StyleProperty::Fill => StyleValue::Color(self.store.person(id)?.style().fill),
            StyleProperty::Text => StyleValue::Color(self.store.person(id)?.style().text),
            StyleProperty::Border => StyleValue::Color(self.store.person(id)?.style().border),
            StyleProperty::LineColor => StyleValue::Color(self.store.relationship(id)?.color()),
            StyleProperty::LineWidth => StyleValue::Width(self.store.relationship(id)?.width()),
        })
    }

    pub(crate) fn set_style_value(
        &mut self,
        id: Id,
        property: StyleProperty,
        value: StyleValue,
    ) -> Result<(), DocumentError> {
        match (property, value) {
            (StyleProperty::Fill, StyleValue::Color(color)) => {
                self.store.person_mut(id)?.style_mut().fill = color
            }
            (StyleProperty::Text, StyleValue::Color(color)) => {
                self.store.person_mut(id)?.style_mut().text = color
            }
            (StyleProperty::Border, StyleValue::Color(color)) => {
                self.store.person_mut(id)?.style_mut().border = color
            }
            (StyleProperty::LineColor, StyleValue::Color(color)) => {
                self.store.relationship_mut(id)?.set_color(color)
            }
            (StyleProperty::LineWidth, StyleValue::Width(width)) => {
                self.store.relationship_mut(id)?.set_width(width)
            }
            (property, value) => {
                return Err(DocumentError::invalid(format!(
                    "{value:?} does not fit {property:?}"
                )));
            }
        }
        Ok(())
    }

    /// Changes the canvas size. Returns `None` if unchanged.
    pub(crate) fn resize_canvas(&mut self, size: Size) -> Result<Option<Operation>, DocumentError> {
        let positive = |side: f32| side > 0.0 && side.is_finite();
        if !(positive(size.width()) && positive(size.height())) {
            return Err(DocumentError::invalid(format!(
                "canvas size {}x{} must be positive",
                size.width(),
                size.height()
            )));
        }
        if *self.canvas == size {
            return Ok(None);
        }
        let before = std::mem::replace(self.canvas, size);
        debug!(width = size.width(), height = size.height(); "Canvas resized");
        Ok(Some(Operation::ResizeCanvas {
            before,
            after: size,
        }))
    }
}

/// Rejects a NaN or infinite position before anything is changed.
fn ensure_finite(position: Point) -> Result<(), DocumentError> {
    if position.is_finite() {
        return Ok(());
    }
    Err(DocumentError::invalid(format!(
        "position ({}, {}) is not a finite point",
        position.x(),
        position.y()
    )))
}
