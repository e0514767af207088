//! The editing session: a genealogy document and its undo history.
//!
//! [`Document`] is the surface the rest of an application talks to. Every
//! editing method validates its inputs, applies the change through the
//! graph mutator, and records one command on the history. Methods that
//! change nothing record nothing and return `Ok(None)`, or an empty set for
//! deletes.
//!
//! # Example
//!
//! ```
//! # use std::sync::Arc;
//! # use lineage::{config::AppConfig, document::Document, geometry::Point};
//! # use lineage_core::text::FixedAdvanceMeasure;
//! let mut doc = Document::with_measure(
//!     AppConfig::default(),
//!     Arc::new(FixedAdvanceMeasure::new(7.0, 14.0)),
//! )
//! .unwrap();
//!
//! let parent = doc.create_person(Point::new(0.0, 0.0)).unwrap();
//! let child = doc.create_person(Point::new(0.0, 300.0)).unwrap();
//! doc.connect(parent, child).unwrap();
//!
//! doc.delete_persons(&[parent]).unwrap();
//! assert_eq!(doc.relationship_count(), 0);
//!
//! doc.undo().unwrap();
//! assert_eq!(doc.relationship_count(), 1);
//! ```

use std::{collections::HashSet, fs, io::Write, path::Path, sync::Arc};

use indexmap::IndexSet;
use log::{debug, info};
use tempfile::NamedTempFile;

use lineage_core::{
    color::Color,
    geometry::{Point, Size},
    identifier::Id,
    text::TextMeasure,
};

use crate::{
    config::AppConfig,
    diagnostic::Diagnostic,
    error::{DocumentError, LineageError},
    file,
    history::{Command, CommandStack, Operation, Placement},
    layout,
    model::{
        DetailsPatch, ItemKind, ItemRef, Marriage, MarriageDetails, Person, Relationship,
    },
    mutator::{
        GraphMutator, MarriageOutcome, MarryMode, Palette, Settings, StyleProperty, StyleValue,
    },
    store::{Detached, NodeStore},
};

/// A document read from text, with the problems found while reading it.
#[derive(Debug)]
pub struct Loaded {
    pub document: Document,
    pub diagnostics: Vec<Diagnostic>,
}

/// Snapshot taken when a drag gesture starts.
///
/// Pass it back to [`Document::finish_move`] once the gesture ends.
#[derive(Debug, Clone, PartialEq)]
pub struct MoveGesture {
    before: Vec<Placement>,
}

impl MoveGesture {
    /// Persons whose positions the gesture tracks, spouses included.
    pub fn persons(&self) -> impl Iterator<Item = Id> + '_ {
        self.before.iter().map(|placement| placement.person)
    }
}

/// A genealogy document with its editing history.
#[derive(Debug)]
pub struct Document {
    store: NodeStore,
    history: CommandStack,
    canvas: Size,
    settings: Settings,
}

impl Document {
    /// Creates an empty document that measures labels with the configured font.
    ///
    /// # Errors
    ///
    /// Returns [`LineageError::Config`] if a configured color is invalid.
    pub fn new(config: AppConfig) -> Result<Self, LineageError> {
        let measure = Arc::new(config.style().font_measure());
        Self::with_measure(config, measure)
    }

    /// Creates an empty document with a custom label measure.
    ///
    /// # Errors
    ///
    /// Returns [`LineageError::Config`] if a configured color is invalid.
    pub fn with_measure(
        config: AppConfig,
        measure: Arc<dyn TextMeasure>,
    ) -> Result<Self, LineageError> {
        let style = config.style();
        let palette = Palette {
            fill: style.fill_color().map_err(LineageError::Config)?,
            text: style.text_color().map_err(LineageError::Config)?,
            border: style.border_color().map_err(LineageError::Config)?,
            line: style.line_color().map_err(LineageError::Config)?,
            line_width: style.line_width(),
        };
        Ok(Self {
            store: NodeStore::new(),
            history: CommandStack::new(),
            canvas: config.canvas().size(),
            settings: Settings {
                geometry: config.geometry().clone(),
                layout: config.layout().clone(),
                palette,
                measure,
            },
        })
    }

    /// Reads a document from its XML text.
    ///
    /// Elements that cannot be loaded are dropped and reported in
    /// [`Loaded::diagnostics`]; they do not fail the load.
    ///
    /// # Errors
    ///
    /// Returns [`LineageError::Load`] if the text is not a genealogy
    /// document at all.
    pub fn from_xml(
        config: AppConfig,
        measure: Arc<dyn TextMeasure>,
        source: &str,
    ) -> Result<Loaded, LineageError> {
        let mut document = Self::with_measure(config, measure)?;
        let diagnostics = file::read(&mut document.mutator(), source)
            .map_err(|err| LineageError::new_load_error(err, source))?;
        info!(
            persons = document.person_count(),
            relationships = document.relationship_count(),
            marriages = document.marriage_count(),
            diagnostics = diagnostics.len();
            "Document loaded"
        );
        Ok(Loaded {
            document,
            diagnostics,
        })
    }

    /// Reads a document from a file.
    ///
    /// # Errors
    ///
    /// Returns [`LineageError::Io`] if the file cannot be read, otherwise
    /// as [`Document::from_xml`].
    pub fn open(
        config: AppConfig,
        measure: Arc<dyn TextMeasure>,
        path: impl AsRef<Path>,
    ) -> Result<Loaded, LineageError> {
        let path = path.as_ref();
        info!(path:? = path; "Opening document");
        let source = fs::read_to_string(path)?;
        Self::from_xml(config, measure, &source)
    }

    /// The document as XML text.
    pub fn to_xml(&self) -> String {
        file::write(&self.store, self.canvas)
    }

    /// Writes the document to `path` and marks it clean.
    ///
    /// The text goes to a temporary file next to `path` first, which then
    /// replaces `path`, so a failed save leaves any previous file intact.
    ///
    /// # Errors
    ///
    /// Returns [`LineageError::Io`] if writing fails.
    pub fn save(&mut self, path: impl AsRef<Path>) -> Result<(), LineageError> {
        let path = path.as_ref();
        info!(path:? = path; "Saving document");
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut temp = NamedTempFile::new_in(dir)?;
        temp.write_all(self.to_xml().as_bytes())?;
        temp.flush()?;
        temp.persist(path).map_err(|err| LineageError::Io(err.error))?;
        self.history.mark_clean();
        debug!("Document saved");
        Ok(())
    }

    fn mutator(&mut self) -> GraphMutator<'_> {
        GraphMutator::new(&mut self.store, &mut self.canvas, &self.settings)
    }

    fn record(&mut self, label: &str, operation: Operation) -> usize {
        self.history.push(Command::new(label, operation))
    }

    fn record_some(&mut self, label: &str, operation: Option<Operation>) -> Option<usize> {
        operation.map(|operation| self.record(label, operation))
    }

    /// Adds a person with default details centered on `position`.
    pub fn create_person(&mut self, position: Point) -> Result<Id, DocumentError> {
        let (id, operation) = self.mutator().create_person(position)?;
        self.record("create person", operation);
        Ok(id)
    }

    /// Deletes persons together with their relationships and marriages.
    ///
    /// Ids that were already deleted are skipped. Returns every removed
    /// entity (persons, cascaded relationships and marriages) in removal
    /// order; these are the records the recorded command restores on undo.
    /// Nothing is recorded when the set is empty.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::NotFound`] if a live id is not a person.
    pub fn delete_persons(&mut self, ids: &[Id]) -> Result<Vec<Detached>, DocumentError> {
        for &id in ids {
            match self.store.kind_of(id) {
                Some(ItemKind::Person) | None => {}
                Some(_) => return Err(DocumentError::not_found(ItemKind::Person, id)),
            }
        }
        self.delete_items(ids)
    }

    /// Deletes any mix of persons, relationships and marriages in one command.
    ///
    /// Deleting a marriage dissolves it; deleting a person cascades to its
    /// relationships and marriage.
    pub fn delete_items(&mut self, ids: &[Id]) -> Result<Vec<Detached>, DocumentError> {
        let removed = self.mutator().delete_items(ids)?;
        if !removed.is_empty() {
            let operation = Operation::Delete {
                removed: removed.clone(),
            };
            self.record("delete items", operation);
        }
        Ok(removed)
    }

    /// Adds a parent → child relationship and returns its id.
    ///
    /// # Errors
    ///
    /// - [`DocumentError::NotFound`] if either person is missing.
    /// - [`DocumentError::InvalidState`] for a self-loop or an existing
    ///   relationship between the same parent and child.
    pub fn connect(&mut self, parent: Id, child: Id) -> Result<Id, DocumentError> {
        let (id, operation) = self.mutator().connect(parent, child)?;
        self.record("connect", operation);
        Ok(id)
    }

    /// Marries two persons with default marriage details.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::InvalidState`] if either person is already
    /// married or both ids are the same person.
    pub fn marry(
        &mut self,
        first: Id,
        second: Id,
        mode: MarryMode,
    ) -> Result<MarriageOutcome, DocumentError> {
        self.marry_with(first, second, MarriageDetails::default(), mode)
    }

    /// Marries two persons with the given date and place.
    pub fn marry_with(
        &mut self,
        first: Id,
        second: Id,
        details: MarriageDetails,
        mode: MarryMode,
    ) -> Result<MarriageOutcome, DocumentError> {
        let (outcome, operation) = self.mutator().marry(first, second, details, mode)?;
        self.record("marry", operation);
        Ok(outcome)
    }

    /// Dissolves a marriage.
    pub fn unmarry(&mut self, marriage: Id) -> Result<(), DocumentError> {
        let operation = self.mutator().unmarry(marriage)?;
        self.record("unmarry", operation);
        Ok(())
    }

    /// Moves persons to new centers; spouses follow.
    ///
    /// Returns `None` without recording anything if the move is empty or
    /// changes no position.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::InvalidState`] if `ids` and `targets`
    /// differ in length.
    pub fn move_persons(
        &mut self,
        ids: &[Id],
        targets: &[Point],
    ) -> Result<Option<usize>, DocumentError> {
        self.move_labeled("move items", ids, targets)
    }

    fn move_labeled(
        &mut self,
        label: &str,
        ids: &[Id],
        targets: &[Point],
    ) -> Result<Option<usize>, DocumentError> {
        let operation = self.mutator().move_persons(ids, targets)?;
        Ok(self.record_some(label, operation))
    }

    /// Starts a drag of `ids`, snapshotting them and their spouses.
    pub fn begin_move(&self, ids: &[Id]) -> Result<MoveGesture, DocumentError> {
        let group = self.store.with_spouses(ids)?;
        Ok(MoveGesture {
            before: self.store.placements(&group)?,
        })
    }

    /// Moves one person during a drag without recording a command.
    pub fn drag_person(&mut self, id: Id, position: Point) -> Result<(), DocumentError> {
        self.mutator().drag(id, position)
    }

    /// Ends a drag and records it as one move command.
    ///
    /// Returns `None` if no tracked person ended up somewhere new.
    pub fn finish_move(&mut self, gesture: MoveGesture) -> Result<Option<usize>, DocumentError> {
        let ids: Vec<Id> = gesture.persons().collect();
        let after = self.store.placements(&ids)?;
        if after == gesture.before {
            return Ok(None);
        }
        let operation = Operation::Move {
            before: gesture.before,
            after,
        };
        Ok(Some(self.record("move items", operation)))
    }

    /// Applies a field-level change to a person and returns the prior values
    /// of the fields it set.
    ///
    /// Returns `None` if the patch changes nothing.
    pub fn edit_person_details(
        &mut self,
        id: Id,
        patch: DetailsPatch,
    ) -> Result<Option<DetailsPatch>, DocumentError> {
        self.edit_labeled("edit details", id, patch)
    }

    /// Sets the display name and derives first and last name from it.
    pub fn rename_person(
        &mut self,
        id: Id,
        display_name: &str,
    ) -> Result<Option<DetailsPatch>, DocumentError> {
        self.edit_labeled("rename", id, DetailsPatch::rename(display_name))
    }

    fn edit_labeled(
        &mut self,
        label: &str,
        id: Id,
        patch: DetailsPatch,
    ) -> Result<Option<DetailsPatch>, DocumentError> {
        let Some((prior, operation)) = self.mutator().edit_details(id, patch)? else {
            return Ok(None);
        };
        self.record(label, operation);
        Ok(Some(prior))
    }

    /// Replaces a marriage's date and place.
    pub fn edit_marriage_details(
        &mut self,
        marriage: Id,
        details: MarriageDetails,
    ) -> Result<Option<usize>, DocumentError> {
        let operation = self.mutator().edit_marriage(marriage, details)?;
        Ok(self.record_some("edit marriage", operation))
    }

    /// Sets the fill color of person boxes.
    ///
    /// Records one command holding only the persons whose color changes.
    pub fn set_fill_color(&mut self, ids: &[Id], color: &str) -> Result<Option<usize>, DocumentError> {
        self.restyle("set fill color", ids, StyleProperty::Fill, color)
    }

    pub fn set_text_color(&mut self, ids: &[Id], color: &str) -> Result<Option<usize>, DocumentError> {
        self.restyle("set text color", ids, StyleProperty::Text, color)
    }

    pub fn set_border_color(
        &mut self,
        ids: &[Id],
        color: &str,
    ) -> Result<Option<usize>, DocumentError> {
        self.restyle("set border color", ids, StyleProperty::Border, color)
    }

    /// Sets the arrow color of relationships.
    pub fn set_line_color(&mut self, ids: &[Id], color: &str) -> Result<Option<usize>, DocumentError> {
        self.restyle("set line color", ids, StyleProperty::LineColor, color)
    }

    /// Sets the arrow width of relationships.
    pub fn set_line_width(&mut self, ids: &[Id], width: f32) -> Result<Option<usize>, DocumentError> {
        let operation =
            self.mutator()
                .restyle(ids, StyleProperty::LineWidth, StyleValue::Width(width))?;
        Ok(self.record_some("set line width", operation))
    }

    fn restyle(
        &mut self,
        label: &str,
        ids: &[Id],
        property: StyleProperty,
        color: &str,
    ) -> Result<Option<usize>, DocumentError> {
        let color = Color::new(color).map_err(DocumentError::InvalidState)?;
        let operation = self
            .mutator()
            .restyle(ids, property, StyleValue::Color(color))?;
        Ok(self.record_some(label, operation))
    }

    /// Changes the canvas size.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::InvalidState`] unless both sides are positive.
    pub fn resize_canvas(&mut self, width: f32, height: f32) -> Result<Option<usize>, DocumentError> {
        let operation = self.mutator().resize_canvas(Size::new(width, height))?;
        Ok(self.record_some("resize canvas", operation))
    }

    /// Lines persons up in a row at their mean y.
    pub fn align_horizontally(&mut self, ids: &[Id]) -> Result<Option<usize>, DocumentError> {
        let (ids, targets) = layout::align(&self.store, ids, layout::Axis::Horizontal)?;
        self.move_labeled("align items", &ids, &targets)
    }

    /// Lines persons up in a column at their mean x.
    pub fn align_vertically(&mut self, ids: &[Id]) -> Result<Option<usize>, DocumentError> {
        let (ids, targets) = layout::align(&self.store, ids, layout::Axis::Vertical)?;
        self.move_labeled("align items", &ids, &targets)
    }

    /// Places every person on a grid, one generation per row.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::InvalidState`] if the relationships form a
    /// cycle.
    pub fn auto_layout(&mut self) -> Result<Option<usize>, DocumentError> {
        let (ids, targets) = layout::auto_layout(&self.store, self.canvas, &self.settings.layout)?;
        self.move_labeled("auto layout", &ids, &targets)
    }

    /// Reverts the last applied command and returns its label.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::InvalidState`] if there is nothing to undo;
    /// the document is untouched.
    pub fn undo(&mut self) -> Result<String, DocumentError> {
        let mut mutator = GraphMutator::new(&mut self.store, &mut self.canvas, &self.settings);
        let command = self.history.undo(&mut mutator)?;
        Ok(command.label().to_string())
    }

    /// Re-applies the last undone command and returns its label.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::InvalidState`] if there is nothing to redo;
    /// the document is untouched.
    pub fn redo(&mut self) -> Result<String, DocumentError> {
        let mut mutator = GraphMutator::new(&mut self.store, &mut self.canvas, &self.settings);
        let command = self.history.redo(&mut mutator)?;
        Ok(command.label().to_string())
    }

    pub fn history(&self) -> &CommandStack {
        &self.history
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Returns `true` if the document matches its last saved state.
    pub fn is_clean(&self) -> bool {
        self.history.is_clean()
    }

    pub fn is_dirty(&self) -> bool {
        !self.is_clean()
    }

    /// Records the current state as saved.
    pub fn mark_clean(&mut self) {
        self.history.mark_clean();
    }

    pub fn canvas(&self) -> Size {
        self.canvas
    }

    pub fn store(&self) -> &NodeStore {
        &self.store
    }

    pub fn person_count(&self) -> usize {
        self.store.person_count()
    }

    pub fn relationship_count(&self) -> usize {
        self.store.relationship_count()
    }

    pub fn marriage_count(&self) -> usize {
        self.store.marriage_count()
    }

    /// Persons whose display name contains `text`, in document order.
    ///
    /// The match is case-sensitive.
    pub fn find_by_name_substring(&self, text: &str) -> Vec<Id> {
        self.store
            .persons()
            .filter(|person| person.details().display_name.contains(text))
            .map(Person::id)
            .collect()
    }

    /// Any item by id.
    pub fn item_with_id(&self, id: Id) -> Result<ItemRef<'_>, DocumentError> {
        self.store.get(id)
    }

    pub fn person(&self, id: Id) -> Result<&Person, DocumentError> {
        self.store.person(id)
    }

    pub fn relationship(&self, id: Id) -> Result<&Relationship, DocumentError> {
        self.store.relationship(id)
    }

    pub fn marriage(&self, id: Id) -> Result<&Marriage, DocumentError> {
        self.store.marriage(id)
    }

    pub fn persons(&self) -> impl Iterator<Item = &Person> + '_ {
        self.store.persons()
    }

    pub fn relationships(&self) -> impl Iterator<Item = &Relationship> + '_ {
        self.store.relationships()
    }

    pub fn marriages(&self) -> impl Iterator<Item = &Marriage> + '_ {
        self.store.marriages()
    }

    /// Parents of a person, in relationship order.
    pub fn parents(&self, id: Id) -> Result<Vec<Id>, DocumentError> {
        let person = self.store.person(id)?;
        Ok(person
            .edges()
            .filter_map(|edge| self.store.relationship(edge).ok())
            .filter(|relationship| relationship.to() == id)
            .map(Relationship::from)
            .collect())
    }

    /// Children of a person, in relationship order.
    pub fn children(&self, id: Id) -> Result<Vec<Id>, DocumentError> {
        let person = self.store.person(id)?;
        Ok(person
            .edges()
            .filter_map(|edge| self.store.relationship(edge).ok())
            .filter(|relationship| relationship.from() == id)
            .map(Relationship::to)
            .collect())
    }

    /// The person, their children and their spouse's children, recursively.
    ///
    /// Each person appears once, in the order first reached.
    pub fn descendants(&self, id: Id) -> Result<Vec<Id>, DocumentError> {
        self.store.person(id)?;
        let mut found = IndexSet::new();
        found.insert(id);
        let mut next = 0;
        while let Some(&current) = found.get_index(next) {
            next += 1;
            let person = self.store.person(current)?;
            let mut children = self.children(current)?;
            if let Some(spouse) = person.spouse().filter(|&s| self.store.exists(s)) {
                children.extend(self.children(spouse)?);
            }
            found.extend(children);
        }
        Ok(found.into_iter().collect())
    }

    /// Returns `true` if the two persons may marry each other.
    ///
    /// Both must be unmarried, distinct, and neither may be a parent of the
    /// other.
    pub fn can_marry(&self, first: Id, second: Id) -> Result<bool, DocumentError> {
        let a = self.store.person(first)?;
        let b = self.store.person(second)?;
        if first == second || a.is_married() || b.is_married() {
            return Ok(false);
        }
        let related: HashSet<Id> = self
            .parents(first)?
            .into_iter()
            .chain(self.children(first)?)
            .collect();
        Ok(!related.contains(&second))
    }
}

#[cfg(test)]
mod tests {
    use float_cmp::assert_approx_eq;
    use lineage_core::text::FixedAdvanceMeasure;

    use super::*;
    use crate::config::{CanvasConfig, GeometryConfig, LayoutConfig, StyleConfig};

    fn document() -> Document {
        Document::with_measure(
            AppConfig::default(),
            Arc::new(FixedAdvanceMeasure::new(6.0, 14.0)),
        )
        .unwrap()
    }

    #[test]
    fn test_new_document_is_clean() {
        let doc = document();
        assert!(doc.is_clean());
        assert!(!doc.can_undo());
        assert_eq!(doc.canvas(), Size::new(5000.0, 5000.0));
    }

    #[test]
    fn test_invalid_config_color_is_rejected() {
        let config = AppConfig::new(
            GeometryConfig::default(),
            StyleConfig::default().with_fill_color("not-a-color"),
            CanvasConfig::default(),
            LayoutConfig::default(),
        );
        assert!(matches!(
            Document::with_measure(config, Arc::new(FixedAdvanceMeasure::new(6.0, 14.0))),
            Err(LineageError::Config(_))
        ));
    }

    #[test]
    fn test_delete_persons_rejects_relationship_ids() {
        let mut doc = document();
        let a = doc.create_person(Point::new(0.0, 0.0)).unwrap();
        let b = doc.create_person(Point::new(0.0, 300.0)).unwrap();
        let edge = doc.connect(a, b).unwrap();

        assert!(matches!(
            doc.delete_persons(&[edge]),
            Err(DocumentError::NotFound { .. })
        ));
        assert_eq!(doc.relationship_count(), 1);
    }

    #[test]
    fn test_undo_and_redo_at_the_ends() {
        let mut doc = document();
        assert!(matches!(doc.undo(), Err(DocumentError::InvalidState(_))));
        doc.create_person(Point::new(0.0, 0.0)).unwrap();
        assert!(matches!(doc.redo(), Err(DocumentError::InvalidState(_))));
        assert_eq!(doc.undo().unwrap(), "create person");
        assert_eq!(doc.person_count(), 0);
        assert!(doc.is_clean());
        assert_eq!(doc.redo().unwrap(), "create person");
        assert_eq!(doc.person_count(), 1);
    }

    #[test]
    fn test_rename_resizes_box() {
        let mut doc = document();
        let id = doc.create_person(Point::new(0.0, 0.0)).unwrap();
        let long_name = "Augusta Ada King Countess of Lovelace Byron";
        doc.rename_person(id, long_name).unwrap();

        let person = doc.person(id).unwrap();
        assert_approx_eq!(
            f32,
            person.size().width(),
            long_name.chars().count() as f32 * 6.0 + 32.0
        );
        assert_eq!(person.details().first_name, "Augusta");

        doc.undo().unwrap();
        assert_approx_eq!(f32, doc.person(id).unwrap().size().width(), 200.0);
    }

    #[test]
    fn test_edit_returns_prior_values() {
        let mut doc = document();
        let id = doc.create_person(Point::new(0.0, 0.0)).unwrap();
        let prior = doc
            .edit_person_details(id, DetailsPatch::default().with_bio("Mathematician"))
            .unwrap()
            .unwrap();
        assert_eq!(prior.bio.as_deref(), Some(""));

        let unchanged = doc
            .edit_person_details(id, DetailsPatch::default().with_bio("Mathematician"))
            .unwrap();
        assert!(unchanged.is_none());
        assert_eq!(doc.history().len(), 2);
    }

    #[test]
    fn test_drag_gesture_records_one_move() {
        let mut doc = document();
        let id = doc.create_person(Point::new(0.0, 0.0)).unwrap();
        let gesture = doc.begin_move(&[id]).unwrap();
        doc.drag_person(id, Point::new(10.0, 0.0)).unwrap();
        doc.drag_person(id, Point::new(40.0, 5.0)).unwrap();

        let index = doc.finish_move(gesture).unwrap();
        assert_eq!(index, Some(1));
        doc.undo().unwrap();
        assert_eq!(doc.person(id).unwrap().position(), Point::new(0.0, 0.0));
    }

    #[test]
    fn test_gesture_without_change_records_nothing() {
        let mut doc = document();
        let id = doc.create_person(Point::new(0.0, 0.0)).unwrap();
        let gesture = doc.begin_move(&[id]).unwrap();
        doc.drag_person(id, Point::new(10.0, 0.0)).unwrap();
        doc.drag_person(id, Point::new(0.0, 0.0)).unwrap();

        assert_eq!(doc.finish_move(gesture).unwrap(), None);
        assert_eq!(doc.history().len(), 1);
    }

    #[test]
    fn test_find_by_name_is_case_sensitive() {
        let mut doc = document();
        let a = doc.create_person(Point::new(0.0, 0.0)).unwrap();
        let b = doc.create_person(Point::new(300.0, 0.0)).unwrap();
        doc.rename_person(a, "Ada Lovelace").unwrap();
        doc.rename_person(b, "Charles Babbage").unwrap();

        assert_eq!(doc.find_by_name_substring("Lovelace"), vec![a]);
        assert!(doc.find_by_name_substring("lovelace").is_empty());
        assert_eq!(doc.find_by_name_substring("a").len(), 2);
    }

    #[test]
    fn test_descendants_include_spouse_children() {
        let mut doc = document();
        let father = doc.create_person(Point::new(0.0, 0.0)).unwrap();
        let mother = doc.create_person(Point::new(400.0, 0.0)).unwrap();
        let child = doc.create_person(Point::new(0.0, 300.0)).unwrap();
        let grandchild = doc.create_person(Point::new(0.0, 600.0)).unwrap();
        doc.marry(father, mother, MarryMode::Interactive).unwrap();
        doc.connect(mother, child).unwrap();
        doc.connect(child, grandchild).unwrap();

        assert_eq!(
            doc.descendants(father).unwrap(),
            vec![father, child, grandchild]
        );
        assert_eq!(doc.parents(child).unwrap(), vec![mother]);
    }

    #[test]
    fn test_can_marry() {
        let mut doc = document();
        let parent = doc.create_person(Point::new(0.0, 0.0)).unwrap();
        let child = doc.create_person(Point::new(0.0, 300.0)).unwrap();
        let other = doc.create_person(Point::new(400.0, 0.0)).unwrap();
        doc.connect(parent, child).unwrap();

        assert!(!doc.can_marry(parent, child).unwrap());
        assert!(!doc.can_marry(child, parent).unwrap());
        assert!(!doc.can_marry(parent, parent).unwrap());
        assert!(doc.can_marry(parent, other).unwrap());

        doc.marry(parent, other, MarryMode::Interactive).unwrap();
        assert!(!doc.can_marry(child, other).unwrap());
    }

    #[test]
    fn test_set_fill_color_rejects_bad_color() {
        let mut doc = document();
        let id = doc.create_person(Point::new(0.0, 0.0)).unwrap();
        assert!(matches!(
            doc.set_fill_color(&[id], "nope"),
            Err(DocumentError::InvalidState(_))
        ));
        assert_eq!(doc.set_fill_color(&[id], "white").unwrap(), None);
        assert_eq!(doc.set_fill_color(&[id], "#336699").unwrap(), Some(1));
    }
}
