//! Entities of a genealogy document.
//!
//! A document holds three kinds of items, modeled as the closed union
//! [`Entity`]:
//!
//! - [`Person`] - a box on the canvas with biographical details
//! - [`Relationship`] - a directed parent → child arrow between two persons
//! - [`Marriage`] - the anchor joining two spouses
//!
//! Entities reference each other only by [`Id`]. Link fields (a person's
//! incident edges, spouse and marriage) and derived geometry (box size,
//! arrow route, anchor position) are maintained by the document; they are
//! read-only from outside the crate.

use std::{collections::BTreeSet, fmt};

use serde::Serialize;

use lineage_core::{
    color::Color,
    date::EventDate,
    geometry::{Bounds, Point, Size},
    identifier::Id,
};

/// The kind of a document item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ItemKind {
    Person,
    Relationship,
    Marriage,
}

impl ItemKind {
    /// Prefix of generated ids for this kind.
    pub(crate) fn id_prefix(self) -> &'static str {
        match self {
            ItemKind::Person => "p",
            ItemKind::Relationship => "r",
            ItemKind::Marriage => "m",
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemKind::Person => write!(f, "person"),
            ItemKind::Relationship => write!(f, "relationship"),
            ItemKind::Marriage => write!(f, "marriage"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub enum Gender {
    #[default]
    Unknown,
    Male,
    Female,
}

impl Gender {
    /// Reads the file form: `M`/`F`, or the words `male`/`female` in any case.
    pub fn from_file(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "m" | "male" => Some(Gender::Male),
            "f" | "female" => Some(Gender::Female),
            "" | "u" | "unknown" => Some(Gender::Unknown),
            _ => None,
        }
    }

    /// The file form, or `None` when the attribute is omitted.
    pub fn file_code(self) -> Option<&'static str> {
        match self {
            Gender::Unknown => None,
            Gender::Male => Some("M"),
            Gender::Female => Some("F"),
        }
    }
}

/// Biographical fields of a person.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PersonDetails {
    pub display_name: String,
    pub first_name: String,
    pub last_name: String,
    pub bio: String,
    pub date_of_birth: EventDate,
    pub place_of_birth: String,
    pub country_of_birth: String,
    pub date_of_death: EventDate,
    pub place_of_death: String,
    pub gender: Gender,
    /// Opaque photo references, in display order.
    pub photos: Vec<String>,
}

impl Default for PersonDetails {
    fn default() -> Self {
        Self {
            display_name: "New Person".to_string(),
            first_name: "New".to_string(),
            last_name: "Person".to_string(),
            bio: String::new(),
            date_of_birth: EventDate::Unknown,
            place_of_birth: String::new(),
            country_of_birth: String::new(),
            date_of_death: EventDate::Unknown,
            place_of_death: String::new(),
            gender: Gender::Unknown,
            photos: Vec::new(),
        }
    }
}

/// A field-level change to [`PersonDetails`].
///
/// Fields left as `None` are not touched. Applying a patch returns another
/// patch holding the replaced values of exactly the fields it set, which
/// reverts it.
///
/// # Examples
///
/// ```
/// # use lineage::model::{DetailsPatch, PersonDetails};
/// let mut details = PersonDetails::default();
/// let patch = DetailsPatch::default().with_bio("Engineer");
///
/// let prior = patch.apply_to(&mut details);
/// assert_eq!(details.bio, "Engineer");
///
/// prior.apply_to(&mut details);
/// assert_eq!(details, PersonDetails::default());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DetailsPatch {
    pub display_name: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub bio: Option<String>,
    pub date_of_birth: Option<EventDate>,
    pub place_of_birth: Option<String>,
    pub country_of_birth: Option<String>,
    pub date_of_death: Option<EventDate>,
    pub place_of_death: Option<String>,
    pub gender: Option<Gender>,
    pub photos: Option<Vec<String>>,
}

impl DetailsPatch {
    /// Patch for a rename from a single display string.
    ///
    /// The text is split at its first space into first and last name. Text
    /// without a space only sets the first name.
    pub fn rename(display_name: &str) -> Self {
        let mut patch = Self::default().with_display_name(display_name);
        match display_name.split_once(' ') {
            Some((first, last)) => {
                patch.first_name = Some(first.to_string());
                patch.last_name = Some(last.to_string());
            }
            None => patch.first_name = Some(display_name.to_string()),
        }
        patch
    }

    pub fn with_display_name(mut self, value: impl Into<String>) -> Self {
        self.display_name = Some(value.into());
        self
    }

    pub fn with_first_name(mut self, value: impl Into<String>) -> Self {
        self.first_name = Some(value.into());
        self
    }

    pub fn with_last_name(mut self, value: impl Into<String>) -> Self {
        self.last_name = Some(value.into());
        self
    }

    pub fn with_bio(mut self, value: impl Into<String>) -> Self {
        self.bio = Some(value.into());
        self
    }

    pub fn with_date_of_birth(mut self, value: impl Into<EventDate>) -> Self {
        self.date_of_birth = Some(value.into());
        self
    }

    pub fn with_place_of_birth(mut self, value: impl Into<String>) -> Self {
        self.place_of_birth = Some(value.into());
        self
    }

    pub fn with_country_of_birth(mut self, value: impl Into<String>) -> Self {
        self.country_of_birth = Some(value.into());
        self
    }

    pub fn with_date_of_death(mut self, value: impl Into<EventDate>) -> Self {
        self.date_of_death = Some(value.into());
        self
    }

    pub fn with_place_of_death(mut self, value: impl Into<String>) -> Self {
        self.place_of_death = Some(value.into());
        self
    }

    pub fn with_gender(mut self, value: Gender) -> Self {
        self.gender = Some(value);
        self
    }

    pub fn with_photos(mut self, value: Vec<String>) -> Self {
        self.photos = Some(value);
        self
    }

    /// Returns `true` if the patch sets no field.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Returns `true` if the patch changes the label drawn in the box.
    pub fn touches_label(&self) -> bool {
        self.display_name.is_some()
    }

    /// Writes the set fields into `details` and returns their prior values.
    pub fn apply_to(&self, details: &mut PersonDetails) -> DetailsPatch {
        fn swap<T: Clone>(slot: &mut T, value: &Option<T>) -> Option<T> {
            value
                .as_ref()
                .map(|value| std::mem::replace(slot, value.clone()))
        }

        DetailsPatch {
            display_name: swap(&mut details.display_name, &self.display_name),
            first_name: swap(&mut details.first_name, &self.first_name),
            last_name: swap(&mut details.last_name, &self.last_name),
            bio: swap(&mut details.bio, &self.bio),
            date_of_birth: swap(&mut details.date_of_birth, &self.date_of_birth),
            place_of_birth: swap(&mut details.place_of_birth, &self.place_of_birth),
            country_of_birth: swap(&mut details.country_of_birth, &self.country_of_birth),
            date_of_death: swap(&mut details.date_of_death, &self.date_of_death),
            place_of_death: swap(&mut details.place_of_death, &self.place_of_death),
            gender: swap(&mut details.gender, &self.gender),
            photos: swap(&mut details.photos, &self.photos),
        }
    }
}

/// Colors of a person box.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PersonStyle {
    pub fill: Color,
    pub text: Color,
    pub border: Color,
}

/// A person node.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Person {
    id: Id,
    details: PersonDetails,
    style: PersonStyle,
    /// Center of the box.
    position: Point,
    size: Size,
    label_size: Size,
    /// Relationships where this person is parent or child.
    edges: BTreeSet<Id>,
    spouse: Option<Id>,
    marriage: Option<Id>,
}

impl Person {
    pub(crate) fn new(
        id: Id,
        details: PersonDetails,
        style: PersonStyle,
        position: Point,
        size: Size,
    ) -> Self {
        Self {
            id,
            details,
            style,
            position,
            size,
            label_size: Size::default(),
            edges: BTreeSet::new(),
            spouse: None,
            marriage: None,
        }
    }

    pub fn id(&self) -> Id {
        self.id
    }

    pub fn details(&self) -> &PersonDetails {
        &self.details
    }

    pub fn style(&self) -> &PersonStyle {
        &self.style
    }

    pub fn position(&self) -> Point {
        self.position
    }

    pub fn size(&self) -> Size {
        self.size
    }

    /// Box bounds on the canvas.
    pub fn bounds(&self) -> Bounds {
        self.position.to_bounds(self.size)
    }

    /// Label bounds, centered in the box.
    pub fn label_bounds(&self) -> Bounds {
        self.position.to_bounds(self.label_size)
    }

    pub fn edges(&self) -> impl Iterator<Item = Id> + '_ {
        self.edges.iter().copied()
    }

    pub fn spouse(&self) -> Option<Id> {
        self.spouse
    }

    pub fn marriage(&self) -> Option<Id> {
        self.marriage
    }

    pub fn is_married(&self) -> bool {
        self.spouse.is_some()
    }

    pub(crate) fn details_mut(&mut self) -> &mut PersonDetails {
        &mut self.details
    }

    pub(crate) fn style_mut(&mut self) -> &mut PersonStyle {
        &mut self.style
    }

    pub(crate) fn set_position(&mut self, position: Point) {
        self.position = position;
    }

    pub(crate) fn set_size(&mut self, size: Size, label_size: Size) {
        self.size = size;
        self.label_size = label_size;
    }

    pub(crate) fn attach_edge(&mut self, edge: Id) {
        self.edges.insert(edge);
    }

    pub(crate) fn detach_edge(&mut self, edge: Id) {
        self.edges.remove(&edge);
    }

    pub(crate) fn set_spouse(&mut self, spouse: Option<Id>, marriage: Option<Id>) {
        self.spouse = spouse;
        self.marriage = marriage;
    }

    pub(crate) fn set_id(&mut self, id: Id) {
        self.id = id;
    }
}

/// Rendered path of a relationship arrow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub enum EdgeRoute {
    /// The two boxes overlap, so no arrow is drawn.
    #[default]
    Hidden,
    /// A shaft from `start` to `end` and a triangular head whose first
    /// point is the tip on the child's border.
    Visible {
        start: Point,
        end: Point,
        head: [Point; 3],
    },
}

/// A directed parent → child relationship.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Relationship {
    id: Id,
    from: Id,
    to: Id,
    color: Color,
    width: f32,
    route: EdgeRoute,
}

impl Relationship {
    pub(crate) fn new(id: Id, from: Id, to: Id, color: Color, width: f32) -> Self {
        Self {
            id,
            from,
            to,
            color,
            width,
            route: EdgeRoute::Hidden,
        }
    }

    pub fn id(&self) -> Id {
        self.id
    }

    /// The parent.
    pub fn from(&self) -> Id {
        self.from
    }

    /// The child.
    pub fn to(&self) -> Id {
        self.to
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn route(&self) -> EdgeRoute {
        self.route
    }

    /// Returns `true` if `person` is either endpoint.
    pub fn touches(&self, person: Id) -> bool {
        self.from == person || self.to == person
    }

    pub(crate) fn set_color(&mut self, color: Color) {
        self.color = color;
    }

    pub(crate) fn set_width(&mut self, width: f32) {
        self.width = width;
    }

    pub(crate) fn set_route(&mut self, route: EdgeRoute) {
        self.route = route;
    }

    pub(crate) fn set_id(&mut self, id: Id) {
        self.id = id;
    }
}

/// Date and place of a marriage.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MarriageDetails {
    pub date: EventDate,
    pub place: String,
}

/// The anchor joining two spouses.
///
/// `left` is the spouse drawn on the left; the right spouse always sits
/// directly against the left spouse's right border.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marriage {
    id: Id,
    left: Id,
    right: Id,
    details: MarriageDetails,
    /// Center of the anchor marker.
    anchor: Point,
}

impl Marriage {
    pub(crate) fn new(id: Id, left: Id, right: Id, details: MarriageDetails) -> Self {
        Self {
            id,
            left,
            right,
            details,
            anchor: Point::default(),
        }
    }

    pub fn id(&self) -> Id {
        self.id
    }

    pub fn left(&self) -> Id {
        self.left
    }

    pub fn right(&self) -> Id {
        self.right
    }

    pub fn details(&self) -> &MarriageDetails {
        &self.details
    }

    pub fn anchor(&self) -> Point {
        self.anchor
    }

    /// The other spouse, if `person` belongs to this marriage.
    pub fn partner_of(&self, person: Id) -> Option<Id> {
        if person == self.left {
            Some(self.right)
        } else if person == self.right {
            Some(self.left)
        } else {
            None
        }
    }

    pub(crate) fn details_mut(&mut self) -> &mut MarriageDetails {
        &mut self.details
    }

    pub(crate) fn set_anchor(&mut self, anchor: Point) {
        self.anchor = anchor;
    }

    pub(crate) fn set_id(&mut self, id: Id) {
        self.id = id;
    }
}

/// Any document item, owned.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Entity {
    Person(Person),
    Relationship(Relationship),
    Marriage(Marriage),
}

impl Entity {
    pub fn id(&self) -> Id {
        match self {
            Entity::Person(person) => person.id(),
            Entity::Relationship(relationship) => relationship.id(),
            Entity::Marriage(marriage) => marriage.id(),
        }
    }

    pub fn kind(&self) -> ItemKind {
        match self {
            Entity::Person(_) => ItemKind::Person,
            Entity::Relationship(_) => ItemKind::Relationship,
            Entity::Marriage(_) => ItemKind::Marriage,
        }
    }

    pub(crate) fn set_id(&mut self, id: Id) {
        match self {
            Entity::Person(person) => person.set_id(id),
            Entity::Relationship(relationship) => relationship.set_id(id),
            Entity::Marriage(marriage) => marriage.set_id(id),
        }
    }
}

/// Any document item, borrowed from the store.
#[derive(Debug, Clone, Copy)]
pub enum ItemRef<'a> {
    Person(&'a Person),
    Relationship(&'a Relationship),
    Marriage(&'a Marriage),
}

impl ItemRef<'_> {
    pub fn id(&self) -> Id {
        match self {
            ItemRef::Person(person) => person.id(),
            ItemRef::Relationship(relationship) => relationship.id(),
            ItemRef::Marriage(marriage) => marriage.id(),
        }
    }

    pub fn kind(&self) -> ItemKind {
        match self {
            ItemRef::Person(_) => ItemKind::Person,
            ItemRef::Relationship(_) => ItemKind::Relationship,
            ItemRef::Marriage(_) => ItemKind::Marriage,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    #[test]
    fn test_default_details() {
        let details = PersonDetails::default();
        assert_eq!(details.display_name, "New Person");
        assert_eq!(details.first_name, "New");
        assert_eq!(details.last_name, "Person");
        assert_eq!(details.date_of_birth, EventDate::Unknown);
        assert_eq!(details.gender, Gender::Unknown);
        assert!(details.photos.is_empty());
    }

    #[test]
    fn test_patch_returns_only_prior_values_it_set() {
        let mut details = PersonDetails::default();
        let born = NaiveDate::from_ymd_opt(1815, 12, 10).unwrap();
        let patch = DetailsPatch::default()
            .with_place_of_birth("London")
            .with_date_of_birth(born);

        let prior = patch.apply_to(&mut details);

        assert_eq!(details.place_of_birth, "London");
        assert_eq!(details.date_of_birth, EventDate::Known(born));
        assert_eq!(prior.place_of_birth.as_deref(), Some(""));
        assert_eq!(prior.date_of_birth, Some(EventDate::Unknown));
        assert!(prior.bio.is_none());
        assert!(prior.display_name.is_none());
    }

    #[test]
    fn test_rename_splits_at_first_space() {
        let patch = DetailsPatch::rename("Ada King Lovelace");
        assert_eq!(patch.display_name.as_deref(), Some("Ada King Lovelace"));
        assert_eq!(patch.first_name.as_deref(), Some("Ada"));
        assert_eq!(patch.last_name.as_deref(), Some("King Lovelace"));
        assert!(patch.touches_label());
    }

    #[test]
    fn test_rename_without_space_keeps_last_name() {
        let patch = DetailsPatch::rename("Cher");
        assert_eq!(patch.first_name.as_deref(), Some("Cher"));
        assert!(patch.last_name.is_none());
    }

    #[test]
    fn test_empty_patch() {
        assert!(DetailsPatch::default().is_empty());
        assert!(!DetailsPatch::default().with_bio("").is_empty());
    }

    #[test]
    fn test_gender_file_forms() {
        assert_eq!(Gender::from_file("M"), Some(Gender::Male));
        assert_eq!(Gender::from_file("female"), Some(Gender::Female));
        assert_eq!(Gender::from_file(""), Some(Gender::Unknown));
        assert_eq!(Gender::from_file("x"), None);
        assert_eq!(Gender::Female.file_code(), Some("F"));
        assert_eq!(Gender::Unknown.file_code(), None);
    }

    #[test]
    fn test_partner_of() {
        let marriage = Marriage::new(
            Id::new("m1"),
            Id::new("p1"),
            Id::new("p2"),
            MarriageDetails::default(),
        );
        assert_eq!(marriage.partner_of(Id::new("p1")), Some(Id::new("p2")));
        assert_eq!(marriage.partner_of(Id::new("p2")), Some(Id::new("p1")));
        assert_eq!(marriage.partner_of(Id::new("p3")), None);
    }
}
