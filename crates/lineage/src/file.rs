//! Reading and writing genealogy files.
//!
//! The file is XML with a `genealogy` root:
//!
//! ```xml
//! <genealogy width="5000" height="5000">
//!   <item id="p1" x="228" y="89" name="Ada Lovelace" ...>
//!     <photo path="portraits/ada.png"/>
//!   </item>
//!   <relationship from="p1" to="p2" color="#000000" width="2"/>
//!   <marriage person_left="p1" person_right="p3" date="1835-07-08" place="" x="328" y="89"/>
//! </genealogy>
//! ```
//!
//! Relationships and marriages name persons that may appear anywhere in the
//! file, so reading takes three passes over the root's children: persons
//! first, then relationships, then marriages. Marriages are replayed with
//! their stored left/right order, and the right spouse is placed beside the
//! left one. Explicit person ids are reserved before the first pass so that
//! persons without one never get an id claimed later in the file.
//!
//! Files converted from GEDCOM identify persons by a `pointer` attribute and
//! reference them through `from_pointer`/`to_pointer` and
//! `left_pointer`/`right_pointer`.

use std::{collections::HashMap, fmt::Write as _};

use log::{debug, warn};
use roxmltree::Node;

use lineage_core::{
    color::Color,
    date::{EventDate, Sentinel},
    geometry::{Point, Size},
    identifier::Id,
};

use crate::{
    diagnostic::{Diagnostic, DiagnosticCode, DiagnosticCollector, Span},
    error::LoadError,
    model::{Gender, MarriageDetails, PersonDetails, PersonStyle},
    mutator::{GraphMutator, MarryMode},
    store::NodeStore,
};

const ROOT: &str = "genealogy";
const PERSON: &str = "item";
const RELATIONSHIP: &str = "relationship";
const MARRIAGE: &str = "marriage";
const PHOTO: &str = "photo";

/// Reads `source` into the empty document behind `mutator`.
///
/// # Errors
///
/// Returns [`LoadError`] if the text is not XML or the root element is not
/// `genealogy`. Problems with individual elements are returned as
/// diagnostics instead.
pub(crate) fn read(
    mutator: &mut GraphMutator<'_>,
    source: &str,
) -> Result<Vec<Diagnostic>, LoadError> {
    let xml = roxmltree::Document::parse(source)?;
    let root = xml.root_element();
    if root.tag_name().name() != ROOT {
        return Err(LoadError::UnexpectedRoot(root.tag_name().name().to_string()));
    }

    let mut reader = Reader {
        mutator,
        diagnostics: DiagnosticCollector::new(),
        pointers: HashMap::new(),
    };
    reader.read_canvas(root);

    let elements: Vec<Node<'_, '_>> = root.children().filter(Node::is_element).collect();
    // Explicit ids are claimed first so a generated id for an earlier
    // pointer-only person cannot take one of them.
    for element in elements.iter().filter(|e| e.has_tag_name(PERSON)) {
        if let Some(id) = element.attribute("id").filter(|id| !id.is_empty()) {
            reader.mutator.store_mut().reserve_id(Id::new(id));
        }
    }
    for element in &elements {
        match element.tag_name().name() {
            PERSON => reader.read_person(*element),
            RELATIONSHIP | MARRIAGE => {}
            other => reader.diagnostics.emit(
                Diagnostic::warning(format!("ignoring unexpected element `{other}`"))
                    .with_code(DiagnosticCode::E104)
                    .with_label(span_of(*element), "ignored"),
            ),
        }
    }
    for element in elements.iter().filter(|e| e.has_tag_name(RELATIONSHIP)) {
        reader.read_relationship(*element);
    }
    for element in elements.iter().filter(|e| e.has_tag_name(MARRIAGE)) {
        reader.read_marriage(*element);
    }

    Ok(reader.diagnostics.finish())
}

struct Reader<'m, 'a> {
    mutator: &'m mut GraphMutator<'a>,
    diagnostics: DiagnosticCollector,
    /// GEDCOM pointer → person id.
    pointers: HashMap<String, Id>,
}

impl Reader<'_, '_> {
    fn read_canvas(&mut self, root: Node<'_, '_>) {
        let width = self.number(root, "width");
        let height = self.number(root, "height");
        match (width, height) {
            (Some(width), Some(height)) if width > 0.0 && height > 0.0 => {
                self.mutator.set_canvas(Size::new(width, height));
            }
            _ => {}
        }
    }

    fn read_person(&mut self, element: Node<'_, '_>) {
        let palette = self.mutator.settings().palette.clone();
        let text = |name: &str| element.attribute(name).unwrap_or_default().to_string();

        let name = text("name");
        let mut details = PersonDetails {
            display_name: name.clone(),
            first_name: text("first_name"),
            last_name: text("last_name"),
            bio: text("bio"),
            place_of_birth: text("place_of_birth"),
            country_of_birth: text("country_of_birth"),
            place_of_death: text("place_of_death"),
            ..PersonDetails::default()
        };
        if element.attribute("first_name").is_none() && element.attribute("last_name").is_none() {
            let (first, last) = name.split_once(' ').unwrap_or((name.as_str(), ""));
            details.first_name = first.to_string();
            details.last_name = last.to_string();
        }
        details.date_of_birth = self.date(element, "date_of_birth", Sentinel::Birth);
        details.date_of_death = self.date(element, "date_of_death", Sentinel::Death);
        details.gender = self.gender(element);
        details.photos = element
            .children()
            .filter(|child| child.has_tag_name(PHOTO))
            .filter_map(|photo| photo.attribute("path"))
            .map(str::to_string)
            .collect();

        let style = PersonStyle {
            fill: self.color(element, "fill_color", palette.fill),
            text: self.color(element, "text_color", palette.text),
            border: self.color(element, "border_color", palette.border),
        };
        let position = Point::new(
            self.number(element, "x").unwrap_or_default(),
            self.number(element, "y").unwrap_or_default(),
        );

        let id = element.attribute("id").filter(|id| !id.is_empty()).map(Id::new);
        match self.mutator.insert_person(id, details, style, position) {
            Ok(id) => {
                if let Some(pointer) = element.attribute("pointer") {
                    self.pointers.insert(pointer.to_string(), id);
                }
            }
            Err(err) => self.drop_element(
                element,
                Diagnostic::error(format!("duplicate person id: {err}"))
                    .with_code(DiagnosticCode::E300)
                    .with_help("every person needs a unique id"),
            ),
        }
    }

    fn read_relationship(&mut self, element: Node<'_, '_>) {
        let Some((from, to)) = self.endpoints(element, ("from", "to"), ("from_pointer", "to_pointer"))
        else {
            return;
        };

        let palette = self.mutator.settings().palette.clone();
        let color = self.color(element, "color", palette.line);
        let width = self
            .number(element, "width")
            .filter(|width| *width > 0.0)
            .unwrap_or(palette.line_width);

        match self.mutator.connect(from, to) {
            Ok((id, _)) => {
                if let Ok(relationship) = self.mutator.store_mut().relationship_mut(id) {
                    relationship.set_color(color);
                    relationship.set_width(width);
                }
            }
            Err(err) => self.drop_element(
                element,
                Diagnostic::error(format!("invalid relationship: {err}"))
                    .with_code(DiagnosticCode::E301),
            ),
        }
    }

    fn read_marriage(&mut self, element: Node<'_, '_>) {
        let Some((left, right)) = self.endpoints(
            element,
            ("person_left", "person_right"),
            ("left_pointer", "right_pointer"),
        ) else {
            return;
        };

        let details = MarriageDetails {
            date: self.date(element, "date", Sentinel::Marriage),
            place: element.attribute("place").unwrap_or_default().to_string(),
        };
        if let Err(err) = self.mutator.marry(left, right, details, MarryMode::Replay) {
            self.drop_element(
                element,
                Diagnostic::error(format!("conflicting marriage: {err}"))
                    .with_code(DiagnosticCode::E302)
                    .with_help("a person can only be married once"),
            );
        }
    }

    /// Resolves the two person references of a relationship or marriage.
    fn endpoints(
        &mut self,
        element: Node<'_, '_>,
        by_id: (&str, &str),
        by_pointer: (&str, &str),
    ) -> Option<(Id, Id)> {
        let refs = match (
            element.attribute(by_id.0),
            element.attribute(by_id.1),
            element.attribute(by_pointer.0),
            element.attribute(by_pointer.1),
        ) {
            (Some(a), Some(b), _, _) => (self.resolve_id(a), self.resolve_id(b)),
            (_, _, Some(a), Some(b)) => (
                self.pointers.get(a).copied().ok_or(a),
                self.pointers.get(b).copied().ok_or(b),
            ),
            _ => {
                self.drop_element(
                    element,
                    Diagnostic::error(format!(
                        "`{}` needs `{}` and `{}` attributes",
                        element.tag_name().name(),
                        by_id.0,
                        by_id.1
                    ))
                    .with_code(DiagnosticCode::E201),
                );
                return None;
            }
        };

        match refs {
            (Ok(a), Ok(b)) => Some((a, b)),
            (Err(missing), _) | (_, Err(missing)) => {
                self.drop_element(
                    element,
                    Diagnostic::error(format!(
                        "{} references unknown person `{missing}`",
                        element.tag_name().name()
                    ))
                    .with_code(DiagnosticCode::E200)
                    .with_help("relationships and marriages must name persons defined in the file"),
                );
                None
            }
        }
    }

    fn resolve_id<'s>(&self, value: &'s str) -> Result<Id, &'s str> {
        let id = Id::new(value);
        match self.mutator.store().person(id) {
            Ok(_) => Ok(id),
            Err(_) => Err(value),
        }
    }

    fn drop_element(&mut self, element: Node<'_, '_>, diagnostic: Diagnostic) {
        warn!(element = element.tag_name().name(), reason = diagnostic.message(); "Dropping element");
        self.diagnostics
            .emit(diagnostic.with_label(span_of(element), "dropped"));
    }

    fn number(&mut self, element: Node<'_, '_>, name: &str) -> Option<f32> {
        let value = element.attribute(name)?;
        match value.trim().parse::<f32>() {
            Ok(number) if number.is_finite() => Some(number),
            _ => {
                self.warn(
                    element,
                    DiagnosticCode::E100,
                    format!("`{name}` is not a number: `{value}`"),
                );
                None
            }
        }
    }

    fn date(&mut self, element: Node<'_, '_>, name: &str, sentinel: Sentinel) -> EventDate {
        let Some(value) = element.attribute(name).filter(|v| !v.trim().is_empty()) else {
            return EventDate::Unknown;
        };
        EventDate::parse(value, sentinel).unwrap_or_else(|err| {
            self.warn(
                element,
                DiagnosticCode::E101,
                format!("`{name}` is not a date: `{}`", err.0),
            );
            EventDate::Unknown
        })
    }

    fn color(&mut self, element: Node<'_, '_>, name: &str, fallback: Color) -> Color {
        let Some(value) = element.attribute(name).filter(|v| !v.is_empty()) else {
            return fallback;
        };
        Color::new(value).unwrap_or_else(|err| {
            self.warn(element, DiagnosticCode::E102, format!("`{name}`: {err}"));
            fallback
        })
    }

    fn gender(&mut self, element: Node<'_, '_>) -> Gender {
        let value = element.attribute("gender").unwrap_or_default();
        Gender::from_file(value).unwrap_or_else(|| {
            self.warn(
                element,
                DiagnosticCode::E103,
                format!("unknown gender `{value}`"),
            );
            Gender::Unknown
        })
    }

    fn warn(&mut self, element: Node<'_, '_>, code: DiagnosticCode, message: String) {
        self.diagnostics.emit(
            Diagnostic::warning(message)
                .with_code(code)
                .with_label(span_of(element), "value replaced by its default"),
        );
    }
}

fn span_of(node: Node<'_, '_>) -> Span {
    Span::new(node.range())
}

/// Writes the document as XML text.
///
/// Items are written in document order, persons first, so the output is
/// deterministic for a given document.
pub(crate) fn write(store: &NodeStore, canvas: Size) -> String {
    let mut out = String::new();
    // Writing to a String cannot fail.
    let _ = write_document(&mut out, store, canvas);
    debug!(bytes = out.len(); "Document serialized");
    out
}

fn write_document(out: &mut String, store: &NodeStore, canvas: Size) -> std::fmt::Result {
    writeln!(out, r#"<?xml version="1.0" encoding="UTF-8"?>"#)?;
    writeln!(
        out,
        r#"<{ROOT} width="{}" height="{}">"#,
        canvas.width(),
        canvas.height()
    )?;

    for person in store.persons() {
        let details = person.details();
        let style = person.style();
        write!(
            out,
            r#"  <{PERSON} id="{}" x="{}" y="{}""#,
            escape_xml(&person.id().as_string()),
            person.position().x(),
            person.position().y()
        )?;
        let attributes = [
            ("name", details.display_name.clone()),
            ("first_name", details.first_name.clone()),
            ("last_name", details.last_name.clone()),
            ("bio", details.bio.clone()),
            ("date_of_birth", details.date_of_birth.to_file_string(Sentinel::Birth)),
            ("place_of_birth", details.place_of_birth.clone()),
            ("country_of_birth", details.country_of_birth.clone()),
            ("date_of_death", details.date_of_death.to_file_string(Sentinel::Death)),
            ("place_of_death", details.place_of_death.clone()),
            ("fill_color", style.fill.to_hex()),
            ("text_color", style.text.to_hex()),
            ("border_color", style.border.to_hex()),
        ];
        for (name, value) in attributes {
            write!(out, r#" {name}="{}""#, escape_xml(&value))?;
        }
        if let Some(gender) = details.gender.file_code() {
            write!(out, r#" gender="{gender}""#)?;
        }

        if details.photos.is_empty() {
            writeln!(out, "/>")?;
        } else {
            writeln!(out, ">")?;
            for photo in &details.photos {
                writeln!(out, r#"    <{PHOTO} path="{}"/>"#, escape_xml(photo))?;
            }
            writeln!(out, "  </{PERSON}>")?;
        }
    }

    for relationship in store.relationships() {
        writeln!(
            out,
            r#"  <{RELATIONSHIP} from="{}" to="{}" color="{}" width="{}"/>"#,
            escape_xml(&relationship.from().as_string()),
            escape_xml(&relationship.to().as_string()),
            relationship.color().to_hex(),
            relationship.width()
        )?;
    }

    for marriage in store.marriages() {
        let details = marriage.details();
        writeln!(
            out,
            r#"  <{MARRIAGE} person_left="{}" person_right="{}" date="{}" place="{}" x="{}" y="{}"/>"#,
            escape_xml(&marriage.left().as_string()),
            escape_xml(&marriage.right().as_string()),
            details.date.to_file_string(Sentinel::Marriage),
            escape_xml(&details.place),
            marriage.anchor().x(),
            marriage.anchor().y()
        )?;
    }

    writeln!(out, "</{ROOT}>")
}

/// Escapes text for use inside a double-quoted attribute value.
fn escape_xml(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            '\n' => escaped.push_str("&#10;"),
            '\r' => escaped.push_str("&#13;"),
            '\t' => escaped.push_str("&#9;"),
            other => escaped.push(other),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::NaiveDate;
    use lineage_core::text::FixedAdvanceMeasure;

    use super::*;
    use crate::{config::AppConfig, diagnostic::Severity, document::Document};

    fn load(source: &str) -> (Document, Vec<Diagnostic>) {
        let loaded = Document::from_xml(
            AppConfig::default(),
            Arc::new(FixedAdvanceMeasure::new(6.0, 14.0)),
            source,
        )
        .unwrap();
        (loaded.document, loaded.diagnostics)
    }

    #[test]
    fn test_escape_xml() {
        assert_eq!(
            escape_xml(r#"Tom & "Jerry" <cat>'s"#),
            "Tom &amp; &quot;Jerry&quot; &lt;cat&gt;&apos;s"
        );
        assert_eq!(escape_xml("line\nbreak"), "line&#10;break");
    }

    #[test]
    fn test_forward_references_resolve() {
        let source = r#"<genealogy width="800" height="600">
            <relationship from="a" to="b"/>
            <marriage person_left="b" person_right="c" date="1900-01-01" place="Paris"/>
            <item id="a" x="0" y="0" name="Alpha One"/>
            <item id="b" x="0" y="300" name="Beta"/>
            <item id="c" x="500" y="300" name="Gamma"/>
        </genealogy>"#;
        let (doc, diagnostics) = load(source);

        assert!(diagnostics.is_empty(), "{diagnostics:?}");
        assert_eq!(doc.canvas(), Size::new(800.0, 600.0));
        assert_eq!(doc.relationship_count(), 1);
        let marriage = doc.marriages().next().unwrap();
        assert_eq!(marriage.left(), "b");
        assert_eq!(marriage.details().date, EventDate::Unknown);
        assert_eq!(marriage.details().place, "Paris");

        let alpha = doc.person(Id::new("a")).unwrap();
        assert_eq!(alpha.details().first_name, "Alpha");
        assert_eq!(alpha.details().last_name, "One");
    }

    #[test]
    fn test_unresolved_reference_drops_only_that_element() {
        let source = r#"<genealogy width="800" height="600">
            <item id="a" x="0" y="0" name="A"/>
            <relationship from="a" to="ghost"/>
            <marriage person_left="a"/>
        </genealogy>"#;
        let (doc, diagnostics) = load(source);

        assert_eq!(doc.person_count(), 1);
        assert_eq!(doc.relationship_count(), 0);
        let codes: Vec<_> = diagnostics.iter().filter_map(Diagnostic::code).collect();
        assert_eq!(codes, vec![DiagnosticCode::E200, DiagnosticCode::E201]);
        assert!(diagnostics.iter().all(|d| d.severity() == Severity::Error));
        let label = diagnostics[0].labels()[0].span();
        assert!(source[label.start()..label.end()].starts_with("<relationship"));
    }

    #[test]
    fn test_malformed_fields_fall_back_with_warnings() {
        let source = r#"<genealogy width="800" height="600">
            <item id="a" x="oops" y="5" name="A" date_of_birth="someday"
                  fill_color="not-a-color" gender="robot"/>
        </genealogy>"#;
        let (doc, diagnostics) = load(source);

        let person = doc.person(Id::new("a")).unwrap();
        assert_eq!(person.position(), Point::new(0.0, 5.0));
        assert_eq!(person.details().date_of_birth, EventDate::Unknown);
        assert_eq!(person.details().gender, Gender::Unknown);
        assert_eq!(person.style().fill.to_hex(), "#ffffff");
        assert_eq!(diagnostics.len(), 4);
        assert!(diagnostics.iter().all(|d| d.severity().is_warning()));
    }

    #[test]
    fn test_duplicate_person_id_is_dropped() {
        let source = r#"<genealogy width="800" height="600">
            <item id="a" x="0" y="0" name="First"/>
            <item id="a" x="10" y="0" name="Second"/>
        </genealogy>"#;
        let (doc, diagnostics) = load(source);

        assert_eq!(doc.person_count(), 1);
        assert_eq!(doc.person(Id::new("a")).unwrap().details().display_name, "First");
        assert_eq!(diagnostics[0].code(), Some(DiagnosticCode::E300));
    }

    #[test]
    fn test_gedcom_pointers() {
        let source = r#"<genealogy width="800" height="600">
            <item pointer="@I1@" x="0" y="0" name="Parent"/>
            <item pointer="@I2@" x="0" y="300" name="Child" date_of_birth="3 MAR 1901"/>
            <relationship from_pointer="@I1@" to_pointer="@I2@"/>
        </genealogy>"#;
        let (doc, diagnostics) = load(source);

        assert!(diagnostics.is_empty(), "{diagnostics:?}");
        assert_eq!(doc.relationship_count(), 1);
        let child = doc.find_by_name_substring("Child")[0];
        assert_eq!(
            doc.person(child).unwrap().details().date_of_birth,
            EventDate::Known(NaiveDate::from_ymd_opt(1901, 3, 3).unwrap())
        );
    }

    #[test]
    fn test_generated_ids_avoid_later_explicit_ids() {
        let source = r#"<genealogy width="800" height="600">
            <item pointer="@I1@" x="0" y="0" name="From Gedcom"/>
            <item id="p1" x="0" y="300" name="Explicit"/>
        </genealogy>"#;
        let (doc, diagnostics) = load(source);

        assert!(diagnostics.is_empty(), "{diagnostics:?}");
        assert_eq!(doc.person_count(), 2);
        let names: Vec<(String, &str)> = doc
            .persons()
            .map(|person| (person.id().to_string(), person.details().display_name.as_str()))
            .collect();
        assert_eq!(
            names,
            vec![
                ("p2".to_string(), "From Gedcom"),
                ("p1".to_string(), "Explicit"),
            ]
        );
    }

    #[test]
    fn test_wrong_root_is_a_load_error() {
        let result = Document::from_xml(
            AppConfig::default(),
            Arc::new(FixedAdvanceMeasure::new(6.0, 14.0)),
            "<family/>",
        );
        assert!(matches!(
            result,
            Err(crate::error::LineageError::Load {
                err: LoadError::UnexpectedRoot(_),
                ..
            })
        ));
    }

    #[test]
    fn test_written_attributes() {
        let (mut doc, _) = load(r#"<genealogy width="800" height="600"/>"#);
        let id = doc.create_person(Point::new(1.5, 2.0)).unwrap();
        doc.rename_person(id, "Tom \"T\" & Co").unwrap();

        let xml = doc.to_xml();
        assert!(xml.contains(r#"<genealogy width="800" height="600">"#));
        assert!(xml.contains(r#"name="Tom &quot;T&quot; &amp; Co""#));
        assert!(xml.contains(r#"x="1.5" y="2""#));
        assert!(xml.contains(r#"date_of_birth="1900-01-01""#));
        assert!(xml.contains(r#"date_of_death="7999-12-31""#));
        assert!(!xml.contains("gender="));
    }
}
