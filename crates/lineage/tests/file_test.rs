//! Integration tests for saving, opening and reloading genealogy files.

use std::{fs, sync::Arc};

use tempfile::tempdir;

use lineage::{
    Document, LineageError, MarryMode,
    config::AppConfig,
    date::EventDate,
    diagnostic::DiagnosticCode,
    geometry::Point,
    identifier::Id,
    model::{DetailsPatch, Gender, MarriageDetails},
    text::{FixedAdvanceMeasure, TextMeasure},
};

fn measure() -> Arc<dyn TextMeasure> {
    Arc::new(FixedAdvanceMeasure::new(6.0, 14.0))
}

fn document() -> Document {
    Document::with_measure(AppConfig::default(), measure()).expect("default config is valid")
}

fn family() -> Document {
    let mut doc = document();
    let ada = doc.create_person(Point::new(300.0, 100.0)).unwrap();
    let william = doc.create_person(Point::new(0.0, 100.0)).unwrap();
    let byron = doc.create_person(Point::new(300.0, 500.0)).unwrap();
    doc.rename_person(ada, "Ada Lovelace").unwrap();
    doc.rename_person(william, "William King").unwrap();
    doc.rename_person(byron, "Byron King-Noel").unwrap();
    doc.edit_person_details(
        ada,
        DetailsPatch::default()
            .with_bio("Wrote \"notes\" on the <Analytical Engine> & more")
            .with_gender(Gender::Female)
            .with_photos(vec!["portraits/ada.png".to_string()]),
    )
    .unwrap();
    doc.marry_with(
        ada,
        william,
        MarriageDetails {
            date: EventDate::Known(chrono::NaiveDate::from_ymd_opt(1835, 7, 8).unwrap()),
            place: "Fordhook".to_string(),
        },
        MarryMode::Interactive,
    )
    .unwrap();
    doc.connect(ada, byron).unwrap();
    doc.connect(william, byron).unwrap();
    doc.set_fill_color(&[byron], "#e0f0ff").unwrap();
    doc
}

#[test]
fn test_save_and_open_round_trip() {
    let dir = tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("family.xml");

    let mut doc = family();
    assert!(doc.is_dirty());
    doc.save(&path).expect("Failed to save document");
    assert!(doc.is_clean());

    let loaded = Document::open(AppConfig::default(), measure(), &path).expect("Failed to open");
    assert!(loaded.diagnostics.is_empty());
    let reopened = loaded.document;
    assert_eq!(reopened.person_count(), 3);
    assert_eq!(reopened.relationship_count(), 2);
    assert_eq!(reopened.marriage_count(), 1);
    assert!(reopened.is_clean());
    assert!(!reopened.can_undo());

    let saved = fs::read_to_string(&path).expect("Failed to read saved file");
    assert_eq!(reopened.to_xml(), saved);
}

#[test]
fn test_round_trip_keeps_marriage_sides_and_text() {
    let doc = family();
    let loaded =
        Document::from_xml(AppConfig::default(), measure(), &doc.to_xml()).expect("Failed to load");
    let reopened = loaded.document;

    let ada = reopened.find_by_name_substring("Ada")[0];
    let william = reopened.find_by_name_substring("William")[0];
    let marriage = reopened.marriages().next().expect("marriage survives");
    assert_eq!((marriage.left(), marriage.right()), (william, ada));
    assert_eq!(marriage.details().place, "Fordhook");

    let details = reopened.person(ada).unwrap().details();
    assert_eq!(
        details.bio,
        "Wrote \"notes\" on the <Analytical Engine> & more"
    );
    assert_eq!(details.photos, vec!["portraits/ada.png"]);
    assert_eq!(details.gender, Gender::Female);
    assert_eq!(details.first_name, "Ada");
    assert_eq!(details.last_name, "Lovelace");
}

#[test]
fn test_save_replaces_existing_file() {
    let dir = tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("family.xml");
    fs::write(&path, "stale").expect("Failed to write stale file");

    let mut doc = document();
    doc.create_person(Point::new(10.0, 20.0)).unwrap();
    doc.save(&path).expect("Failed to save document");

    let saved = fs::read_to_string(&path).expect("Failed to read saved file");
    assert!(saved.starts_with("<?xml"));
    assert!(saved.contains(r#"x="10" y="20""#));
}

#[test]
fn test_open_missing_file_is_io_error() {
    let dir = tempdir().expect("Failed to create temp dir");
    let result = Document::open(AppConfig::default(), measure(), dir.path().join("missing.xml"));
    assert!(matches!(result, Err(LineageError::Io(_))));
}

#[test]
fn test_not_xml_is_load_error() {
    let result = Document::from_xml(AppConfig::default(), measure(), "<genealogy>");
    assert!(matches!(result, Err(LineageError::Load { .. })));
}

#[test]
fn test_partial_load_reports_each_dropped_element() {
    let source = r#"<?xml version="1.0" encoding="UTF-8"?>
<genealogy width="800" height="600">
  <relationship from="p1" to="p2"/>
  <item id="p1" x="0" y="0" name="Ada Lovelace"/>
  <item id="p2" x="0" y="400" name="Byron King-Noel" date_of_birth="someday"/>
  <relationship from="p1" to="ghost"/>
  <marriage person_left="p1" person_right="p1"/>
  <note text="ignored"/>
</genealogy>
"#;
    let loaded = Document::from_xml(AppConfig::default(), measure(), source).expect("Failed to load");
    let doc = loaded.document;
    assert_eq!(doc.person_count(), 2);
    assert_eq!(doc.relationship_count(), 1);
    assert_eq!(doc.marriage_count(), 0);
    assert_eq!(doc.canvas().width(), 800.0);

    let codes: Vec<Option<DiagnosticCode>> =
        loaded.diagnostics.iter().map(|diagnostic| diagnostic.code()).collect();
    assert!(codes.contains(&Some(DiagnosticCode::E101)));
    assert!(codes.contains(&Some(DiagnosticCode::E104)));
    assert!(codes.contains(&Some(DiagnosticCode::E200)));
    assert!(codes.contains(&Some(DiagnosticCode::E302)));
    assert!(
        loaded
            .diagnostics
            .iter()
            .all(|diagnostic| !diagnostic.labels().is_empty())
    );
}

#[test]
fn test_loaded_marriage_places_right_spouse_beside_left() {
    let source = r#"<genealogy width="2000" height="1000">
  <item id="a" x="0" y="0"/>
  <item id="b" x="1000" y="400"/>
  <marriage person_left="a" person_right="b"/>
</genealogy>
"#;
    let loaded = Document::from_xml(AppConfig::default(), measure(), source).expect("Failed to load");
    assert!(loaded.diagnostics.is_empty());
    let doc = loaded.document;

    let marriage = doc.marriages().next().expect("marriage is loaded");
    assert_eq!(marriage.left(), "a");
    assert_eq!(marriage.right(), "b");
    assert_eq!(doc.person(Id::new("a")).unwrap().position(), Point::new(0.0, 0.0));
    assert_eq!(doc.person(Id::new("b")).unwrap().position(), Point::new(200.0, 0.0));
    assert_eq!(marriage.anchor(), Point::new(100.0, 0.0));
}
