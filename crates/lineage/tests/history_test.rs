//! Property tests for the undo/redo history.
//!
//! Random edit sequences are applied to a document; undoing every recorded
//! command must walk back through exactly the serialized states seen while
//! editing, and redoing must walk forward through them again.

use std::sync::Arc;

use proptest::prelude::*;

use lineage::{
    Document, MarryMode,
    config::AppConfig,
    geometry::Point,
    identifier::Id,
    text::FixedAdvanceMeasure,
};

#[derive(Debug, Clone)]
enum Edit {
    Create(f32, f32),
    Connect(usize, usize),
    Marry(usize, usize),
    Unmarry(usize),
    Move(usize, f32, f32),
    Delete(usize),
    Rename(usize, String),
    Fill(usize, u8),
    Layout,
}

fn edit_strategy() -> impl Strategy<Value = Edit> {
    let coord = -2000.0f32..2000.0;
    prop_oneof![
        3 => (coord.clone(), coord.clone()).prop_map(|(x, y)| Edit::Create(x, y)),
        2 => (any::<usize>(), any::<usize>()).prop_map(|(a, b)| Edit::Connect(a, b)),
        2 => (any::<usize>(), any::<usize>()).prop_map(|(a, b)| Edit::Marry(a, b)),
        1 => any::<usize>().prop_map(Edit::Unmarry),
        2 => (any::<usize>(), coord.clone(), coord).prop_map(|(a, x, y)| Edit::Move(a, x, y)),
        1 => any::<usize>().prop_map(Edit::Delete),
        1 => (any::<usize>(), "[A-Za-z]{1,12}( [A-Za-z&<]{1,12})?")
            .prop_map(|(a, name)| Edit::Rename(a, name)),
        1 => (any::<usize>(), any::<u8>()).prop_map(|(a, shade)| Edit::Fill(a, shade)),
        1 => Just(Edit::Layout),
    ]
}

fn document() -> Document {
    Document::with_measure(
        AppConfig::default(),
        Arc::new(FixedAdvanceMeasure::new(6.0, 14.0)),
    )
    .expect("default config is valid")
}

fn pick(ids: &[Id], index: usize) -> Option<Id> {
    if ids.is_empty() {
        None
    } else {
        Some(ids[index % ids.len()])
    }
}

/// Applies `edit`, ignoring rejected edits, which record nothing.
fn apply(doc: &mut Document, edit: &Edit) {
    let persons: Vec<Id> = doc.persons().map(|person| person.id()).collect();
    let marriages: Vec<Id> = doc.marriages().map(|marriage| marriage.id()).collect();
    let _ = match edit {
        Edit::Create(x, y) => doc.create_person(Point::new(*x, *y)).map(|_| ()),
        Edit::Connect(a, b) => match (pick(&persons, *a), pick(&persons, *b)) {
            (Some(a), Some(b)) => doc.connect(a, b).map(|_| ()),
            _ => Ok(()),
        },
        Edit::Marry(a, b) => match (pick(&persons, *a), pick(&persons, *b)) {
            (Some(a), Some(b)) => doc.marry(a, b, MarryMode::Interactive).map(|_| ()),
            _ => Ok(()),
        },
        Edit::Unmarry(m) => match pick(&marriages, *m) {
            Some(m) => doc.unmarry(m),
            None => Ok(()),
        },
        Edit::Move(a, x, y) => match pick(&persons, *a) {
            Some(a) => doc.move_persons(&[a], &[Point::new(*x, *y)]).map(|_| ()),
            None => Ok(()),
        },
        Edit::Delete(a) => match pick(&persons, *a) {
            Some(a) => doc.delete_persons(&[a]).map(|_| ()),
            None => Ok(()),
        },
        Edit::Rename(a, name) => match pick(&persons, *a) {
            Some(a) => doc.rename_person(a, name).map(|_| ()),
            None => Ok(()),
        },
        Edit::Fill(a, shade) => match pick(&persons, *a) {
            Some(a) => doc
                .set_fill_color(&[a], &format!("#{shade:02x}{shade:02x}ff"))
                .map(|_| ()),
            None => Ok(()),
        },
        Edit::Layout => doc.auto_layout().map(|_| ()),
    };
}

fn check_undo_redo_retrace_states(edits: &[Edit]) {
    let mut doc = document();
    let mut states = vec![doc.to_xml()];
    for edit in edits {
        let recorded = doc.history().len();
        apply(&mut doc, edit);
        if doc.history().len() != recorded {
            states.push(doc.to_xml());
        } else {
            assert_eq!(&doc.to_xml(), states.last().unwrap(), "{edit:?} changed the document without recording");
        }
    }

    for expected in states.iter().rev().skip(1) {
        doc.undo().expect("Failed to undo");
        assert_eq!(&doc.to_xml(), expected);
    }
    assert!(!doc.can_undo());
    assert!(doc.is_clean());

    for expected in states.iter().skip(1) {
        doc.redo().expect("Failed to redo");
        assert_eq!(&doc.to_xml(), expected);
    }
    assert!(!doc.can_redo());
}

fn check_saved_file_reloads_identically(edits: &[Edit]) {
    let mut doc = document();
    for edit in edits {
        apply(&mut doc, edit);
    }
    let xml = doc.to_xml();
    let reloaded = Document::from_xml(
        AppConfig::default(),
        Arc::new(FixedAdvanceMeasure::new(6.0, 14.0)),
        &xml,
    )
    .expect("Failed to reload");
    assert!(reloaded.diagnostics.is_empty());
    assert_eq!(reloaded.document.to_xml(), xml);
}

proptest! {
    #[test]
    fn undo_redo_retrace_states(edits in prop::collection::vec(edit_strategy(), 0..40)) {
        check_undo_redo_retrace_states(&edits);
    }

    #[test]
    fn saved_file_reloads_identically(edits in prop::collection::vec(edit_strategy(), 0..30)) {
        check_saved_file_reloads_identically(&edits);
    }
}
