//! CLI logic for the Lineage genealogy tool.
//!
//! [`run`] loads the configuration, opens the genealogy file named by the
//! command and writes the command's report to the given output.

pub mod error_adapter;

mod args;
mod config;

pub use args::{Args, Command};

use std::{io::Write, sync::Arc};

use log::{info, warn};

use lineage::{
    Document, LineageError, Loaded, diagnostic::Diagnostic, report, text::TextMeasure,
};

/// Run the Lineage CLI application
///
/// # Errors
///
/// Returns `LineageError` for:
/// - File I/O errors, including failures writing to `out`
/// - Configuration loading errors
/// - Files that are not genealogy documents
/// - [`LineageError::Rejected`] when `check` or `layout` finds dropped elements
pub fn run(args: &Args, out: &mut impl Write) -> Result<(), LineageError> {
    let path = args.command.file();
    info!(path; "Processing genealogy file");

    let config = config::load_config(args.config.as_ref())?;
    let measure: Arc<dyn TextMeasure> = Arc::new(config.style().font_measure());
    let source = std::fs::read_to_string(path)?;
    let loaded = Document::from_xml(config, measure, &source)?;

    match &args.command {
        Command::Info { .. } => print_info(&loaded, out),
        Command::Find { text, .. } => find(&loaded.document, text, out),
        Command::Layout { file, output } => {
            let Loaded {
                mut document,
                diagnostics,
            } = loaded;
            reject_dropped(diagnostics, &source)?;
            let target = output.as_deref().unwrap_or(file);
            match document.auto_layout()? {
                Some(_) => writeln!(out, "arranged {} persons", document.person_count())?,
                None => writeln!(out, "layout unchanged")?,
            }
            document.save(target)?;
            info!(path = target; "Layout saved");
            Ok(())
        }
        Command::Timeline { .. } => {
            for event in report::timeline(&loaded.document) {
                writeln!(out, "{event}")?;
            }
            Ok(())
        }
        Command::Report { .. } => print_persons(&loaded.document, out),
        Command::Check { .. } => {
            let Loaded { diagnostics, .. } = loaded;
            for diagnostic in diagnostics.iter().filter(|d| d.severity().is_warning()) {
                writeln!(out, "{diagnostic}")?;
            }
            reject_dropped(diagnostics, &source)?;
            writeln!(out, "ok")?;
            Ok(())
        }
    }
}

fn print_info(loaded: &Loaded, out: &mut impl Write) -> Result<(), LineageError> {
    let document = &loaded.document;
    let canvas = document.canvas();
    writeln!(out, "persons: {}", document.person_count())?;
    writeln!(out, "relationships: {}", document.relationship_count())?;
    writeln!(out, "marriages: {}", document.marriage_count())?;
    writeln!(out, "canvas: {} x {}", canvas.width(), canvas.height())?;
    writeln!(out, "diagnostics: {}", loaded.diagnostics.len())?;
    for diagnostic in &loaded.diagnostics {
        writeln!(out, "  {diagnostic}")?;
    }
    Ok(())
}

/// Tab-separated person table; unknown dates and genders stay blank.
fn print_persons(document: &Document, out: &mut impl Write) -> Result<(), LineageError> {
    writeln!(out, "Id\t{}", report::PERSON_COLUMNS.join("\t"))?;
    for row in report::persons(document) {
        writeln!(out, "{}\t{}", row.id, row.cells().join("\t"))?;
    }
    Ok(())
}

fn find(document: &Document, text: &str, out: &mut impl Write) -> Result<(), LineageError> {
    for id in document.find_by_name_substring(text) {
        let person = document.person(id)?;
        let position = person.position();
        writeln!(
            out,
            "{id}\t{}\t({}, {})",
            person.details().display_name,
            position.x(),
            position.y()
        )?;
    }
    Ok(())
}

/// Fails with every diagnostic if any element was dropped while loading.
fn reject_dropped(
    diagnostics: Vec<Diagnostic>,
    source: &str,
) -> Result<(), LineageError> {
    if diagnostics.iter().any(|d| d.severity().is_error()) {
        warn!(count = diagnostics.len(); "Elements were dropped while loading");
        return Err(LineageError::Rejected {
            diagnostics,
            src: source.to_string(),
        });
    }
    Ok(())
}
