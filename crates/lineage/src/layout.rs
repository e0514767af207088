//! Grid auto layout and alignment.
//!
//! Both compute target centers only; the document applies them as a single
//! move so that spouses follow and the whole placement undoes in one step.

use std::collections::HashMap;

use log::debug;
use petgraph::{algo::toposort, graph::DiGraph};

use lineage_core::{
    geometry::{Point, Size},
    identifier::Id,
};

use crate::{config::LayoutConfig, error::DocumentError, store::NodeStore};

/// Direction persons are lined up in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Axis {
    /// A row: every y becomes the mean y.
    Horizontal,
    /// A column: every x becomes the mean x.
    Vertical,
}

/// Targets that line `ids` up along `axis`.
///
/// Fewer than two persons yields no targets.
pub(crate) fn align(
    store: &NodeStore,
    ids: &[Id],
    axis: Axis,
) -> Result<(Vec<Id>, Vec<Point>), DocumentError> {
    let positions = ids
        .iter()
        .map(|&id| store.person(id).map(|person| person.position()))
        .collect::<Result<Vec<_>, _>>()?;
    if positions.len() < 2 {
        return Ok((Vec::new(), Vec::new()));
    }

    let count = positions.len() as f32;
    let targets = match axis {
        Axis::Horizontal => {
            let mean = positions.iter().map(|p| p.y()).sum::<f32>() / count;
            positions.iter().map(|p| p.with_y(mean)).collect()
        }
        Axis::Vertical => {
            let mean = positions.iter().map(|p| p.x()).sum::<f32>() / count;
            positions.iter().map(|p| p.with_x(mean)).collect()
        }
    };
    Ok((ids.to_vec(), targets))
}

/// Number of generations below each person.
///
/// A person without children has depth 0. A left spouse takes the larger
/// depth of the couple so both share a row.
///
/// # Errors
///
/// Returns [`DocumentError::InvalidState`] if the relationships form a cycle.
pub(crate) fn depths(store: &NodeStore) -> Result<HashMap<Id, usize>, DocumentError> {
    let mut graph = DiGraph::<Id, ()>::new();
    let nodes: HashMap<Id, _> = store
        .persons()
        .map(|person| (person.id(), graph.add_node(person.id())))
        .collect();
    for relationship in store.relationships() {
        if let (Some(&from), Some(&to)) = (nodes.get(&relationship.from()), nodes.get(&relationship.to())) {
            graph.add_edge(from, to, ());
        }
    }

    let order = toposort(&graph, None).map_err(|cycle| {
        DocumentError::invalid(format!(
            "relationships form a cycle through `{}`",
            graph[cycle.node_id()]
        ))
    })?;

    let mut depth = HashMap::new();
    for &node in order.iter().rev() {
        let below = graph
            .neighbors(node)
            .filter_map(|child| depth.get(&graph[child]))
            .map(|child_depth: &usize| child_depth + 1)
            .max()
            .unwrap_or(0);
        depth.insert(graph[node], below);
    }

    for marriage in store.marriages() {
        let right = depth.get(&marriage.right()).copied().unwrap_or(0);
        if let Some(left) = depth.get_mut(&marriage.left()) {
            *left = (*left).max(right);
        }
    }
    Ok(depth)
}

/// Targets placing every person on a grid, deepest generation first.
///
/// Right spouses get no target of their own; they follow their left spouse.
pub(crate) fn auto_layout(
    store: &NodeStore,
    canvas: Size,
    config: &LayoutConfig,
) -> Result<(Vec<Id>, Vec<Point>), DocumentError> {
    let depth = depths(store)?;
    let Some(&max_depth) = depth.values().max() else {
        return Ok((Vec::new(), Vec::new()));
    };

    let mut ids = Vec::new();
    let mut targets = Vec::new();
    let mut y = config.start_y();
    for row in (0..=max_depth).rev() {
        let mut x = config.start_x();
        let mut line_height: f32 = 0.0;
        for person in store.persons() {
            if depth.get(&person.id()) != Some(&row) || is_right_spouse(store, person.id()) {
                continue;
            }

            let size = person.size();
            let spouse_width = person
                .spouse()
                .and_then(|spouse| store.person(spouse).ok())
                .map_or(0.0, |spouse| spouse.size().width());
            let width = size.width() + spouse_width;

            if x + width > canvas.width() && x > config.start_x() {
                x = config.start_x();
                y += line_height + config.vertical_spacing();
                line_height = 0.0;
            }

            ids.push(person.id());
            targets.push(Point::new(x + size.width() / 2.0, y + size.height() / 2.0));
            x += width + config.horizontal_spacing();
            line_height = line_height.max(size.height());
        }
        y += line_height + config.row_gap();
    }

    debug!(count = ids.len(), rows = max_depth + 1; "Auto layout computed");
    Ok((ids, targets))
}

fn is_right_spouse(store: &NodeStore, id: Id) -> bool {
    store
        .person(id)
        .ok()
        .and_then(|person| person.marriage())
        .and_then(|marriage| store.marriage(marriage).ok())
        .is_some_and(|marriage| marriage.right() == id)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use float_cmp::assert_approx_eq;
    use lineage_core::text::FixedAdvanceMeasure;

    use super::*;
    use crate::{config::AppConfig, document::Document, mutator::MarryMode};

    fn document() -> Document {
        Document::with_measure(
            AppConfig::default(),
            Arc::new(FixedAdvanceMeasure::new(6.0, 14.0)),
        )
        .unwrap()
    }

    #[test]
    fn test_depth_counts_generations_below() {
        let mut doc = document();
        let grandparent = doc.create_person(Point::new(0.0, 0.0)).unwrap();
        let parent = doc.create_person(Point::new(0.0, 300.0)).unwrap();
        let child = doc.create_person(Point::new(0.0, 600.0)).unwrap();
        doc.connect(grandparent, parent).unwrap();
        doc.connect(parent, child).unwrap();

        let depth = depths(doc.store()).unwrap();
        assert_eq!(depth[&grandparent], 2);
        assert_eq!(depth[&parent], 1);
        assert_eq!(depth[&child], 0);
    }

    #[test]
    fn test_left_spouse_takes_couple_depth() {
        let mut doc = document();
        let husband = doc.create_person(Point::new(0.0, 0.0)).unwrap();
        let wife = doc.create_person(Point::new(500.0, 0.0)).unwrap();
        let child = doc.create_person(Point::new(0.0, 300.0)).unwrap();
        doc.connect(wife, child).unwrap();
        doc.marry(husband, wife, MarryMode::Interactive).unwrap();

        let depth = depths(doc.store()).unwrap();
        assert_eq!(depth[&husband], 1);
        assert_eq!(depth[&wife], 1);
    }

    #[test]
    fn test_cycle_is_rejected() {
        let mut doc = document();
        let a = doc.create_person(Point::new(0.0, 0.0)).unwrap();
        let b = doc.create_person(Point::new(0.0, 300.0)).unwrap();
        doc.connect(a, b).unwrap();
        doc.connect(b, a).unwrap();

        assert!(matches!(
            depths(doc.store()),
            Err(DocumentError::InvalidState(_))
        ));
    }

    #[test]
    fn test_auto_layout_rows_and_wrapping() {
        let mut doc = document();
        let parent = doc.create_person(Point::new(900.0, 900.0)).unwrap();
        let first = doc.create_person(Point::new(900.0, 900.0)).unwrap();
        let second = doc.create_person(Point::new(900.0, 900.0)).unwrap();
        doc.connect(parent, first).unwrap();
        doc.connect(parent, second).unwrap();

        let (ids, targets) =
            auto_layout(doc.store(), Size::new(500.0, 5000.0), &LayoutConfig::default()).unwrap();

        assert_eq!(ids, vec![parent, first, second]);
        // Parent row first.
        assert_approx_eq!(f32, targets[0].x(), 128.0 + 100.0);
        assert_approx_eq!(f32, targets[0].y(), 64.0 + 25.0);
        // Children one row_gap further down; the second wraps.
        assert_approx_eq!(f32, targets[1].y(), 64.0 + 50.0 + 256.0 + 25.0);
        assert_approx_eq!(f32, targets[2].x(), 128.0 + 100.0);
        assert_approx_eq!(f32, targets[2].y(), targets[1].y() + 50.0 + 16.0);
    }

    #[test]
    fn test_align_needs_two_persons() {
        let mut doc = document();
        let a = doc.create_person(Point::new(0.0, 10.0)).unwrap();
        let b = doc.create_person(Point::new(300.0, 30.0)).unwrap();

        let (ids, _) = align(doc.store(), &[a], Axis::Horizontal).unwrap();
        assert!(ids.is_empty());

        let (_, targets) = align(doc.store(), &[a, b], Axis::Horizontal).unwrap();
        assert_eq!(targets, vec![Point::new(0.0, 20.0), Point::new(300.0, 20.0)]);

        let (_, targets) = align(doc.store(), &[a, b], Axis::Vertical).unwrap();
        assert_eq!(targets, vec![Point::new(150.0, 10.0), Point::new(150.0, 30.0)]);
    }
}
