//! Command stack: a linear history of reversible edits.
//!
//! Commands hold data only. Each one is a label and an [`Operation`], a
//! snapshot of ids and field values taken when the edit happened, and a
//! single dispatcher interprets that data to revert or re-apply the edit.
//! Nothing in a command refers to a live entity, so it stays valid however
//! the document changes between its creation and its replay.
//!
//! ```text
//!  commands:  [c0] [c1] [c2] [c3]
//!                          ^
//!                       cursor = 3     undo reverts c2, redo re-applies c3
//!  clean = Some(2)                     document saved after c1
//! ```

use serde::Serialize;

use log::debug;

use lineage_core::{
    geometry::{Point, Size},
    identifier::Id,
};

use crate::{
    error::DocumentError,
    model::{DetailsPatch, MarriageDetails},
    mutator::{GraphMutator, StyleChange},
    store::Detached,
};

/// A person's center at one point in time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Placement {
    pub person: Id,
    pub position: Point,
}

/// Before and after data of one edit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Operation {
    CreatePerson {
        person: Detached,
    },
    /// Removed entities in removal order; relationships and marriages come
    /// before the person they hung off.
    Delete {
        removed: Vec<Detached>,
    },
    Connect {
        relationship: Detached,
    },
    /// The marriage as created, and spouse positions around the snap.
    Marry {
        marriage: Detached,
        before: Vec<Placement>,
        after: Vec<Placement>,
    },
    Unmarry {
        marriage: Detached,
    },
    Move {
        before: Vec<Placement>,
        after: Vec<Placement>,
    },
    EditDetails {
        person: Id,
        before: DetailsPatch,
        after: DetailsPatch,
        before_placements: Vec<Placement>,
        after_placements: Vec<Placement>,
    },
    EditMarriage {
        marriage: Id,
        before: MarriageDetails,
        after: MarriageDetails,
    },
    Restyle {
        changes: Vec<StyleChange>,
    },
    ResizeCanvas {
        before: Size,
        after: Size,
    },
}

impl Operation {
    /// Re-applies the edit to a document in its pre-edit state.
    pub(crate) fn apply(&self, mutator: &mut GraphMutator<'_>) -> Result<(), DocumentError> {
        match self {
            Operation::CreatePerson { person } => mutator.reattach(person.clone()),
            Operation::Delete { removed } => {
                for detached in removed {
                    mutator.detach(detached.id())?;
                }
                Ok(())
            }
            Operation::Connect { relationship } => mutator.reattach(relationship.clone()),
            Operation::Marry {
                marriage, after, ..
            } => {
                mutator.reattach(marriage.clone())?;
                mutator.place(after)
            }
            Operation::Unmarry { marriage } => mutator.detach(marriage.id()).map(|_| ()),
            Operation::Move { after, .. } => mutator.place(after),
            Operation::EditDetails {
                person,
                after,
                after_placements,
                ..
            } => mutator.replay_details(*person, after, after_placements),
            Operation::EditMarriage {
                marriage, after, ..
            } => mutator.set_marriage_details(*marriage, after),
            Operation::Restyle { changes } => {
                for change in changes {
                    mutator.set_style_value(change.item, change.property, change.after)?;
                }
                Ok(())
            }
            Operation::ResizeCanvas { after, .. } => {
                mutator.set_canvas(*after);
                Ok(())
            }
        }
    }

    /// Reverts the edit on a document in its post-edit state.
    pub(crate) fn revert(&self, mutator: &mut GraphMutator<'_>) -> Result<(), DocumentError> {
        match self {
            Operation::CreatePerson { person } => mutator.detach(person.id()).map(|_| ()),
            Operation::Delete { removed } => {
                for detached in removed.iter().rev() {
                    mutator.reattach(detached.clone())?;
                }
                Ok(())
            }
            Operation::Connect { relationship } => mutator.detach(relationship.id()).map(|_| ()),
            Operation::Marry {
                marriage, before, ..
            } => {
                mutator.detach(marriage.id())?;
                mutator.place(before)
            }
            Operation::Unmarry { marriage } => mutator.reattach(marriage.clone()),
            Operation::Move { before, .. } => mutator.place(before),
            Operation::EditDetails {
                person,
                before,
                before_placements,
                ..
            } => mutator.replay_details(*person, before, before_placements),
            Operation::EditMarriage {
                marriage, before, ..
            } => mutator.set_marriage_details(*marriage, before),
            Operation::Restyle { changes } => {
                for change in changes.iter().rev() {
                    mutator.set_style_value(change.item, change.property, change.before)?;
                }
                Ok(())
            }
            Operation::ResizeCanvas { before, .. } => {
                mutator.set_canvas(*before);
                Ok(())
            }
        }
    }
}

/// A labeled entry in the history, e.g. `"move items"`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Command {
    label: String,
    operation: Operation,
}

impl Command {
    pub fn new(label: impl Into<String>, operation: Operation) -> Self {
        Self {
            label: label.into(),
            operation,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn operation(&self) -> &Operation {
        &self.operation
    }
}

/// Undo/redo history with a clean marker.
#[derive(Debug, Clone, Serialize)]
pub struct CommandStack {
    commands: Vec<Command>,
    /// Number of commands currently applied.
    cursor: usize,
    /// Cursor value at the last save; `None` once that state is unreachable.
    clean: Option<usize>,
}

impl Default for CommandStack {
    fn default() -> Self {
        Self {
            commands: Vec::new(),
            cursor: 0,
            clean: Some(0),
        }
    }
}

impl CommandStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an edit that has already been applied and returns its index.
    ///
    /// Any undone commands above the cursor are discarded.
    pub(crate) fn push(&mut self, command: Command) -> usize {
        if self.cursor < self.commands.len() {
            self.commands.truncate(self.cursor);
            if self.clean.is_some_and(|clean| clean > self.cursor) {
                self.clean = None;
            }
        }
        debug!(label = command.label(); "Command pushed");
        self.commands.push(command);
        self.cursor = self.commands.len();
        self.cursor - 1
    }

    /// Reverts the command below the cursor.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::InvalidState`] if there is nothing to undo.
    pub(crate) fn undo(&mut self, mutator: &mut GraphMutator<'_>) -> Result<&Command, DocumentError> {
        if self.cursor == 0 {
            return Err(DocumentError::invalid("nothing to undo"));
        }
        let index = self.cursor - 1;
        self.commands[index].operation.revert(mutator)?;
        self.cursor = index;
        debug!(label = self.commands[index].label(); "Undo");
        Ok(&self.commands[index])
    }

    /// Re-applies the command at the cursor.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::InvalidState`] if there is nothing to redo.
    pub(crate) fn redo(&mut self, mutator: &mut GraphMutator<'_>) -> Result<&Command, DocumentError> {
        let index = self.cursor;
        let Some(command) = self.commands.get(index) else {
            return Err(DocumentError::invalid("nothing to redo"));
        };
        command.operation.apply(mutator)?;
        self.cursor = index + 1;
        debug!(label = command.label(); "Redo");
        Ok(command)
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor < self.commands.len()
    }

    /// Label of the command [`undo`](crate::document::Document::undo) would revert.
    pub fn undo_label(&self) -> Option<&str> {
        self.cursor
            .checked_sub(1)
            .and_then(|index| self.commands.get(index))
            .map(Command::label)
    }

    /// Label of the command [`redo`](crate::document::Document::redo) would re-apply.
    pub fn redo_label(&self) -> Option<&str> {
        self.commands.get(self.cursor).map(Command::label)
    }

    /// Returns `true` if the applied commands are exactly those at the last save.
    pub fn is_clean(&self) -> bool {
        self.clean == Some(self.cursor)
    }

    pub(crate) fn mark_clean(&mut self) {
        self.clean = Some(self.cursor);
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Number of commands currently applied.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }
}
