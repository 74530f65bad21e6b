//! Partial-update reconciliation
//!
//! Every updatable resource declares a table of its mutable fields. A field
//! either travels in the resource's sparse edit request or is switched
//! through a dedicated toggle endpoint. [`reconcile`] walks the table once
//! and returns the edit request (only if some edit field changed) and the
//! toggle calls to make. Force-new fields never appear in a table.

use crate::error::Result;
use crate::resource_data::ResourceData;

/// Copies a changed field from the resource data into the edit request
pub type EditFn<P> = fn(&mut P, &ResourceData) -> Result<()>;

/// How a changed field reaches the API
pub enum FieldRule<P> {
    /// Part of the generic edit request
    Edit(EditFn<P>),
    /// Dedicated enable/disable endpoints
    Toggle,
}

/// Entry of a resource's mutable-field table
pub struct MutableField<P> {
    pub name: &'static str,
    pub rule: FieldRule<P>,
}

impl<P> MutableField<P> {
    pub const fn edit(name: &'static str, apply: EditFn<P>) -> Self {
        Self {
            name,
            rule: FieldRule::Edit(apply),
        }
    }

    pub const fn toggle(name: &'static str) -> Self {
        Self {
            name,
            rule: FieldRule::Toggle,
        }
    }
}

/// Direction of a toggle call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggle {
    Enable,
    Disable,
}

/// Calls needed to move remote state to the desired state
#[derive(Debug, PartialEq)]
pub struct Reconciliation<P> {
    /// Edit request, present only when at least one edit field changed
    pub edit: Option<P>,
    /// Toggle calls in table order
    pub toggles: Vec<(&'static str, Toggle)>,
}

impl<P> Reconciliation<P> {
    pub fn is_empty(&self) -> bool {
        self.edit.is_none() && self.toggles.is_empty()
    }
}

/// Compare desired and last-known values of every field in `fields`.
///
/// `base` is the edit request carrying only the resource's addressing keys;
/// changed edit fields are copied into it. A toggle's direction follows the
/// field's previous value: previously `true` disables, anything else enables.
pub fn reconcile<P>(
    fields: &[MutableField<P>],
    data: &ResourceData,
    base: P,
) -> Result<Reconciliation<P>> {
    let mut edit = base;
    let mut edited = false;
    let mut toggles = Vec::new();

    for field in fields {
        if !data.has_change(field.name) {
            continue;
        }

        match &field.rule {
            FieldRule::Edit(apply) => {
                apply(&mut edit, data)?;
                edited = true;
            }
            FieldRule::Toggle => {
                let (previous, _) = data.get_change(field.name);
                let direction = if previous.as_bool() == Some(true) {
                    Toggle::Disable
                } else {
                    Toggle::Enable
                };
                toggles.push((field.name, direction));
            }
        }
    }

    Ok(Reconciliation {
        edit: edited.then_some(edit),
        toggles,
    })
}
