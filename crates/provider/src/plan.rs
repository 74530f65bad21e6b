//! Planning
//!
//! Turns Terraform's proposed new state into the planned state: computed
//! attributes the configuration leaves unset become unknown on create, and
//! changes to force-new attributes are reported as requiring replacement.

use crate::resource_data::ID_ATTRIBUTE;
use crate::schema::ResourceSchema;
use crate::state::DynamicValue;

/// Outcome of planning one resource instance
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedChange {
    pub planned_state: DynamicValue,
    /// Force-new attributes whose change requires destroy and recreate
    pub requires_replace: Vec<&'static str>,
}

pub fn plan_change(
    schema: &ResourceSchema,
    prior: &DynamicValue,
    proposed: &DynamicValue,
    config: &DynamicValue,
) -> PlannedChange {
    // Destroy
    if proposed.is_null() {
        return PlannedChange {
            planned_state: DynamicValue::Null,
            requires_replace: vec![],
        };
    }

    let proposed = schema.conform(proposed);

    // Create
    if prior.is_null() {
        return PlannedChange {
            planned_state: mark_computed_unknown(schema, proposed, config),
            requires_replace: vec![],
        };
    }

    // Update
    let requires_replace: Vec<&'static str> = schema
        .attributes
        .iter()
        .filter(|a| a.force_new && prior.get(a.name) != proposed.get(a.name))
        .map(|a| a.name)
        .collect();

    let planned_state = if requires_replace.is_empty() {
        proposed
    } else {
        mark_computed_unknown(schema, proposed, config)
    };

    PlannedChange {
        planned_state,
        requires_replace,
    }
}

/// Computed attributes not set in configuration are unknown until applied.
fn mark_computed_unknown(
    schema: &ResourceSchema,
    mut state: DynamicValue,
    config: &DynamicValue,
) -> DynamicValue {
    if let DynamicValue::Map(map) = &mut state {
        for attr in schema.attributes {
            let unset = config.get(attr.name).is_null();
            if (attr.is_computed() || attr.name == ID_ATTRIBUTE) && unset {
                map.insert(attr.name.to_string(), DynamicValue::Unknown);
            }
        }
    }
    state
}
