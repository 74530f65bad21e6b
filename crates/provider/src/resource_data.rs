//! Resource data accessor
//!
//! `ResourceData` is what a resource handler sees of one lifecycle call: for
//! every schema attribute the desired value, the last-known value and whether
//! the two differ. Change flags are computed once at construction; handlers
//! write refreshed values with [`ResourceData::set`] and the identity with
//! [`ResourceData::set_id`].

use std::collections::BTreeMap;

use crate::error::{ProviderError, Result};
use crate::schema::ResourceSchema;
use crate::state::DynamicValue;

/// Attribute holding the resource identity
pub const ID_ATTRIBUTE: &str = "id";

/// Tracked value of one attribute
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub current: DynamicValue,
    pub previous: DynamicValue,
    pub changed: bool,
}

#[derive(Debug, Clone)]
pub struct ResourceData {
    id: String,
    fields: BTreeMap<&'static str, Field>,
}

impl ResourceData {
    /// Build from last-known state and desired (planned) state.
    pub fn new(schema: &ResourceSchema, prior: &DynamicValue, planned: &DynamicValue) -> Self {
        let fields = schema
            .attributes
            .iter()
            .map(|attr| {
                let previous = prior.get(attr.name).clone();
                let current = planned.get(attr.name).clone();
                let changed = previous != current;
                (
                    attr.name,
                    Field {
                        current,
                        previous,
                        changed,
                    },
                )
            })
            .collect();

        let id = prior
            .get(ID_ATTRIBUTE)
            .as_string()
            .or_else(|| planned.get(ID_ATTRIBUTE).as_string())
            .unwrap_or_default()
            .to_string();

        Self { id, fields }
    }

    /// Build from a single state, with nothing changed.
    pub fn from_state(schema: &ResourceSchema, state: &DynamicValue) -> Self {
        Self::new(schema, state, state)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn set_id(&mut self, id: impl Into<String>) {
        self.id = id.into();
    }

    /// Mark the resource as gone; the resulting state is null.
    pub fn clear_id(&mut self) {
        self.id.clear();
    }

    /// Desired value of an attribute
    pub fn get(&self, key: &str) -> &DynamicValue {
        static NULL: DynamicValue = DynamicValue::Null;
        self.fields.get(key).map(|f| &f.current).unwrap_or(&NULL)
    }

    pub fn get_string(&self, key: &str) -> String {
        self.get(key).as_string().unwrap_or_default().to_string()
    }

    /// Boolean value; `None` when null or not yet known.
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).as_bool()
    }

    /// Integer value converted to the width the API expects.
    pub fn get_int<T>(&self, key: &str) -> Result<T>
    where
        T: TryFrom<i64>,
    {
        let value = self
            .get(key)
            .as_i64()
            .ok_or_else(|| ProviderError::invalid_attribute(key, "expected a whole number"))?;
        T::try_from(value)
            .map_err(|_| ProviderError::invalid_attribute(key, format!("{value} is out of range")))
    }

    /// Overwrite the value of an attribute. Unknown attributes are ignored.
    pub fn set(&mut self, key: &str, value: DynamicValue) {
        if let Some(field) = self.fields.get_mut(key) {
            field.current = value;
        }
    }

    pub fn has_change(&self, key: &str) -> bool {
        self.fields.get(key).map(|f| f.changed).unwrap_or(false)
    }

    /// `(previous, current)` values of an attribute
    pub fn get_change(&self, key: &str) -> (&DynamicValue, &DynamicValue) {
        static NULL: DynamicValue = DynamicValue::Null;
        match self.fields.get(key) {
            Some(f) => (&f.previous, &f.current),
            None => (&NULL, &NULL),
        }
    }

    /// State to hand back to Terraform; null once the identity is cleared.
    ///
    /// Values still unknown at this point resolve to null, since Terraform
    /// rejects unknown values in applied state.
    pub fn to_state(&self) -> DynamicValue {
        if self.id.is_empty() {
            return DynamicValue::Null;
        }

        let mut map: BTreeMap<String, DynamicValue> = self
            .fields
            .iter()
            .map(|(name, field)| {
                let value = if field.current.is_unknown() {
                    DynamicValue::Null
                } else {
                    field.current.clone()
                };
                (name.to_string(), value)
            })
            .collect();
        map.insert(ID_ATTRIBUTE.to_string(), DynamicValue::String(self.id.clone()));

        DynamicValue::Map(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Attribute, AttributeType};
    use crate::state::{bool_value, int_value, make_state, string_value};

    static SCHEMA: ResourceSchema = ResourceSchema {
        type_name: "test_thing",
        version: 0,
        description: "Test",
        attributes: &[
            Attribute::computed("id", AttributeType::String, "ID"),
            Attribute::required("port", AttributeType::Number, "Port"),
            Attribute::required("weight", AttributeType::Number, "Weight"),
            Attribute::optional_computed("enabled", AttributeType::Bool, "Enabled"),
            Attribute::computed("status", AttributeType::String, "Status"),
        ],
    };

    fn prior() -> DynamicValue {
        make_state(vec![
            ("id", string_value("web-1")),
            ("port", int_value(80)),
            ("weight", int_value(5)),
            ("enabled", bool_value(true)),
            ("status", string_value("UP")),
        ])
    }

    #[test]
    fn test_change_detection() {
        let planned = make_state(vec![
            ("id", string_value("web-1")),
            ("port", int_value(80)),
            ("weight", int_value(10)),
            ("enabled", bool_value(false)),
            ("status", string_value("UP")),
        ]);
        let data = ResourceData::new(&SCHEMA, &prior(), &planned);

        assert_eq!(data.id(), "web-1");
        assert!(!data.has_change("port"));
        assert!(data.has_change("weight"));
        assert!(data.has_change("enabled"));
        assert!(!data.has_change("missing"));

        let (old, new) = data.get_change("enabled");
        assert_eq!(old.as_bool(), Some(true));
        assert_eq!(new.as_bool(), Some(false));
        assert_eq!(data.get_int::<u16>("weight").unwrap(), 10);
    }

    #[test]
    fn test_from_state_has_no_changes() {
        let data = ResourceData::from_state(&SCHEMA, &prior());
        for attr in SCHEMA.attributes {
            assert!(!data.has_change(attr.name));
        }
    }

    #[test]
    fn test_create_starts_without_identity() {
        let planned = make_state(vec![
            ("id", DynamicValue::Unknown),
            ("port", int_value(80)),
            ("weight", int_value(1)),
            ("enabled", DynamicValue::Unknown),
            ("status", DynamicValue::Unknown),
        ]);
        let data = ResourceData::new(&SCHEMA, &DynamicValue::Null, &planned);

        assert_eq!(data.id(), "");
        assert!(data.has_change("port"));
        assert_eq!(data.get_bool("enabled"), None);
        assert!(data.to_state().is_null());
    }

    #[test]
    fn test_to_state_resolves_unknowns() {
        let planned = make_state(vec![
            ("port", int_value(80)),
            ("weight", int_value(1)),
            ("status", DynamicValue::Unknown),
        ]);
        let mut data = ResourceData::new(&SCHEMA, &DynamicValue::Null, &planned);
        data.set_id("web-1");

        let state = data.to_state();
        assert_eq!(state.get("id").as_string(), Some("web-1"));
        assert!(state.get("status").is_null());
        assert_eq!(state.get("port").as_i64(), Some(80));
    }

    #[test]
    fn test_get_int_rejects_out_of_range() {
        let planned = make_state(vec![("port", int_value(70000))]);
        let data = ResourceData::new(&SCHEMA, &DynamicValue::Null, &planned);
        let err = data.get_int::<u16>("port").unwrap_err();
        assert!(err.to_string().contains("port"));
        assert!(data.get_int::<u16>("weight").is_err());
    }

    #[test]
    fn test_clear_id_nulls_state() {
        let mut data = ResourceData::from_state(&SCHEMA, &prior());
        data.set("status", string_value("DOWN"));
        assert_eq!(data.to_state().get("status").as_string(), Some("DOWN"));

        data.clear_id();
        assert!(data.to_state().is_null());
    }
}
