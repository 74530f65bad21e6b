//! Schema descriptors
//!
//! Each resource declares its attributes once as a static table. The table
//! drives the schema served to Terraform, planning (force-new and computed
//! handling) and the shape of the state written back.

use crate::state::DynamicValue;
use crate::tfplugin6;

/// cty primitive type of an attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeType {
    String,
    Number,
    Bool,
}

impl AttributeType {
    /// JSON encoding of the cty type, as the protocol expects it
    pub fn cty_json(self) -> &'static [u8] {
        match self {
            AttributeType::String => b"\"string\"",
            AttributeType::Number => b"\"number\"",
            AttributeType::Bool => b"\"bool\"",
        }
    }
}

/// Who supplies an attribute's value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Required,
    Optional,
    /// Read-only, set by the provider
    Computed,
    /// May be configured; the provider fills it in otherwise
    OptionalComputed,
}

/// One attribute of a schema
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attribute {
    pub name: &'static str,
    pub ty: AttributeType,
    pub mode: Mode,
    /// A change forces destroy and recreate
    pub force_new: bool,
    pub sensitive: bool,
    pub description: &'static str,
}

impl Attribute {
    pub const fn new(
        name: &'static str,
        ty: AttributeType,
        mode: Mode,
        description: &'static str,
    ) -> Self {
        Self {
            name,
            ty,
            mode,
            force_new: false,
            sensitive: false,
            description,
        }
    }

    pub const fn required(
        name: &'static str,
        ty: AttributeType,
        description: &'static str,
    ) -> Self {
        Self::new(name, ty, Mode::Required, description)
    }

    pub const fn optional(
        name: &'static str,
        ty: AttributeType,
        description: &'static str,
    ) -> Self {
        Self::new(name, ty, Mode::Optional, description)
    }

    pub const fn computed(
        name: &'static str,
        ty: AttributeType,
        description: &'static str,
    ) -> Self {
        Self::new(name, ty, Mode::Computed, description)
    }

    pub const fn optional_computed(
        name: &'static str,
        ty: AttributeType,
        description: &'static str,
    ) -> Self {
        Self::new(name, ty, Mode::OptionalComputed, description)
    }

    pub const fn force_new(mut self) -> Self {
        self.force_new = true;
        self
    }

    pub const fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }

    pub fn is_computed(&self) -> bool {
        matches!(self.mode, Mode::Computed | Mode::OptionalComputed)
    }

    fn to_proto(&self) -> tfplugin6::schema::Attribute {
        tfplugin6::schema::Attribute {
            name: self.name.to_string(),
            r#type: self.ty.cty_json().to_vec(),
            description: self.description.to_string(),
            required: self.mode == Mode::Required,
            optional: matches!(self.mode, Mode::Optional | Mode::OptionalComputed),
            computed: self.is_computed(),
            sensitive: self.sensitive,
            description_kind: tfplugin6::StringKind::Markdown as i32,
            deprecated: false,
        }
    }
}

/// Schema of a resource type or of the provider block
#[derive(Debug)]
pub struct ResourceSchema {
    pub type_name: &'static str,
    pub version: i64,
    pub description: &'static str,
    pub attributes: &'static [Attribute],
}

impl ResourceSchema {
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    /// Keep exactly the schema's attributes; missing ones become null.
    pub fn conform(&self, value: &DynamicValue) -> DynamicValue {
        if value.is_null() {
            return DynamicValue::Null;
        }
        DynamicValue::Map(
            self.attributes
                .iter()
                .map(|a| (a.name.to_string(), value.get(a.name).clone()))
                .collect(),
        )
    }

    pub fn to_proto(&self) -> tfplugin6::Schema {
        tfplugin6::Schema {
            version: self.version,
            block: Some(tfplugin6::schema::Block {
                version: self.version,
                attributes: self.attributes.iter().map(Attribute::to_proto).collect(),
                block_types: vec![],
                description: self.description.to_string(),
                description_kind: tfplugin6::StringKind::Markdown as i32,
                deprecated: false,
            }),
        }
    }
}

/// Provider configuration block
pub static PROVIDER_SCHEMA: ResourceSchema = ResourceSchema {
    type_name: "glesys",
    version: 0,
    description: "Manage GleSYS load balancer targets and private networks.",
    attributes: &[
        Attribute::optional(
            "userid",
            AttributeType::String,
            "GleSYS project id, e.g. `CL12345`. Defaults to `GLESYS_USERID`.",
        ),
        Attribute::optional(
            "token",
            AttributeType::String,
            "GleSYS API key. Defaults to `GLESYS_TOKEN`.",
        )
        .sensitive(),
        Attribute::optional(
            "api_url",
            AttributeType::String,
            "GleSYS API endpoint. Defaults to `GLESYS_API_URL` or `https://api.glesys.com`.",
        ),
        Attribute::optional(
            "timeout",
            AttributeType::Number,
            "Per-request timeout in seconds. Defaults to `GLESYS_TIMEOUT` or 60.",
        ),
    ],
};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{make_state, string_value};

    static SCHEMA: ResourceSchema = ResourceSchema {
        type_name: "test_thing",
        version: 0,
        description: "Test",
        attributes: &[
            Attribute::computed("id", AttributeType::String, "ID"),
            Attribute::required("zone", AttributeType::String, "Zone").force_new(),
            Attribute::optional_computed("enabled", AttributeType::Bool, "Enabled"),
        ],
    };

    #[test]
    fn test_attribute_flags() {
        let proto = SCHEMA.to_proto();
        let block = proto.block.unwrap();

        let zone = block.attributes.iter().find(|a| a.name == "zone").unwrap();
        assert!(zone.required && !zone.optional && !zone.computed);
        assert_eq!(zone.r#type, b"\"string\"".to_vec());

        let enabled = block.attributes.iter().find(|a| a.name == "enabled").unwrap();
        assert!(!enabled.required && enabled.optional && enabled.computed);
        assert_eq!(enabled.r#type, b"\"bool\"".to_vec());

        assert!(SCHEMA.attribute("zone").unwrap().force_new);
    }

    #[test]
    fn test_provider_token_is_sensitive() {
        let token = PROVIDER_SCHEMA.attribute("token").unwrap();
        assert!(token.sensitive);
        assert_eq!(token.mode, Mode::Optional);
    }

    #[test]
    fn test_conform_fills_and_drops_attributes() {
        let value = make_state(vec![
            ("zone", string_value("a")),
            ("legacy", string_value("dropped")),
        ]);
        let conformed = SCHEMA.conform(&value);
        let map = conformed.as_map().unwrap();

        assert_eq!(map.len(), 3);
        assert!(map["id"].is_null());
        assert_eq!(map["zone"].as_string(), Some("a"));
        assert!(!map.contains_key("legacy"));
    }
}
