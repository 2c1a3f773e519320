//! Response and parameter schemas (the OpenAPI subset Gemini accepts).

use super::BuildError;
use derive_new::new;
use derive_setters::Setters;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Type {
    String,
    Number,
    Integer,
    Boolean,
    Array,
    Object,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, new, Setters)]
#[setters(prefix = "with_", strip_option, into)]
#[serde(rename_all = "camelCase")]
pub struct Schema {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    #[setters(skip)]
    pub kind: Option<Type>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[new(default)]
    pub format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[new(default)]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[new(default)]
    pub nullable: Option<bool>,
    #[serde(rename = "enum", default, skip_serializing_if = "Vec::is_empty")]
    #[new(default)]
    pub enum_values: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    #[new(default)]
    #[setters(skip)]
    pub properties: BTreeMap<String, Schema>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    #[new(default)]
    #[setters(skip)]
    pub required: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[new(default)]
    #[setters(skip)]
    pub items: Option<Box<Schema>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    #[new(default)]
    pub property_ordering: Vec<String>,
}

impl Schema {
    fn of(kind: Type) -> Self {
        Self::new(Some(kind))
    }

    pub fn string() -> Self {
        Self::of(Type::String)
    }

    pub fn number() -> Self {
        Self::of(Type::Number)
    }

    pub fn integer() -> Self {
        Self::of(Type::Integer)
    }

    pub fn boolean() -> Self {
        Self::of(Type::Boolean)
    }

    /// A string restricted to `values`.
    pub fn enumeration<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::string().with_enum_values(values.into_iter().map(Into::into).collect::<Vec<_>>())
    }

    pub fn array(items: Schema) -> Self {
        let mut schema = Self::of(Type::Array);
        schema.items = Some(Box::new(items));
        schema
    }

    pub fn object<I, K>(properties: I) -> Self
    where
        I: IntoIterator<Item = (K, Schema)>,
        K: Into<String>,
    {
        let mut schema = Self::of(Type::Object);
        schema.properties = properties
            .into_iter()
            .map(|(name, property)| (name.into(), property))
            .collect();
        schema
    }

    pub fn with_required<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required = names.into_iter().map(Into::into).collect();
        self
    }

    /// Checks the structural shape of the schema tree: every node has a type,
    /// objects declare properties and arrays declare items. Whether the schema
    /// makes sense is left to the service.
    pub fn validate(&self) -> Result<(), BuildError> {
        self.validate_at("$")
    }

    fn validate_at(&self, path: &str) -> Result<(), BuildError> {
        let malformed = |reason| BuildError::Schema {
            path: path.to_string(),
            reason,
        };

        match self.kind {
            None => return Err(malformed("missing type")),
            Some(Type::Object) if self.properties.is_empty() => {
                return Err(malformed("object without properties"));
            }
            Some(Type::Array) if self.items.is_none() => {
                return Err(malformed("array without items"));
            }
            Some(_) => {}
        }

        for (name, property) in &self.properties {
            property.validate_at(&format!("{path}.properties.{name}"))?;
        }
        if let Some(items) = &self.items {
            items.validate_at(&format!("{path}.items"))?;
        }
        Ok(())
    }

    pub fn is_object(&self) -> bool {
        self.kind == Some(Type::Object)
    }
}
