//! Schema contracts between pipeline stages.
//!
//! Each record derives a JSON Schema through `schemars`. The schema is sent to
//! the model as the expected answer shape and is checked again when the answer
//! comes back, before it is deserialized into the typed record.

pub mod records;

use schemars::schema::{InstanceType, Schema, SingleOrVec};
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::{XrayError, XrayResult};

pub use records::{
    AnalysisRequest, AnalysisResult, SummaryRequest, SummaryResult, VisualizationInput,
    VisualizationRequest, VisualizationResult,
};

/// A record that crosses a stage boundary.
pub trait Contract: Serialize + DeserializeOwned + JsonSchema {
    /// Contract name used in error messages and logs.
    const NAME: &'static str;
}

/// One declared field of a contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldContract {
    pub name: String,
    pub kind: FieldKind,
    pub description: Option<String>,
    pub required: bool,
}

/// Semantic type of a contract field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    String,
    Boolean,
    Other,
}

impl FieldKind {
    fn accepts(&self, value: &Value) -> bool {
        match self {
            FieldKind::String => value.is_string(),
            FieldKind::Boolean => value.is_boolean(),
            FieldKind::Other => true,
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            FieldKind::String => "string",
            FieldKind::Boolean => "boolean",
            FieldKind::Other => "value",
        }
    }
}

/// Field-by-field contract derived from a record's JSON Schema.
#[derive(Debug, Clone)]
pub struct SchemaContract {
    name: &'static str,
    schema: Value,
    fields: Vec<FieldContract>,
}

impl SchemaContract {
    /// Build the contract for a record type.
    pub fn of<T: Contract>() -> Self {
        let root = schemars::schema_for!(T);
        let mut fields = Vec::new();

        if let Some(object) = root.schema.object.as_ref() {
            for (name, schema) in &object.properties {
                let (kind, description) = match schema {
                    Schema::Object(obj) => {
                        let kind = match &obj.instance_type {
                            Some(SingleOrVec::Single(t)) => match **t {
                                InstanceType::String => FieldKind::String,
                                InstanceType::Boolean => FieldKind::Boolean,
                                _ => FieldKind::Other,
                            },
                            _ => FieldKind::Other,
                        };
                        let description = obj.metadata.as_ref().and_then(|m| m.description.clone());
                        (kind, description)
                    }
                    Schema::Bool(_) => (FieldKind::Other, None),
                };
                fields.push(FieldContract {
                    name: name.clone(),
                    kind,
                    description,
                    required: object.required.contains(name),
                });
            }
        }

        // A schema that cannot be represented as JSON is a derive bug, not a runtime case.
        let schema = serde_json::to_value(&root).unwrap_or(Value::Null);

        Self {
            name: T::NAME,
            schema,
            fields,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The JSON Schema document for this contract.
    pub fn json_schema(&self) -> &Value {
        &self.schema
    }

    /// Check the shape of a raw value: an object with every required field
    /// present, non-null and of the declared kind. Extra fields are ignored.
    pub fn check(&self, value: &Value) -> XrayResult<()> {
        let object = value.as_object().ok_or_else(|| {
            XrayError::validation(self.name, format!("expected an object, got {}", type_name(value)))
        })?;

        for field in &self.fields {
            match object.get(&field.name) {
                None | Some(Value::Null) if field.required => {
                    return Err(XrayError::validation(
                        self.name,
                        format!("missing required field '{}'", field.name),
                    ));
                }
                Some(v) if !v.is_null() && !field.kind.accepts(v) => {
                    return Err(XrayError::validation(
                        self.name,
                        format!(
                            "field '{}' must be a {}, got {}",
                            field.name,
                            field.kind.as_str(),
                            type_name(v)
                        ),
                    ));
                }
                _ => {}
            }
        }

        Ok(())
    }
}

/// Validate a raw value against `T`'s contract and deserialize it.
pub fn validate<T: Contract>(value: Value) -> XrayResult<T> {
    SchemaContract::of::<T>().check(&value)?;
    serde_json::from_value(value).map_err(|e| XrayError::validation(T::NAME, e.to_string()))
}

/// Serialize a typed record and confirm it satisfies its own contract.
pub fn to_checked_value<T: Contract>(record: &T) -> XrayResult<Value> {
    let value = serde_json::to_value(record).map_err(|e| XrayError::validation(T::NAME, e.to_string()))?;
    SchemaContract::of::<T>().check(&value)?;
    Ok(value)
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
