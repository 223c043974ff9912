//! Tool catalog: the fixed set of tools offered to the completion model.
//!
//! Built once at startup and shared immutably (`Arc<ToolCatalog>`). Each
//! tool's parameter schema is compiled into a JSON Schema validator when the
//! catalog is built; decoded tool arguments are checked against it.

use std::collections::HashMap;
use std::fmt;

use jsonschema::Validator;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::errors::{AssistantError, ResolutionFailure};

/// Tool names the pipeline knows how to handle.
pub const GET_DOCUMENT_BY_ID: &str = "getDocumentById";
pub const SEARCH_DOCUMENTS: &str = "searchDocuments";
pub const CREATE_MAINTENANCE_TASK: &str = "createMaintenanceTask";
pub const GET_PROPERTY_INFO: &str = "getPropertyInfo";

/// A tool the model may call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    /// JSON Schema (object) for the arguments.
    pub parameter_schema: serde_json::Value,
}

/// Immutable tool registry.
pub struct ToolCatalog {
    definitions: Vec<ToolDefinition>,
    validators: Vec<Validator>,
    by_name: HashMap<String, usize>,
}

impl fmt::Debug for ToolCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolCatalog")
            .field("definitions", &self.definitions)
            .finish_non_exhaustive()
    }
}

impl ToolCatalog {
    /// Build a catalog, compiling every parameter schema.
    ///
    /// A schema that does not compile is a configuration error.
    pub fn new(definitions: Vec<ToolDefinition>) -> Result<Self, AssistantError> {
        let validators = definitions
            .iter()
            .map(|d| {
                Validator::new(&d.parameter_schema).map_err(|e| AssistantError::Configuration {
                    reason: format!("invalid parameter schema for tool '{}': {e}", d.name),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        let by_name = definitions
            .iter()
            .enumerate()
            .map(|(i, d)| (d.name.clone(), i))
            .collect();
        Ok(Self {
            definitions,
            validators,
            by_name,
        })
    }

    /// The property-management tool set.
    pub fn property_management() -> Result<Self, AssistantError> {
        Self::new(vec![
            ToolDefinition {
                name: GET_DOCUMENT_BY_ID.to_string(),
                description: "Fetch a single property document by its ID.".to_string(),
                parameter_schema: json!({
                    "type": "object",
                    "properties": {
                        "id": { "type": "string", "minLength": 1, "description": "Document ID" }
                    },
                    "required": ["id"]
                }),
            },
            ToolDefinition {
                name: SEARCH_DOCUMENTS.to_string(),
                description: "Search property documents by keywords.".to_string(),
                parameter_schema: json!({
                    "type": "object",
                    "properties": {
                        "query": {
                            "type": "string",
                            "minLength": 1,
                            "description": "Keywords to search for"
                        }
                    },
                    "required": ["query"]
                }),
            },
            ToolDefinition {
                name: CREATE_MAINTENANCE_TASK.to_string(),
                description: "Open a maintenance task for a property.".to_string(),
                parameter_schema: json!({
                    "type": "object",
                    "properties": {
                        "propertyId": { "type": "string", "minLength": 1 },
                        "title": { "type": "string", "minLength": 1 },
                        "description": { "type": "string" },
                        "priority": {
                            "type": "string",
                            "enum": ["low", "medium", "high", "urgent"]
                        },
                        "dueDate": { "type": "string", "description": "ISO 8601 date" }
                    },
                    "required": ["propertyId", "title"]
                }),
            },
            ToolDefinition {
                name: GET_PROPERTY_INFO.to_string(),
                description: "Look up details about a property.".to_string(),
                parameter_schema: json!({
                    "type": "object",
                    "properties": {
                        "propertyId": { "type": "string", "minLength": 1 }
                    },
                    "required": ["propertyId"]
                }),
            },
        ])
    }

    pub fn definitions(&self) -> &[ToolDefinition] {
        &self.definitions
    }

    pub fn get(&self, name: &str) -> Option<&ToolDefinition> {
        self.by_name.get(name).map(|&i| &self.definitions[i])
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Validate arguments against the named tool's compiled schema.
    ///
    /// Every violation is reported, joined into one reason.
    pub fn validate(
        &self,
        tool_name: &str,
        arguments: &serde_json::Map<String, serde_json::Value>,
    ) -> Result<(), ResolutionFailure> {
        let &index = self
            .by_name
            .get(tool_name)
            .ok_or_else(|| ResolutionFailure::UnknownTool {
                name: tool_name.to_string(),
            })?;

        let instance = serde_json::Value::Object(arguments.clone());
        let errors: Vec<String> = self.validators[index]
            .iter_errors(&instance)
            .map(|e| e.to_string())
            .collect();

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ResolutionFailure::InvalidArguments {
                tool: tool_name.to_string(),
                reason: errors.join("; "),
            })
        }
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn args(value: serde_json::Value) -> serde_json::Map<String, serde_json::Value> {
        value.as_object().cloned().unwrap()
    }

    fn catalog() -> ToolCatalog {
        ToolCatalog::property_management().unwrap()
    }

    fn single(schema: serde_json::Value) -> ToolCatalog {
        ToolCatalog::new(vec![ToolDefinition {
            name: "t".into(),
            description: String::new(),
            parameter_schema: schema,
        }])
        .unwrap()
    }

    #[test]
    fn test_catalog_contents() {
        let catalog = catalog();
        assert_eq!(catalog.len(), 4);
        assert!(catalog.get(GET_DOCUMENT_BY_ID).is_some());
        assert!(catalog.get(CREATE_MAINTENANCE_TASK).is_some());
        assert!(catalog.get("deleteProperty").is_none());
    }

    #[test]
    fn test_valid_maintenance_task() {
        let result = catalog().validate(
            CREATE_MAINTENANCE_TASK,
            &args(json!({"propertyId": "p-12", "title": "Leaking tap", "priority": "high"})),
        );
        assert!(result.is_ok());
    }

    #[test]
    fn test_missing_required_field() {
        let err = catalog()
            .validate(CREATE_MAINTENANCE_TASK, &args(json!({"title": "Leak"})))
            .unwrap_err();
        assert!(matches!(err, ResolutionFailure::InvalidArguments { .. }));
        assert!(err.to_string().contains("propertyId"));
    }

    #[test]
    fn test_null_required_field_rejected() {
        let result = catalog().validate(GET_DOCUMENT_BY_ID, &args(json!({"id": null})));
        assert!(result.is_err());
    }

    #[test]
    fn test_empty_id_rejected() {
        let result = catalog().validate(GET_DOCUMENT_BY_ID, &args(json!({"id": ""})));
        assert!(result.is_err());
    }

    #[test]
    fn test_wrong_type_rejected() {
        let err = catalog()
            .validate(GET_DOCUMENT_BY_ID, &args(json!({"id": 42})))
            .unwrap_err();
        assert!(err.to_string().contains("string"));
    }

    #[test]
    fn test_enum_enforced() {
        let result = catalog().validate(
            CREATE_MAINTENANCE_TASK,
            &args(json!({"propertyId": "p", "title": "t", "priority": "whenever"})),
        );
        assert!(matches!(result, Err(ResolutionFailure::InvalidArguments { .. })));
    }

    #[test]
    fn test_unknown_tool() {
        let result = catalog().validate("launchRocket", &serde_json::Map::new());
        assert!(matches!(result, Err(ResolutionFailure::UnknownTool { .. })));
    }

    #[test]
    fn test_additional_properties_false() {
        let catalog = single(json!({
            "type": "object",
            "properties": {"a": {"type": "number"}},
            "additionalProperties": false
        }));
        assert!(catalog.validate("t", &args(json!({"a": 1}))).is_ok());
        assert!(catalog.validate("t", &args(json!({"a": 1.5}))).is_ok());
        assert!(catalog.validate("t", &args(json!({"b": 1}))).is_err());
    }

    #[test]
    fn test_constraints_and_nested_objects_enforced() {
        let catalog = single(json!({
            "type": "object",
            "properties": {
                "title": {"type": "string", "minLength": 1},
                "units": {"type": "integer", "minimum": 1},
                "note": {"type": ["string", "null"]},
                "room": {
                    "type": "object",
                    "properties": {"floor": {"type": "integer"}},
                    "required": ["floor"]
                }
            }
        }));

        let conforming = args(json!({
            "title": "Boiler",
            "units": 2,
            "note": null,
            "room": {"floor": 3}
        }));
        assert!(catalog.validate("t", &conforming).is_ok());

        for bad in [
            json!({"title": ""}),
            json!({"units": -3}),
            json!({"note": 42}),
            json!({"room": {}}),
            json!({"room": {"floor": "third"}}),
        ] {
            assert!(catalog.validate("t", &args(bad.clone())).is_err(), "{bad} accepted");
        }
    }

    #[test]
    fn test_all_violations_reported() {
        let catalog = single(json!({
            "type": "object",
            "properties": {
                "title": {"type": "string", "minLength": 1},
                "units": {"type": "integer", "minimum": 1}
            }
        }));
        let err = catalog
            .validate("t", &args(json!({"title": "", "units": 0})))
            .unwrap_err();
        match err {
            ResolutionFailure::InvalidArguments { reason, .. } => {
                assert_eq!(reason.split("; ").count(), 2, "{reason}");
            }
            other => panic!("expected InvalidArguments, got {other:?}"),
        }
    }

    #[test]
    fn test_uncompilable_schema_is_configuration_error() {
        let result = ToolCatalog::new(vec![ToolDefinition {
            name: "broken".into(),
            description: String::new(),
            parameter_schema: json!({"type": "not-a-type"}),
        }]);
        assert!(matches!(result, Err(AssistantError::Configuration { .. })));
    }

    #[test]
    fn test_definitions_serialize_camel_case() {
        let catalog = catalog();
        let json = serde_json::to_value(&catalog.definitions()[0]).unwrap();
        assert!(json.get("parameterSchema").is_some());
    }
}
