//! JSON-LD documents exchanged with the DSP v2 API.
//!
//! API docs: https://docs.dasch.swiss/latest/DSP-API/03-endpoints/api-v2/

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;
use serde_json::{json, Map, Value};

use crate::config::OntologyConfig;
use crate::error::{Result, SyncError};
use crate::fields::{field as declared_field, IDENTIFIER};
use crate::operation::{Operation, OperationAction};
use crate::payload::{CreatePayload, NewValue};
use crate::target::{RecordKind, TargetRecord, TargetRef, TypedValue, ValueKind};
use crate::vocabulary::{ControlledVocabulary, VocabularyNode};

const ANY_URI: &str = "http://www.w3.org/2001/XMLSchema#anyURI";

/// JSON-LD allows a single object wherever an array is expected.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    One(Box<T>),
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::One(item) => vec![*item],
            OneOrMany::Many(items) => items,
        }
    }
}

#[derive(Debug, Deserialize)]
struct IdRef {
    #[serde(rename = "@id")]
    id: String,
}

#[derive(Debug, Deserialize)]
struct Literal {
    #[serde(rename = "@value")]
    value: String,
}

#[derive(Debug, Deserialize)]
struct ValueNode {
    #[serde(rename = "@id")]
    id: Option<String>,
    #[serde(rename = "@type")]
    value_type: String,
    #[serde(rename = "knora-api:valueAsString")]
    value_as_string: Option<String>,
    #[serde(rename = "knora-api:listValueAsListNode")]
    list_node: Option<IdRef>,
    #[serde(rename = "knora-api:uriValueAsUri")]
    uri: Option<Literal>,
    #[serde(
        rename = "knora-api:linkValueHasTargetIri",
        alias = "knora-api:linkValueHasTarget"
    )]
    link_target: Option<IdRef>,
}

impl ValueNode {
    fn into_typed(self) -> Option<TypedValue> {
        let node_id = self.id?;
        match ValueKind::from_wire_type(&self.value_type)? {
            ValueKind::Text => Some(TypedValue::Text {
                value: self.value_as_string.unwrap_or_default(),
                node_id,
            }),
            ValueKind::List => Some(TypedValue::ListRef {
                list_node: self.list_node?.id,
                node_id,
            }),
            ValueKind::Uri => Some(TypedValue::Uri {
                value: self.uri?.value,
                node_id,
            }),
            ValueKind::Link => Some(TypedValue::Link {
                target_iri: self.link_target?.id,
                node_id,
            }),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ResourceDocument {
    #[serde(rename = "@id")]
    id: String,
    #[serde(rename = "@type")]
    resource_type: String,
    #[serde(rename = "knora-api:lastModificationDate")]
    last_modification: Option<Literal>,
    #[serde(rename = "knora-api:creationDate")]
    creation: Option<Literal>,
    #[serde(flatten)]
    properties: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct SearchDocument {
    #[serde(rename = "@id")]
    id: Option<String>,
    #[serde(rename = "@graph", default)]
    graph: Vec<IdRef>,
}

#[derive(Debug, Deserialize)]
struct ListNodeDocument {
    #[serde(rename = "@id")]
    id: String,
    #[serde(rename = "rdfs:label", default)]
    label: String,
    #[serde(rename = "knora-api:hasSubListNode")]
    children: Option<OneOrMany<ListNodeDocument>>,
}

impl ListNodeDocument {
    fn children(self) -> Vec<ListNodeDocument> {
        self.children.map(OneOrMany::into_vec).unwrap_or_default()
    }

    fn into_node(self) -> VocabularyNode {
        let mut node = VocabularyNode::new(self.id.clone(), self.label.clone());
        node.children = self.children().into_iter().map(Self::into_node).collect();
        node
    }
}

/// Parse a timestamp as emitted by either store into a UTC instant.
///
/// Accepts RFC 3339 with any offset; a timestamp without offset is taken as UTC.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
                .ok()
                .map(|t| t.and_utc())
        })
}

/// Decode a full resource (`GET /v2/resources/{iri}`).
pub fn decode_target_record(json: &str, ontology: &OntologyConfig) -> Result<TargetRecord> {
    let document: ResourceDocument = serde_json::from_str(json)?;

    let class = ontology
        .local_name(&document.resource_type)
        .and_then(RecordKind::from_class_name)
        .ok_or_else(|| {
            SyncError::Decode(format!("Unexpected resource type: {}", document.resource_type))
        })?;

    let mut record = TargetRecord::new(document.id, class);
    record.last_modified = document
        .last_modification
        .or(document.creation)
        .and_then(|t| parse_timestamp(&t.value));

    // Fields outside the declared table are ignored; a declared field that
    // does not decode fails the record, since diffing it as empty would
    // recreate values that already exist.
    for (key, value) in document.properties {
        let Some(field) = ontology.local_name(&key).filter(|f| declared_field(f).is_some()) else {
            continue;
        };
        let nodes = serde_json::from_value::<OneOrMany<ValueNode>>(value).map_err(|e| {
            SyncError::Decode(format!("{}: field '{}': {}", record.iri, field, e))
        })?;
        for node in nodes.into_vec() {
            let typed = node.into_typed().ok_or_else(|| {
                SyncError::Decode(format!(
                    "{}: field '{}': incomplete value node",
                    record.iri, field
                ))
            })?;
            record = record.with_value(field, typed);
        }
    }

    Ok(record)
}

/// IRI of the first resource in a `searchextended` result, if any.
pub fn decode_search_result(json: &str) -> Result<Option<String>> {
    let document: SearchDocument = serde_json::from_str(json)?;
    Ok(document
        .id
        .or_else(|| document.graph.into_iter().next().map(|r| r.id)))
}

/// Decode a list tree (`GET /v2/lists/{iri}`).
pub fn decode_vocabulary(json: &str) -> Result<ControlledVocabulary> {
    let root: ListNodeDocument = serde_json::from_str(json)?;
    let mut vocabulary = ControlledVocabulary::new(root.id.clone(), root.label.clone());
    vocabulary.nodes = root
        .children()
        .into_iter()
        .map(ListNodeDocument::into_node)
        .collect();
    Ok(vocabulary)
}

/// SPARQL CONSTRUCT query finding a resource of `kind` by identifier.
pub fn lookup_query(ontology: &OntologyConfig, kind: RecordKind, identifier: &str) -> String {
    let prefix = &ontology.name;
    let escaped = identifier.replace('\\', "\\\\").replace('"', "\\\"");
    format!(
        r#"PREFIX knora-api: <http://api.knora.org/ontology/knora-api/v2#>
PREFIX {prefix}: <{iri}>
CONSTRUCT {{
    ?metadata knora-api:isMainResource true .
    ?metadata {prefix}:identifier ?identifierValue .
}} WHERE {{
    ?metadata a {prefix}:{class} .
    ?metadata {prefix}:identifier ?identifierValue .
    ?identifierValue knora-api:valueAsString ?identifier .
    FILTER(?identifier = "{escaped}")
}}
"#,
        prefix = prefix,
        iri = ontology.ontology_iri(),
        class = kind.class_name(),
        escaped = escaped,
    )
}

/// Content of a value node, without `@id`.
fn encode_value(kind: ValueKind, value: &str) -> Map<String, Value> {
    let content = match kind {
        ValueKind::Text => json!({ "knora-api:valueAsString": value }),
        ValueKind::List => json!({ "knora-api:listValueAsListNode": { "@id": value } }),
        ValueKind::Uri => json!({
            "knora-api:uriValueAsUri": { "@value": value, "@type": ANY_URI }
        }),
        ValueKind::Link => json!({ "knora-api:linkValueHasTargetIri": { "@id": value } }),
    };

    let mut node = Map::new();
    node.insert("@type".into(), Value::String(kind.wire_type().into()));
    if let Value::Object(content) = content {
        node.extend(content);
    }
    node
}

fn encode_new_values(values: &[NewValue]) -> Value {
    let mut nodes: Vec<Value> = values
        .iter()
        .map(|v| Value::Object(encode_value(v.kind(), v.as_str())))
        .collect();
    if nodes.len() == 1 {
        nodes.remove(0)
    } else {
        Value::Array(nodes)
    }
}

/// Body for `POST /v2/resources`.
pub fn encode_create_payload(
    payload: &CreatePayload,
    project_iri: &str,
    ontology: &OntologyConfig,
) -> Value {
    let mut document = Map::new();
    document.insert("@context".into(), ontology.context());
    document.insert(
        "@type".into(),
        Value::String(ontology.term(payload.kind.class_name())),
    );
    document.insert(
        "knora-api:attachedToProject".into(),
        json!({ "@id": project_iri }),
    );
    document.insert("rdfs:label".into(), Value::String(payload.label.clone()));

    for (field, values) in &payload.fields {
        document.insert(ontology.term(field), encode_new_values(values));
    }

    if let Some(file) = &payload.file {
        document.insert(
            file.kind.property.into(),
            json!({
                "@type": file.kind.value_type,
                "knora-api:fileValueHasFilename": file.internal_filename,
            }),
        );
    }

    Value::Object(document)
}

/// Body for a value create, update or delete request.
pub fn encode_value_request(
    target: &TargetRef,
    operation: &Operation,
    ontology: &OntologyConfig,
) -> Value {
    let node = match &operation.action {
        OperationAction::Create { value } => encode_value(operation.kind, value),
        OperationAction::Update { node_id, value } => {
            let mut node = encode_value(operation.kind, value);
            node.insert("@id".into(), Value::String(node_id.clone()));
            node
        }
        OperationAction::Delete { node_id, .. } => {
            let mut node = Map::new();
            node.insert("@id".into(), Value::String(node_id.clone()));
            node.insert(
                "@type".into(),
                Value::String(operation.kind.wire_type().into()),
            );
            node
        }
    };

    let mut document = Map::new();
    document.insert("@context".into(), ontology.context());
    document.insert("@id".into(), Value::String(target.iri.clone()));
    document.insert(
        "@type".into(),
        Value::String(ontology.term(target.kind.class_name())),
    );
    document.insert(ontology.term(&operation.field), Value::Object(node));
    Value::Object(document)
}

/// Identifier carried by an encoded creation payload, for log lines.
pub fn payload_identifier<'a>(document: &'a Value, ontology: &OntologyConfig) -> Option<&'a str> {
    document
        .get(ontology.term(IDENTIFIER))
        .and_then(|v| v.get("knora-api:valueAsString"))
        .and_then(Value::as_str)
}
