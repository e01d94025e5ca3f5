use serde_json::Value;

use crate::adapters::AdapterError;

/// Media type requested when listing a container.
pub const JSON_LD: &str = "application/ld+json";

/// Containment predicate linking a container to its members.
pub const LDP_CONTAINS: &str = "http://www.w3.org/ns/ldp#contains";

/// Identifiers of the resources `node_id` directly contains.
///
/// `document` is a JSON-LD node array, or an object wrapping one under
/// `@graph`. A node without `ldp:contains` has no children. A document that
/// does not describe `node_id` at all is an error.
pub fn contained_resources(document: &[u8], node_id: &str) -> Result<Vec<String>, AdapterError> {
    let graph: Value = serde_json::from_slice(document)?;
    let nodes = match &graph {
        Value::Array(nodes) => nodes,
        Value::Object(object) => object
            .get("@graph")
            .and_then(Value::as_array)
            .ok_or_else(|| AdapterError::MalformedGraph("object without @graph".to_string()))?,
        _ => {
            return Err(AdapterError::MalformedGraph(
                "expected an array of nodes".to_string(),
            ))
        }
    };

    let node = nodes
        .iter()
        .find(|node| node.get("@id").and_then(Value::as_str) == Some(node_id))
        .ok_or_else(|| AdapterError::GraphNodeMissing(node_id.to_string()))?;

    match node.get(LDP_CONTAINS) {
        None => Ok(Vec::new()),
        Some(Value::Array(members)) => members.iter().map(member_id).collect(),
        Some(member) => Ok(vec![member_id(member)?]),
    }
}

fn member_id(member: &Value) -> Result<String, AdapterError> {
    match member {
        Value::String(id) => Ok(id.clone()),
        Value::Object(object) => object
            .get("@id")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| AdapterError::MalformedGraph("member without @id".to_string())),
        other => Err(AdapterError::MalformedGraph(format!(
            "unexpected member value: {other}"
        ))),
    }
}
