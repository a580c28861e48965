//! Room analysis result as returned by the vision model and persisted in the sidecar file.
//!
//! The model's JSON is not trusted to match the schema. Every field defaults on its own:
//! a missing or wrongly typed field degrades to an empty value instead of failing the parse.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    #[serde(default, deserialize_with = "lenient_string")]
    pub description: String,
    #[serde(rename = "type", default, deserialize_with = "lenient_string")]
    pub room_type: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub style: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub size: String,
    #[serde(alias = "colors", default, deserialize_with = "lenient_string_list")]
    pub colours: Vec<String>,
    /// Simple mode: ids only.
    #[serde(
        default,
        deserialize_with = "lenient_string_list",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub furniture_ids: Vec<String>,
    /// Ranked mode: ids with the model's justification, best first.
    #[serde(
        default,
        deserialize_with = "lenient_picks",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub recommendations: Vec<RecommendationPick>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecommendationPick {
    pub furniture_id: String,
    #[serde(default)]
    pub reason: String,
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(scalar_to_string(&value).unwrap_or_default())
}

fn lenient_string_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Array(items) => items.iter().filter_map(scalar_to_string).collect(),
        Value::String(s) if !s.trim().is_empty() => vec![s],
        _ => Vec::new(),
    })
}

fn lenient_picks<'de, D>(deserializer: D) -> Result<Vec<RecommendationPick>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let Value::Array(items) = value else {
        return Ok(Vec::new());
    };

    Ok(items
        .iter()
        .filter_map(|item| match item {
            Value::Object(obj) => {
                let furniture_id = obj
                    .get("furniture_id")
                    .or_else(|| obj.get("id"))
                    .and_then(scalar_to_string)?;
                let reason = obj
                    .get("reason")
                    .and_then(scalar_to_string)
                    .unwrap_or_default();
                Some(RecommendationPick {
                    furniture_id,
                    reason,
                })
            }
            // A bare id is still a usable pick, just without a justification.
            other => scalar_to_string(other).map(|furniture_id| RecommendationPick {
                furniture_id,
                reason: String::new(),
            }),
        })
        .collect())
}
