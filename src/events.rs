use aws_lambda_events::event::sns::SnsEvent;
use serde::de::{self, Deserialize, Deserializer};
use serde_json::{Map, Value};
use tracing::debug;

/// Payloads this function is subscribed to.
#[derive(Debug)]
pub enum Combined {
    /// Image Builder completion notifications delivered through SNS.
    Sns(SnsEvent),
    /// CloudFormation custom resource request asking for a pipeline run.
    Lifecycle(LifecycleEvent),
}

impl<'de> Deserialize<'de> for Combined {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw_value: Value = Deserialize::deserialize(deserializer)?;
        debug!("raw_value: {:?}", raw_value);

        if let Ok(event) = SnsEvent::deserialize(&raw_value) {
            tracing::info!("sns event detected");
            return Ok(Combined::Sns(event));
        }

        // a string RequestType is enough: every other field is read leniently so the
        // provider always gets a response, even for a malformed request
        if raw_value.get("RequestType").is_some_and(Value::is_string) {
            if let Ok(event) = LifecycleEvent::deserialize(&raw_value) {
                tracing::info!("lifecycle event detected");
                return Ok(Combined::Lifecycle(event));
            }
        }

        Err(de::Error::custom(format!(
            "unsupported event type: {raw_value}"
        )))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize)]
pub enum RequestType {
    Create,
    Update,
    Delete,
    #[serde(other)]
    Unknown,
}

impl RequestType {
    pub fn starts_pipeline(&self) -> bool {
        matches!(self, RequestType::Create | RequestType::Update)
    }
}

/// Correlation fields are kept as raw JSON and echoed back verbatim; a missing field
/// is `Value::Null`.
#[derive(Debug, Clone, serde::Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LifecycleEvent {
    pub request_type: RequestType,
    #[serde(default)]
    pub request_id: Value,
    #[serde(default)]
    pub logical_resource_id: Value,
    #[serde(default)]
    pub stack_id: Value,
    #[serde(default)]
    pub physical_resource_id: Value,
    #[serde(default, deserialize_with = "object_or_empty")]
    pub resource_properties: Map<String, Value>,
}

// null or non-object properties read as empty, which surfaces later as a missing
// pipeline arn
fn object_or_empty<'de, D>(deserializer: D) -> Result<Map<String, Value>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Object(map) => Ok(map),
        other => {
            debug!("ignoring non-object ResourceProperties: {}", other);
            Ok(Map::new())
        }
    }
}
