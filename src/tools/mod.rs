//! Tool families exposed to MCP agents.
//!
//! Each family is declared with [`tool_module!`]: one table row per tool
//! naming the tool, its parameter struct (which doubles as the JSON schema)
//! and the handler method. The macro generates the family struct, its
//! [`ToolModule`] impl and the name-based dispatch, so a family module only
//! contains parameter structs and handlers.
//!
//! Handlers share one shape: resolve defaults, describe the call as an
//! [`ApiRequest`], send it through [`send`] (which decorates failures with
//! the tool's [`Guidance`]) and reshape the payload into a [`ToolOutput`].

use async_trait::async_trait;
use rmcp::schemars::{self, JsonSchema};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::client::{ApiContext, ApiRequest, Transport};

mod envelope;
mod error;
mod guidance;

/// Declare a tool family.
///
/// ```ignore
/// tool_module! {
///     /// Contact tools.
///     ContactTools, family = "contacts";
///     "get_contact" => get_contact(GetContactParams): "Get a contact by ID";
/// }
/// ```
macro_rules! tool_module {
    (
        $(#[$meta:meta])*
        $ty:ident, family = $family:literal;
        $( $name:literal => $method:ident($params:ty): $desc:expr; )+
    ) => {
        $(#[$meta])*
        pub struct $ty<T> {
            ctx: ::std::sync::Arc<$crate::client::ApiContext<T>>,
        }

        impl<T> Clone for $ty<T> {
            fn clone(&self) -> Self {
                Self {
                    ctx: ::std::sync::Arc::clone(&self.ctx),
                }
            }
        }

        impl<T: $crate::client::Transport + 'static> $ty<T> {
            pub const FAMILY: &'static str = $family;
            pub const TOOL_NAMES: &'static [&'static str] = &[$($name),+];

            pub fn new(ctx: ::std::sync::Arc<$crate::client::ApiContext<T>>) -> Self {
                Self { ctx }
            }

            pub fn tool_definitions() -> Vec<$crate::tools::ToolDefinition> {
                vec![$($crate::tools::ToolDefinition::new::<$params>($family, $name, $desc)),+]
            }
        }

        #[::async_trait::async_trait]
        impl<T: $crate::client::Transport + 'static> $crate::tools::ToolModule for $ty<T> {
            fn family(&self) -> &'static str {
                $family
            }

            fn definitions(&self) -> Vec<$crate::tools::ToolDefinition> {
                Self::tool_definitions()
            }

            async fn execute(
                &self,
                name: &str,
                args: ::serde_json::Value,
            ) -> $crate::tools::ToolResult<$crate::tools::ToolOutput> {
                match name {
                    $(
                        $name => {
                            let params = $crate::tools::parse_args::<$params>($name, args)?;
                            self.$method(params).await
                        }
                    )+
                    other => Err($crate::tools::ToolError::unknown(other)),
                }
            }
        }
    };
}

pub mod associations;
pub mod blog;
pub mod calendars;
pub mod contacts;
pub mod conversations;
pub mod email;
pub mod invoices;
pub mod locations;
pub mod media;
pub mod opportunities;
pub mod payments;
pub mod products;
pub mod registry;
pub mod social;
pub mod store;
pub mod surveys;

#[cfg(test)]
mod contacts_test;
#[cfg(test)]
mod conversations_test;
#[cfg(test)]
mod guidance_test;
#[cfg(test)]
mod locations_test;
#[cfg(test)]
mod media_test;
#[cfg(test)]
mod opportunities_test;
#[cfg(test)]
mod payments_test;
#[cfg(test)]
mod registry_test;
#[cfg(test)]
mod social_test;
#[cfg(test)]
pub(crate) mod test_support;

pub use envelope::ToolOutput;
pub use error::{ToolError, ToolResult};
pub use guidance::Guidance;
pub use registry::ToolRegistry;

/// Name, description and input schema of one tool.
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDefinition {
    pub name: &'static str,
    pub description: &'static str,
    pub family: &'static str,
    pub input_schema: Map<String, Value>,
}

impl ToolDefinition {
    pub fn new<P: JsonSchema>(
        family: &'static str,
        name: &'static str,
        description: &'static str,
    ) -> Self {
        let schema = schemars::schema_for!(P);
        let mut input_schema = match serde_json::to_value(&schema) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        };
        input_schema.remove("$schema");
        input_schema
            .entry("type")
            .or_insert_with(|| Value::String("object".to_string()));

        Self {
            name,
            description,
            family,
            input_schema,
        }
    }

    /// Required property names declared by the schema.
    pub fn required_fields(&self) -> Vec<&str> {
        self.input_schema
            .get("required")
            .and_then(Value::as_array)
            .map(|fields| fields.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }
}

/// One resource family of tools.
#[async_trait]
pub trait ToolModule: Send + Sync {
    fn family(&self) -> &'static str;

    fn definitions(&self) -> Vec<ToolDefinition>;

    /// Run the named tool. Fails with [`ToolError::UnknownTool`] for names
    /// this family does not own.
    async fn execute(&self, name: &str, args: Value) -> ToolResult<ToolOutput>;
}

/// Deserialize tool arguments; `null` is treated as an empty object.
pub fn parse_args<P: DeserializeOwned>(tool: &str, args: Value) -> ToolResult<P> {
    let args = if args.is_null() {
        Value::Object(Map::new())
    } else {
        args
    };
    serde_json::from_value(args).map_err(|e| ToolError::invalid(tool, e.to_string()))
}

/// Send one request, decorating any failure with the tool's guidance.
pub(crate) async fn send<T: Transport>(
    ctx: &ApiContext<T>,
    guidance: &Guidance,
    subject: Option<&str>,
    request: ApiRequest,
) -> ToolResult<Value> {
    ctx.send(request)
        .await
        .map_err(|err| guidance.decorate(subject, err))
}

/// Caller-supplied location, else the configured default.
pub(crate) fn resolve_location<T: Transport>(
    ctx: &ApiContext<T>,
    tool: &str,
    explicit: Option<String>,
) -> ToolResult<String> {
    explicit
        .filter(|id| !id.trim().is_empty())
        .or_else(|| ctx.default_location_id().map(str::to_string))
        .ok_or_else(|| {
            ToolError::invalid(
                tool,
                "locationId is required: pass it explicitly or configure GHL_LOCATION_ID",
            )
        })
}

/// Drop `null` members from objects, recursively.
pub(crate) fn strip_nulls(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(k, v)| (k, strip_nulls(v)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(strip_nulls).collect()),
        other => other,
    }
}

/// `value[key]` when present, otherwise the whole value.
pub(crate) fn unwrap_key(value: Value, key: &str) -> Value {
    match value {
        Value::Object(mut map) if map.contains_key(key) => map.remove(key).unwrap_or(Value::Null),
        other => other,
    }
}

/// `value[key]` as an array, empty when absent.
pub(crate) fn array_at(value: &Value, key: &str) -> Vec<Value> {
    value
        .get(key)
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default()
}

/// First string found under any of `keys`.
pub(crate) fn str_at<'a>(value: &'a Value, keys: &[&str]) -> Option<&'a str> {
    keys.iter()
        .find_map(|key| value.get(*key).and_then(Value::as_str))
}

/// Serialize an argument enum/struct into a JSON value.
pub(crate) fn to_json<S: serde::Serialize>(value: &S) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}

/// Wire string of a unit enum serialized by serde (e.g. `"open"`).
pub(crate) fn wire_str<S: serde::Serialize>(value: &S) -> String {
    match to_json(value) {
        Value::String(s) => s,
        other => other.to_string(),
    }
}
