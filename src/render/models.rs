use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

/// JSON request body for filling a template.
#[derive(Debug, Deserialize, ToSchema)]
pub struct RenderRequest {
    /// Field values keyed by the variable names of the template configuration.
    /// May also be sent as a string holding a JSON object.
    #[schema(value_type = Object, example = json!({"full_name": "Jane Doe", "amount": "1,250.00", "gender": "female"}))]
    pub data: serde_json::Value,
    /// Only read by the compatibility route when not given in the query string.
    #[serde(default)]
    pub template_id: Option<String>,
}

/// Query parameters accepted by the compatibility route.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RenderQuery {
    /// Template identifier.
    pub template_id: Option<String>,
    /// Field values as a JSON-encoded object.
    pub data: Option<String>,
}
