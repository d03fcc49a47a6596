use serde::Serialize;
use serde::de::DeserializeOwned;

/// Marker for types sent as a JSON request body.
///
/// ```
/// use restkit_http::ApiRequest;
///
/// #[derive(serde::Serialize)]
/// #[serde(rename_all = "camelCase")]
/// struct CreateOrder {
///     product_id: u64,
///     quantity: u32,
/// }
///
/// impl ApiRequest for CreateOrder {}
/// ```
pub trait ApiRequest: Serialize + Send + Sync {}

/// Marker for types decoded from a JSON response body.
pub trait ApiResponse: DeserializeOwned + Send {}

impl ApiRequest for serde_json::Value {}
impl ApiResponse for serde_json::Value {}
