use serde::{Deserialize, Serialize};

#[derive(Serialize, Debug, utoipa::ToSchema)]
pub struct IdentityTokenResponse {
    pub user_id: i32,
    pub name: String,
    pub email: String,
    /// Opaque string embedded in the QR code.
    #[schema(example = "evreg://u?id=42&e=616e61406578616d706c652e636f6d&k=3a7bd3e2...")]
    pub payload: String,
    /// QR code as an SVG document.
    pub svg: String,
    /// QR code as a 512px PNG, inlined.
    #[schema(example = "data:image/png;base64,iVBORw0KGgo...")]
    pub data_url: String,
}

#[derive(Deserialize, utoipa::IntoParams)]
pub struct RotateQuery {
    /// Email the new token to the account address.
    #[serde(default)]
    pub notify: bool,
}

#[derive(Serialize, Debug, utoipa::ToSchema)]
pub struct RotateResponse {
    pub token: IdentityTokenResponse,
    /// True when the new token was handed to the mail transport.
    pub emailed: bool,
    /// Why delivery failed, when `notify` was requested but not delivered.
    pub delivery_error: Option<String>,
}

#[derive(Serialize, Debug, utoipa::ToSchema)]
pub struct EmailTokenResponse {
    pub emailed: bool,
    pub to: String,
}
