//! Handler for `POST /generate`.

use axum::Json;
use pitchcraft_core::generators::{generate_many, ContentKind, GeneratedContent, ProductData};
use serde::Deserialize;
use validator::Validate;

use crate::error::AppResult;
use crate::extract::JsonBody;
use crate::response::DataResponse;

/// The product form plus the variants to render. An empty or missing
/// `kinds` list renders every variant.
#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    #[serde(flatten)]
    pub product: ProductData,
    #[serde(default)]
    pub kinds: Vec<ContentKind>,
}

/// POST /api/generate
pub async fn generate(
    JsonBody(input): JsonBody<GenerateRequest>,
) -> AppResult<Json<DataResponse<Vec<GeneratedContent>>>> {
    input.product.validate()?;

    let data = generate_many(&input.kinds, &input.product);
    tracing::debug!(
        product = %input.product.product_name,
        variants = data.len(),
        "Generated marketing copy"
    );
    Ok(Json(DataResponse { data }))
}
