use axum::response::Json;

use crate::models::algorithms::{Algorithm, AVAILABLE_ALGORITHMS};

#[utoipa::path(
    get,
    path = "/algorithms",
    tag = "Algorithms",
    responses(
        (status = 200, description = "The fixed analysis catalog", body = [Algorithm])
    )
)]
pub async fn list_algorithms() -> Json<Vec<Algorithm>> {
    Json(AVAILABLE_ALGORITHMS.to_vec())
}
