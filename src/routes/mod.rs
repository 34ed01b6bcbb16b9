mod algorithms;
mod home;
mod requests;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use sea_orm::DatabaseConnection;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::services::coordinator::Coordinator;

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub coordinator: Coordinator,
}

// Define the OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        home::root,
        algorithms::list_algorithms,
        requests::submit_request,
        requests::get_request,
        requests::list_requests,
    ),
    components(
        schemas(
            crate::models::algorithms::Algorithm,
            crate::entities::analysis_request::RequestStatus,
            requests::SubmitResponse,
            requests::RequestResponse,
            requests::ResultResponse,
        )
    ),
    tags(
        (name = "General", description = "General API information"),
        (name = "Algorithms", description = "The fixed catalog of analysis algorithms"),
        (name = "Analysis Requests", description = "Submit aerial imagery and track the analysis lifecycle")
    ),
    info(
        title = "Aeroscan API",
        version = "0.1.0",
        description = "Aerial imagery analysis front-end: validates uploads, submits them to the analysis service and tracks each request to its result",
    )
)]
struct ApiDoc;

pub fn create_routes(state: AppState) -> Router {
    // Swagger UI (stateless)
    let swagger_router: Router = SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDoc::openapi())
        .into();

    let app_routes = Router::new()
        .route("/", get(home::root))
        .route("/algorithms", get(algorithms::list_algorithms))
        .route("/requests", post(requests::submit_request).get(requests::list_requests))
        .route("/requests/{id}", get(requests::get_request))
        .with_state(state);

    Router::new()
        .merge(swagger_router)
        .merge(app_routes)
}
