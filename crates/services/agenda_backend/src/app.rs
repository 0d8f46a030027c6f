// --- File: crates/services/agenda_backend/src/app.rs ---
use agenda_config::AppConfig;
use agenda_db::SqlBookingStore;
use agenda_slots::{handlers::SlotsState, routes as slots_routes};
use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Assembles the full application router around an initialised store.
pub fn build_app(config: Arc<AppConfig>, store: Arc<SqlBookingStore>) -> Router {
    let slots_state = Arc::new(SlotsState::new(config, store));

    let api_router = Router::new()
        .route("/", get(|| async { "Welcome to the Agenda API!" }))
        .merge(slots_routes::routes(slots_state));

    #[allow(unused_mut)] // mutated only with the openapi feature
    let mut app = Router::new().nest("/api", api_router);

    #[cfg(feature = "openapi")]
    {
        use agenda_slots::doc::SlotsApiDoc;
        use utoipa::OpenApi;
        use utoipa_swagger_ui::SwaggerUi;

        #[derive(OpenApi)]
        #[openapi(
            info(
                title = "Agenda API",
                version = "0.1.0",
                description = "Availability slots and booking API"
            ),
            servers((url = "/api", description = "Main API Prefix")),
        )]
        struct ApiDoc;

        let mut openapi_doc = ApiDoc::openapi();
        openapi_doc.merge(SlotsApiDoc::openapi());
        tracing::info!("Adding Swagger UI at /api/docs");

        let swagger_ui = SwaggerUi::new("/api/docs").url("/api/docs/openapi.json", openapi_doc);
        app = app.merge(swagger_ui);
    }

    app.layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
