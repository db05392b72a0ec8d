//! OpenAPI documentation aggregator.
//!
//! Collects the `#[utoipa::path]`-annotated handlers and `ToSchema`-derived
//! types into a single OpenAPI spec, served via Scalar UI at `/docs`.

use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "agora API",
        version = "0.1.0",
        description = "Persona dialogues with historical figures, streamed as Server-Sent Events.",
    ),
    tags(
        (name = "Health", description = "Server liveness"),
        (name = "Dialogue", description = "Start or continue a persona dialogue (SSE)"),
    ),
    paths(
        crate::api::health::health,
        crate::api::dialogue::continue_dialogue,
        crate::api::dialogue::start_dialogue,
    ),
    components(schemas(
        crate::api::ErrorResponse,
        crate::api::health::HealthResponse,
        crate::api::types::ClientMessage,
        crate::api::types::ContinueRequest,
        crate::api::types::StartRequest,
    ))
)]
pub struct ApiDoc;
