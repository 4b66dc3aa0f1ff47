use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::modules::system::handler::health,
        crate::modules::system::handler::stats,
        crate::modules::convert::handler::convert,
        crate::modules::jobs::handler::job_status,
    ),
    components(
        schemas(
            crate::modules::system::dto::HealthResponse,
            crate::modules::system::dto::StatsResponse,
            crate::modules::convert::dto::ConvertResponse,
            crate::modules::jobs::dto::JobStatusResponse,
            crate::modules::jobs::model::JobStatus,
            crate::common::response::ErrorBody,
        )
    ),
    tags(
        (name = "System", description = "Liveness and runtime statistics"),
        (name = "Convert", description = "Video intake"),
        (name = "Jobs", description = "Transcode job status")
    )
)]
pub struct ApiDoc;
