//! OpenAPI document assembly.

use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "imgctl",
        description = "Image delivery gateway: scoped upload URLs and cached, resized image delivery",
    ),
    paths(
        crate::api::handlers::signed_url::issue_signed_url,
        crate::api::handlers::delivery::deliver_image,
    ),
    components(schemas(
        crate::api::models::SignedUrlRequest,
        crate::api::models::SignedUrlResponse,
        crate::errors::ProblemDetails,
        crate::validation::InvalidParam,
        crate::validation::ViolationCode,
        crate::validation::ImageExtension,
    )),
    tags(
        (name = "uploads", description = "Signed upload URL issuance"),
        (name = "delivery", description = "Image delivery with caching and resizing")
    )
)]
pub struct ApiDoc;
