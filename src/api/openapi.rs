//! OpenAPI document assembled from the handler annotations.

use utoipa::OpenApi;

use super::dto;
use super::handlers::{member, roster, system, vzp};
use crate::error::{ErrorBody, ErrorResponse};
use crate::render::{RenderedVzp, TierSection};

/// OpenAPI description of the REST surface.
#[derive(Debug, OpenApi)]
#[openapi(
    info(
        title = "vzp-gateway",
        description = "Sign-up, roster and lifecycle management for VZP events."
    ),
    paths(
        vzp::create_vzp,
        vzp::list_vzps,
        vzp::get_vzp,
        vzp::render_vzp,
        vzp::lock_vzp,
        vzp::unlock_vzp,
        vzp::start_vzp,
        vzp::close_vzp,
        vzp::get_archived,
        roster::join_vzp,
        roster::leave_vzp,
        roster::swap_player,
        roster::remove_member,
        member::upsert_member,
        system::health_handler,
        system::catalog_handler,
        system::ping_handler,
        system::cleanup_handler,
    ),
    components(schemas(
        dto::CreateVzpRequest,
        dto::CreateVzpResponse,
        dto::VzpDto,
        dto::VzpListResponse,
        dto::StatusChangeResponse,
        dto::StartResponse,
        dto::CloseVzpRequest,
        dto::CloseVzpResponse,
        dto::ArchivedVzpDto,
        dto::RosterResponse,
        dto::SwapRequest,
        dto::RemoveRequest,
        dto::RosterEditResponse,
        dto::UpsertMemberRequest,
        dto::MemberResponse,
        dto::DeliveryDto,
        RenderedVzp,
        TierSection,
        ErrorResponse,
        ErrorBody,
    )),
    tags(
        (name = "VZP", description = "Event lifecycle"),
        (name = "Roster", description = "Sign-ups, swaps and removals"),
        (name = "Members", description = "Member directory sync"),
        (name = "System", description = "Health, catalog and maintenance"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_every_route() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/v1/vzps",
            "/api/v1/vzps/{id}/join",
            "/api/v1/vzps/{id}/start",
            "/api/v1/members/{user_id}",
            "/health",
        ] {
            assert!(doc.paths.paths.contains_key(path), "{path} missing");
        }
    }

    #[test]
    fn operator_routes_are_documented() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/v1/vzps/{id}/lock",
            "/api/v1/vzps/{id}/unlock",
            "/api/v1/vzps/{id}/close",
            "/api/v1/vzps/{id}/swap",
            "/api/v1/vzps/{id}/remove",
            "/api/v1/ping",
            "/api/v1/archive/cleanup",
        ] {
            assert!(doc.paths.paths.contains_key(path), "{path} missing");
        }
    }
}
