//! Administrative schema endpoints: init, reset and status.

use actix_web::{web, HttpResponse, Responder};
use log::warn;

use crate::api::{service_error_response, ApiState, DataResponse, MessageResponse};

/// POST /database/init — idempotence-checked schema bootstrap
pub async fn initialize_database(state: web::Data<ApiState>) -> impl Responder {
    match state.service.initialize_database().await {
        Ok(()) => HttpResponse::Created().json(MessageResponse {
            success: true,
            message: "Tables created successfully".to_string(),
        }),
        Err(e) => service_error_response("Initialize database error", e),
    }
}

/// POST /database/reset — drop and recreate the schema.
/// Refused outright in production.
pub async fn reset_database(state: web::Data<ApiState>) -> impl Responder {
    if state.config.environment == "production" {
        warn!("Refused database reset in production");
        return HttpResponse::Forbidden().json(MessageResponse {
            success: false,
            message: "Database reset is not allowed in production".to_string(),
        });
    }
    match state.service.reset_database().await {
        Ok(()) => HttpResponse::Ok().json(MessageResponse {
            success: true,
            message: "Database reset successfully".to_string(),
        }),
        Err(e) => service_error_response("Reset database error", e),
    }
}

/// GET /database/status — table existence plus row counts
pub async fn get_database_status(state: web::Data<ApiState>) -> impl Responder {
    match state.service.database_status().await {
        Ok(status) => HttpResponse::Ok().json(DataResponse::new(status)),
        Err(e) => service_error_response("Get database status error", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_support;
    use actix_web::http::StatusCode;
    use actix_web::{test, App};

    #[actix_web::test]
    async fn test_reset_is_forbidden_in_production() {
        let app = test::init_service(
            App::new()
                .app_data(test_support::state_for_env("production"))
                .configure(crate::api::config),
        )
        .await;

        let req = test::TestRequest::post().uri("/database/reset").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);

        let body: MessageResponse = test::read_body_json(resp).await;
        assert!(!body.success);
        assert_eq!(body.message, "Database reset is not allowed in production");
    }
}
