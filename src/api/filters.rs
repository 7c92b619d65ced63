//! Filtering, statistics and convenience lookup endpoints.

use actix_web::{web, HttpResponse, Responder};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use serde_json::json;

use crate::api::attacks::{parse_attack_type, parse_danger, parse_frequency, parse_protocol};
use crate::api::{bad_request, service_error_response, ApiState, DataResponse};
use crate::models::AttackFilter;
use crate::utils::parse_value_list;

/// Raw filter query string; list parameters are comma-separated
#[derive(Debug, Default, Deserialize)]
pub struct FilterQuery {
    pub frequency: Option<String>,
    pub danger: Option<String>,
    pub attack_type: Option<String>,
    pub protocol: Option<String>,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
    pub search: Option<String>,
}

fn invalid_message(field: &str, invalid: &[String]) -> String {
    if invalid.len() == 1 {
        format!("Invalid {} value: {}", field, invalid[0])
    } else {
        format!("Invalid {} values: {}", field, invalid.join(", "))
    }
}

fn parse_criterion<T: std::str::FromStr>(
    raw: Option<&str>,
    field: &str,
) -> Result<Option<Vec<T>>, String> {
    match raw {
        None => Ok(None),
        Some(s) => match parse_value_list::<T>(s) {
            Ok(values) if values.is_empty() => Ok(None),
            Ok(values) => Ok(Some(values)),
            Err(invalid) => Err(invalid_message(field, &invalid)),
        },
    }
}

fn parse_date(raw: Option<&str>, field: &str) -> Result<Option<DateTime<Utc>>, String> {
    let Some(s) = raw else { return Ok(None) };
    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return Ok(Some(ts.with_timezone(&Utc)));
    }
    if let Ok(date) = s.parse::<NaiveDate>() {
        let midnight = date.and_hms_opt(0, 0, 0).unwrap();
        return Ok(Some(DateTime::from_naive_utc_and_offset(midnight, Utc)));
    }
    Err(format!(
        "Invalid {} value: {}. Expected an RFC 3339 timestamp or YYYY-MM-DD date",
        field, s
    ))
}

fn build_filter(query: FilterQuery) -> Result<AttackFilter, String> {
    Ok(AttackFilter {
        frequency: parse_criterion(query.frequency.as_deref(), "frequency")?,
        danger: parse_criterion(query.danger.as_deref(), "danger")?,
        attack_type: parse_criterion(query.attack_type.as_deref(), "attack type")?,
        protocol: parse_criterion(query.protocol.as_deref(), "protocol")?,
        date_from: parse_date(query.date_from.as_deref(), "date_from")?,
        date_to: parse_date(query.date_to.as_deref(), "date_to")?,
        search: query.search.filter(|s| !s.is_empty()),
    })
}

/// GET /attacks/filter — multi-criteria filtering
pub async fn get_attacks_by_filters(
    state: web::Data<ApiState>,
    query: web::Query<FilterQuery>,
) -> impl Responder {
    let filter = match build_filter(query.into_inner()) {
        Ok(filter) => filter,
        Err(message) => return bad_request(message),
    };
    match state.service.get_attacks_by_filters(&filter).await {
        Ok(attacks) => HttpResponse::Ok().json(json!({
            "success": true,
            "count": attacks.len(),
            "data": attacks,
            "filters": filter,
        })),
        Err(e) => service_error_response("Get attacks by filters error", e),
    }
}

/// GET /attacks/stats — aggregated catalogue statistics
pub async fn get_attack_stats(state: web::Data<ApiState>) -> impl Responder {
    match state.service.get_attack_stats().await {
        Ok(stats) => HttpResponse::Ok().json(DataResponse::new(stats)),
        Err(e) => service_error_response("Get attack stats error", e),
    }
}

/// GET /filters/available — distinct enum values observed in the store
pub async fn get_available_filters(state: web::Data<ApiState>) -> impl Responder {
    match state.service.get_available_filters().await {
        Ok(filters) => HttpResponse::Ok().json(DataResponse::new(filters)),
        Err(e) => service_error_response("Get available filters error", e),
    }
}

/// GET /attacks/frequency/{value}
pub async fn get_attacks_by_frequency(
    state: web::Data<ApiState>,
    value: web::Path<String>,
) -> impl Responder {
    let frequency = match parse_frequency(&value) {
        Ok(frequency) => frequency,
        Err(message) => return bad_request(message),
    };
    match state.service.get_attacks_by_frequency(frequency).await {
        Ok(attacks) => HttpResponse::Ok().json(json!({
            "success": true,
            "count": attacks.len(),
            "data": attacks,
            "frequency": frequency,
        })),
        Err(e) => service_error_response("Get attacks by frequency error", e),
    }
}

/// GET /attacks/danger/{value}
pub async fn get_attacks_by_danger(
    state: web::Data<ApiState>,
    value: web::Path<String>,
) -> impl Responder {
    let danger = match parse_danger(&value) {
        Ok(danger) => danger,
        Err(message) => return bad_request(message),
    };
    match state.service.get_attacks_by_danger(danger).await {
        Ok(attacks) => HttpResponse::Ok().json(json!({
            "success": true,
            "count": attacks.len(),
            "data": attacks,
            "danger": danger,
        })),
        Err(e) => service_error_response("Get attacks by danger error", e),
    }
}

/// GET /attacks/type/{value}
pub async fn get_attacks_by_type(
    state: web::Data<ApiState>,
    value: web::Path<String>,
) -> impl Responder {
    let attack_type = match parse_attack_type(&value) {
        Ok(attack_type) => attack_type,
        Err(message) => return bad_request(message),
    };
    match state.service.get_attacks_by_type(attack_type).await {
        Ok(attacks) => HttpResponse::Ok().json(json!({
            "success": true,
            "count": attacks.len(),
            "data": attacks,
            "attack_type": attack_type,
        })),
        Err(e) => service_error_response("Get attacks by type error", e),
    }
}

/// GET /attacks/protocol/{value} — attacks with a target using the protocol
pub async fn get_attacks_by_protocol(
    state: web::Data<ApiState>,
    value: web::Path<String>,
) -> impl Responder {
    let protocol = match parse_protocol(&value) {
        Ok(protocol) => protocol,
        Err(message) => return bad_request(message),
    };
    match state.service.get_attacks_by_protocol(protocol).await {
        Ok(attacks) => HttpResponse::Ok().json(json!({
            "success": true,
            "count": attacks.len(),
            "data": attacks,
            "protocol": protocol,
        })),
        Err(e) => service_error_response("Get attacks by protocol error", e),
    }
}
