//! Attack CRUD endpoints and target mutations.

use actix_web::{web, HttpResponse, Responder};
use serde::Deserialize;
use uuid::Uuid;

use crate::api::{bad_request, service_error_response, ApiState, DataResponse, MessageResponse};
use crate::models::{
    AttackDanger, AttackFrequency, AttackType, AttackUpdate, NewAttack, NewTarget, Protocol,
    TargetUpdate,
};

/// Attack creation request; enum fields arrive as strings and are validated
/// before the service layer sees them
#[derive(Debug, Deserialize)]
pub struct CreateAttackBody {
    pub name: Option<String>,
    pub frequency: Option<String>,
    pub danger: Option<String>,
    pub attack_type: Option<String>,
    pub source_ips: Option<Vec<String>>,
    pub affected_ports: Option<Vec<i32>>,
    pub mitigation_strategies: Option<Vec<String>>,
    pub targets: Option<Vec<CreateTargetBody>>,
}

#[derive(Debug, Deserialize)]
pub struct CreateTargetBody {
    pub target_ip: Option<String>,
    pub target_domain: Option<String>,
    pub port: Option<i32>,
    pub protocol: Option<String>,
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateAttackBody {
    pub name: Option<String>,
    pub frequency: Option<String>,
    pub danger: Option<String>,
    pub attack_type: Option<String>,
    pub source_ips: Option<Vec<String>>,
    pub affected_ports: Option<Vec<i32>>,
    pub mitigation_strategies: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateAttackWithTargetsBody {
    pub attack: Option<UpdateAttackBody>,
    pub targets: Option<Vec<CreateTargetBody>>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateAttackTargetsBody {
    pub targets: Option<Vec<CreateTargetBody>>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateTargetBody {
    pub target_ip: Option<String>,
    pub target_domain: Option<String>,
    pub port: Option<i32>,
    pub protocol: Option<String>,
    pub tags: Option<Vec<String>>,
}

pub(crate) fn parse_frequency(raw: &str) -> Result<AttackFrequency, String> {
    raw.parse().map_err(|_| {
        format!(
            "Invalid frequency value: {}. Available values: {}",
            raw,
            AttackFrequency::ALL.map(|v| v.as_str()).join(", ")
        )
    })
}

pub(crate) fn parse_danger(raw: &str) -> Result<AttackDanger, String> {
    raw.parse().map_err(|_| {
        format!(
            "Invalid danger value: {}. Available values: {}",
            raw,
            AttackDanger::ALL.map(|v| v.as_str()).join(", ")
        )
    })
}

pub(crate) fn parse_attack_type(raw: &str) -> Result<AttackType, String> {
    raw.parse().map_err(|_| {
        format!(
            "Invalid attack type value: {}. Available values: {}",
            raw,
            AttackType::ALL.map(|v| v.as_str()).join(", ")
        )
    })
}

pub(crate) fn parse_protocol(raw: &str) -> Result<Protocol, String> {
    raw.parse().map_err(|_| {
        format!(
            "Invalid protocol value: {}. Available values: {}",
            raw,
            Protocol::ALL.map(|v| v.as_str()).join(", ")
        )
    })
}

fn validate_name(name: &str) -> Result<(), String> {
    let len = name.chars().count();
    if (3..=40).contains(&len) {
        Ok(())
    } else {
        Err("Invalid name length: must be between 3 and 40 characters".to_string())
    }
}

fn parse_new_target(body: CreateTargetBody) -> Result<NewTarget, String> {
    let target_ip = body
        .target_ip
        .filter(|ip| !ip.is_empty())
        .ok_or_else(|| "Missing required field: target_ip".to_string())?;
    let protocol = body
        .protocol
        .as_deref()
        .map(parse_protocol)
        .transpose()?;
    Ok(NewTarget {
        target_ip,
        target_domain: body.target_domain,
        port: body.port,
        protocol,
        tags: body.tags.unwrap_or_default(),
    })
}

fn parse_new_targets(bodies: Vec<CreateTargetBody>) -> Result<Vec<NewTarget>, String> {
    bodies.into_iter().map(parse_new_target).collect()
}

fn parse_create_attack(body: CreateAttackBody) -> Result<(NewAttack, Vec<NewTarget>), String> {
    let mut missing = Vec::new();
    if body.name.is_none() {
        missing.push("name");
    }
    if body.frequency.is_none() {
        missing.push("frequency");
    }
    if body.danger.is_none() {
        missing.push("danger");
    }
    if body.attack_type.is_none() {
        missing.push("attack_type");
    }
    if !missing.is_empty() {
        return Err(format!("Missing required fields: {}", missing.join(", ")));
    }

    let name = body.name.unwrap();
    validate_name(&name)?;

    let attack = NewAttack {
        name,
        frequency: parse_frequency(&body.frequency.unwrap())?,
        danger: parse_danger(&body.danger.unwrap())?,
        attack_type: parse_attack_type(&body.attack_type.unwrap())?,
        source_ips: body.source_ips.unwrap_or_default(),
        affected_ports: body.affected_ports.unwrap_or_default(),
        mitigation_strategies: body.mitigation_strategies.unwrap_or_default(),
    };
    let targets = parse_new_targets(body.targets.unwrap_or_default())?;
    Ok((attack, targets))
}

fn parse_attack_update(body: UpdateAttackBody) -> Result<AttackUpdate, String> {
    if let Some(name) = &body.name {
        validate_name(name)?;
    }
    Ok(AttackUpdate {
        name: body.name,
        frequency: body.frequency.as_deref().map(parse_frequency).transpose()?,
        danger: body.danger.as_deref().map(parse_danger).transpose()?,
        attack_type: body
            .attack_type
            .as_deref()
            .map(parse_attack_type)
            .transpose()?,
        source_ips: body.source_ips,
        affected_ports: body.affected_ports,
        mitigation_strategies: body.mitigation_strategies,
    })
}

fn parse_target_update(body: UpdateTargetBody) -> Result<TargetUpdate, String> {
    Ok(TargetUpdate {
        target_ip: body.target_ip,
        target_domain: body.target_domain,
        port: body.port,
        protocol: body.protocol.as_deref().map(parse_protocol).transpose()?,
        tags: body.tags,
    })
}

/// POST /attacks — create an attack with optional nested targets
pub async fn create_attack(
    state: web::Data<ApiState>,
    body: web::Json<CreateAttackBody>,
) -> impl Responder {
    let (attack, targets) = match parse_create_attack(body.into_inner()) {
        Ok(parsed) => parsed,
        Err(message) => return bad_request(message),
    };
    match state.service.create_attack_with_targets(attack, targets).await {
        Ok(created) => HttpResponse::Created().json(DataResponse::with_message(
            "Attack created successfully",
            created,
        )),
        Err(e) => service_error_response("Create attack error", e),
    }
}

/// GET /attacks — list all attacks
pub async fn get_all_attacks(state: web::Data<ApiState>) -> impl Responder {
    match state.service.get_all_attacks().await {
        Ok(attacks) => HttpResponse::Ok().json(DataResponse::new(attacks)),
        Err(e) => service_error_response("Get all attacks error", e),
    }
}

/// GET /attacks/{id} — fetch one attack with its targets
pub async fn get_attack(state: web::Data<ApiState>, id: web::Path<Uuid>) -> impl Responder {
    match state.service.get_attack_with_targets(*id).await {
        Ok(attack) => HttpResponse::Ok().json(DataResponse::new(attack)),
        Err(e) => service_error_response("Get attack error", e),
    }
}

/// PUT /attacks/{id} — partial update of attack fields
pub async fn update_attack(
    state: web::Data<ApiState>,
    id: web::Path<Uuid>,
    body: web::Json<UpdateAttackBody>,
) -> impl Responder {
    let update = match parse_attack_update(body.into_inner()) {
        Ok(update) => update,
        Err(message) => return bad_request(message),
    };
    match state.service.update_attack(*id, &update).await {
        Ok(attack) => HttpResponse::Ok().json(DataResponse::with_message(
            "Attack updated successfully",
            attack,
        )),
        Err(e) => service_error_response("Update attack error", e),
    }
}

/// PUT /attacks/{id}/with-targets — update fields and replace the target set
pub async fn update_attack_with_targets(
    state: web::Data<ApiState>,
    id: web::Path<Uuid>,
    body: web::Json<UpdateAttackWithTargetsBody>,
) -> impl Responder {
    let body = body.into_inner();
    let update = match body.attack.map(parse_attack_update).transpose() {
        Ok(update) => update.unwrap_or_default(),
        Err(message) => return bad_request(message),
    };
    let targets = match body.targets.map(parse_new_targets).transpose() {
        Ok(targets) => targets,
        Err(message) => return bad_request(message),
    };
    match state
        .service
        .update_attack_with_targets(*id, &update, targets)
        .await
    {
        Ok(updated) => HttpResponse::Ok().json(DataResponse::with_message(
            "Attack with targets updated successfully",
            updated,
        )),
        Err(e) => service_error_response("Update attack with targets error", e),
    }
}

/// PUT /attacks/{id}/targets — replace the target set only
pub async fn update_attack_targets(
    state: web::Data<ApiState>,
    id: web::Path<Uuid>,
    body: web::Json<UpdateAttackTargetsBody>,
) -> impl Responder {
    let Some(bodies) = body.into_inner().targets else {
        return bad_request("Missing required field: targets".to_string());
    };
    let targets = match parse_new_targets(bodies) {
        Ok(targets) => targets,
        Err(message) => return bad_request(message),
    };
    match state.service.update_attack_targets(*id, targets).await {
        Ok(updated) => HttpResponse::Ok().json(DataResponse::with_message(
            "Attack targets updated successfully",
            updated,
        )),
        Err(e) => service_error_response("Update attack targets error", e),
    }
}

/// DELETE /attacks/{id} — delete an attack, cascading to its targets
pub async fn delete_attack(state: web::Data<ApiState>, id: web::Path<Uuid>) -> impl Responder {
    match state.service.delete_attack(*id).await {
        Ok(true) => HttpResponse::Ok().json(MessageResponse {
            success: true,
            message: "Attack deleted successfully".to_string(),
        }),
        Ok(false) => HttpResponse::NotFound().json(MessageResponse {
            success: false,
            message: "Attack not found".to_string(),
        }),
        Err(e) => service_error_response("Delete attack error", e),
    }
}

/// PUT /targets/{id} — partial update of one target
pub async fn update_target(
    state: web::Data<ApiState>,
    id: web::Path<Uuid>,
    body: web::Json<UpdateTargetBody>,
) -> impl Responder {
    let update = match parse_target_update(body.into_inner()) {
        Ok(update) => update,
        Err(message) => return bad_request(message),
    };
    match state.service.update_target(*id, &update).await {
        Ok(target) => HttpResponse::Ok().json(DataResponse::with_message(
            "Target updated successfully",
            target,
        )),
        Err(e) => service_error_response("Update target error", e),
    }
}
