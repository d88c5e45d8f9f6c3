// handlers/mod.rs - 3-Tier Handler Architecture
//
// Public (no auth) → Protected (JWT + active user) → Elevated (admin role)
pub mod elevated; // Tier 3: /api/admin/*
pub mod protected; // Tier 2: /api/*
pub mod public; // Tier 1: /auth/*

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Json, Query};

use crate::error::ApiError;

/// Unwrap a JSON body, reporting malformed input in the API error format.
pub(crate) fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| ApiError::invalid_json(rejection.body_text()))
}

pub(crate) fn query_params<T>(params: Result<Query<T>, QueryRejection>) -> Result<T, ApiError> {
    params
        .map(|Query(value)| value)
        .map_err(|rejection| ApiError::bad_request(rejection.body_text()))
}
