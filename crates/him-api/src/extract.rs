//! Request extractors whose rejections render as [`HimError`] JSON bodies.
//!
//! axum's own extractors answer malformed input with `text/plain`; these
//! wrap them so a bad UUID, an unknown enum value or broken JSON comes back
//! as a `VALIDATION_ERROR` like every other client error.

use axum::{
    extract::{FromRequest, FromRequestParts},
    response::{IntoResponse, Response},
};
use him_common::error::HimError;

#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(HimError))]
pub struct Json<T>(pub T);

impl<T> IntoResponse for Json<T>
where
    axum::Json<T>: IntoResponse,
{
    fn into_response(self) -> Response {
        axum::Json(self.0).into_response()
    }
}

#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(HimError))]
pub struct Path<T>(pub T);

#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(HimError))]
pub struct Query<T>(pub T);

