use std::convert::Infallible;

use serde::Serialize;
use warp::{
    http::{header, StatusCode},
    reject::Rejection,
    reply::{self, Reply, Response},
};

use crate::error::{Error, ErrorBody};

pub fn json<T: Serialize>(value: &T, status: StatusCode) -> Response {
    reply::with_status(reply::json(value), status).into_response()
}

pub fn no_content() -> Response {
    StatusCode::NO_CONTENT.into_response()
}

/// A plain-text download the browser saves as `filename`.
pub fn attachment(document: String, filename: &str) -> Response {
    let response = reply::with_header(
        document,
        header::CONTENT_TYPE,
        "text/plain; charset=utf-8",
    );
    reply::with_header(
        response,
        header::CONTENT_DISPOSITION,
        format!("attachment; filename=\"{filename}\""),
    )
    .into_response()
}

fn error_response(status: StatusCode, detail: String) -> Response {
    json(&ErrorBody { detail }, status)
}

/// Turns every rejection into a JSON `{"detail": ...}` response.
pub async fn handle_rejection(err: Rejection) -> Result<Response, Infallible> {
    if let Some(error) = err.find::<Error>() {
        if let Error::Internal(info) = error {
            log::error!("Request failed: {info}");
        }
        return Ok(json(&error.body(), error.code()));
    }

    if err.is_not_found() {
        return Ok(error_response(StatusCode::NOT_FOUND, String::from("Not found")));
    }
    if let Some(e) = err.find::<warp::filters::body::BodyDeserializeError>() {
        return Ok(error_response(StatusCode::BAD_REQUEST, e.to_string()));
    }
    if let Some(e) = err.find::<warp::reject::InvalidQuery>() {
        return Ok(error_response(StatusCode::BAD_REQUEST, e.to_string()));
    }
    if err.find::<warp::reject::PayloadTooLarge>().is_some() {
        return Ok(error_response(
            StatusCode::PAYLOAD_TOO_LARGE,
            String::from("Request body is too large"),
        ));
    }
    if err.find::<warp::reject::UnsupportedMediaType>().is_some() {
        return Ok(error_response(
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            String::from("Expected a JSON body"),
        ));
    }
    if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        return Ok(error_response(
            StatusCode::METHOD_NOT_ALLOWED,
            String::from("Method not allowed"),
        ));
    }

    log::error!("Unhandled rejection: {err:?}");
    Ok(error_response(
        StatusCode::INTERNAL_SERVER_ERROR,
        String::from("Internal server error"),
    ))
}
