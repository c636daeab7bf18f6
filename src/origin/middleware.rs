// Origin gate middleware
use actix_web::body::{EitherBody, MessageBody};
use actix_web::dev::{ServiceRequest, ServiceResponse};
use actix_web::http::header::{HeaderValue, ACCESS_CONTROL_ALLOW_ORIGIN, ORIGIN};
use actix_web::middleware::Next;
use actix_web::{web, Error, HttpResponse};
use log::{debug, warn};

use crate::app_state::AppState;
use crate::origin::{evaluate, GateDecision};

/// Runs before every handler; wire up with `middleware::from_fn(origin_gate)`
///
/// Allowed cross-origin responses echo the request's `Origin` back in
/// `Access-Control-Allow-Origin`. Rejected requests never reach a handler:
/// they get an empty response and the connection is closed.
pub async fn origin_gate<B: MessageBody>(
    req: ServiceRequest,
    next: Next<B>,
) -> Result<ServiceResponse<EitherBody<B>>, Error> {
    let result = gate(req, next).await;
    log_mdc::remove("origin");
    log_mdc::remove("path");
    result
}

async fn gate<B: MessageBody>(
    req: ServiceRequest,
    next: Next<B>,
) -> Result<ServiceResponse<EitherBody<B>>, Error> {
    let origin: Option<HeaderValue> = req.headers().get(ORIGIN).cloned();
    log_mdc::insert("path", req.path());

    let origin = match origin {
        None => {
            log_mdc::insert("origin", "-");
            return Ok(next.call(req).await?.map_into_left_body());
        }
        Some(origin) => origin,
    };

    let decision = match origin.to_str() {
        Ok(value) => {
            log_mdc::insert("origin", value);
            let allow_list = req
                .app_data::<web::Data<AppState>>()
                .map(|state| state.config.cors.allowed_origins.as_slice())
                .unwrap_or_default();
            evaluate(Some(value), allow_list)
        }
        Err(_) => GateDecision::Reject,
    };

    match decision {
        GateDecision::Allow => {
            debug!("Origin allowed: {:?}", origin);
            let mut res = next.call(req).await?;
            res.headers_mut().insert(ACCESS_CONTROL_ALLOW_ORIGIN, origin);
            Ok(res.map_into_left_body())
        }
        GateDecision::Reject => {
            warn!("Origin rejected: {:?} for {}", origin, req.path());
            let response = HttpResponse::Ok().force_close().finish();
            Ok(req.into_response(response).map_into_right_body())
        }
    }
}
