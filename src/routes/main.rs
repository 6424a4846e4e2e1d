use actix_web::{HttpRequest, HttpResponse, web};

use crate::assets::StaticAssets;
use crate::domain::namespace::{BasePath, FORWARDED_PREFIX_HEADER};
use crate::routes::{PortalEventHandler, UiHandler, redirect_permanent};

pub async fn static_asset(
    tail: web::Path<String>,
    assets: web::Data<StaticAssets>,
) -> HttpResponse {
    match assets.get(&tail) {
        Some(contents) => HttpResponse::Ok()
            .content_type(StaticAssets::content_type(&tail))
            .body(contents),
        None => HttpResponse::NotFound().finish(),
    }
}

/// Send `/` and the un-slashed base path to the canonical home page.
pub async fn redirect_to_base(req: HttpRequest, base: web::Data<BasePath>) -> HttpResponse {
    let prefix = req
        .headers()
        .get(FORWARDED_PREFIX_HEADER)
        .and_then(|value| value.to_str().ok());
    redirect_permanent(&base.redirect_target(prefix))
}

pub async fn home(req: HttpRequest, ui: web::Data<dyn UiHandler>) -> HttpResponse {
    ui.home(&req)
}

pub async fn submit(
    req: HttpRequest,
    payload: web::Payload,
    events: web::Data<dyn PortalEventHandler>,
) -> HttpResponse {
    events.submit(req, payload.into_inner()).await
}

pub async fn cancel(req: HttpRequest, events: web::Data<dyn PortalEventHandler>) -> HttpResponse {
    events.cancel(req).await
}

pub async fn upload(
    req: HttpRequest,
    payload: web::Payload,
    events: web::Data<dyn PortalEventHandler>,
) -> HttpResponse {
    events.upload(req, payload.into_inner()).await
}

pub async fn reset_upload(
    req: HttpRequest,
    upload_id: web::Path<String>,
    events: web::Data<dyn PortalEventHandler>,
) -> HttpResponse {
    events.reset_upload(req, upload_id.into_inner()).await
}
