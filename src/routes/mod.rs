//! Route topology of one portal: static assets, redirects and the per-run subtree.
use std::sync::Arc;

use actix_web::dev::Payload;
use actix_web::http::{Method, header};
use actix_web::{HttpRequest, HttpResponse, web};
use futures_util::future::LocalBoxFuture;

use crate::assets::StaticAssets;
use crate::domain::namespace::BasePath;

pub mod main;
pub mod ui;

/// Portal session events triggered from the home page.
pub trait PortalEventHandler: Send + Sync + 'static {
    fn submit(&self, req: HttpRequest, payload: Payload) -> LocalBoxFuture<'_, HttpResponse>;

    fn cancel(&self, req: HttpRequest) -> LocalBoxFuture<'_, HttpResponse>;

    /// Handles both `POST` and `OPTIONS`.
    fn upload(&self, req: HttpRequest, payload: Payload) -> LocalBoxFuture<'_, HttpResponse>;

    /// Handles both `DELETE` and `OPTIONS`.
    fn reset_upload(
        &self,
        req: HttpRequest,
        upload_id: String,
    ) -> LocalBoxFuture<'_, HttpResponse>;
}

/// Renders the portal home page.
pub trait UiHandler: Send + Sync + 'static {
    fn home(&self, req: &HttpRequest) -> HttpResponse;
}

/// Everything needed to mount a portal on an app.
#[derive(Clone)]
pub struct AttachRoutes {
    pub events: Arc<dyn PortalEventHandler>,
    pub ui: Arc<dyn UiHandler>,
    pub assets: StaticAssets,
    pub base_path: BasePath,
}

/// Mount the portal routes described by `routes` on `cfg`.
pub fn attach_routes(cfg: &mut web::ServiceConfig, routes: AttachRoutes) {
    let base = routes.base_path.as_str().to_string();

    cfg.app_data(web::Data::from(routes.events))
        .app_data(web::Data::from(routes.ui))
        .app_data(web::Data::new(routes.assets))
        .app_data(web::Data::new(routes.base_path))
        .service(web::resource("/static/{tail:.*}").route(web::get().to(main::static_asset)))
        .service(web::resource("/").route(web::get().to(main::redirect_to_base)))
        .service(web::resource(base.as_str()).route(web::get().to(main::redirect_to_base)))
        .service(
            web::scope(&base)
                .route("/", web::get().to(main::home))
                .route("/submit", web::post().to(main::submit))
                .route("/cancel", web::post().to(main::cancel))
                .service(
                    web::scope("/api/v1")
                        .service(
                            web::resource("/upload")
                                .route(web::post().to(main::upload))
                                .route(web::method(Method::OPTIONS).to(main::upload)),
                        )
                        .service(
                            web::resource("/reset/{upload_id}")
                                .route(web::delete().to(main::reset_upload))
                                .route(web::method(Method::OPTIONS).to(main::reset_upload)),
                        ),
                ),
        );
}

fn redirect_permanent(location: &str) -> HttpResponse {
    HttpResponse::PermanentRedirect()
        .insert_header((header::LOCATION, location))
        .finish()
}

/// Generic failure returned to clients; details stay in the server log.
pub fn internal_error() -> HttpResponse {
    HttpResponse::InternalServerError().body("Internal Server Error")
}

/// Answer to a CORS/`OPTIONS` probe listing the allowed methods.
pub fn preflight(allowed: &'static str) -> HttpResponse {
    HttpResponse::NoContent()
        .insert_header((header::ALLOW, allowed))
        .insert_header((header::ACCESS_CONTROL_ALLOW_METHODS, allowed))
        .finish()
}
