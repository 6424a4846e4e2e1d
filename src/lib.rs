//! Per-run interactive input portal: resolved configuration served over actix-web.
use std::io;
use std::sync::Arc;
use std::time::Duration;

use actix_web::middleware::Logger;
use actix_web::{App, HttpServer};

use crate::assets::{StaticAssets, TemplateChain};
use crate::models::config::Config;
use crate::models::context::ActionContext;
use crate::models::environment::ProcessEnvironment;
use crate::routes::ui::WebUi;
use crate::routes::{AttachRoutes, PortalEventHandler, UiHandler, attach_routes};
use crate::services::session::{PortalSession, SessionOutcome, Submission};

pub mod assets;
pub mod domain;
pub mod dto;
pub mod forms;
pub mod models;
pub mod routes;
pub mod services;

/// How a portal run ended.
#[derive(Debug)]
pub enum PortalExit {
    Submitted(Submission),
    Cancelled,
    TimedOut,
}

/// Serve the portal until it is submitted, cancelled or times out.
pub async fn run(config: Config, context: Arc<dyn ActionContext>) -> io::Result<PortalExit> {
    let config = Arc::new(config);

    let assets = StaticAssets::embedded().map_err(|err| {
        context.error(&format!("unable-to-create-file-system-for-static-assets: {err}"));
        io::Error::other(err)
    })?;
    let templates = TemplateChain::embedded().map_err(io::Error::other)?;

    let session = Arc::new(PortalSession::new(config.fields.clone()));
    let events: Arc<dyn PortalEventHandler> = session.clone();
    let ui: Arc<dyn UiHandler> = Arc::new(WebUi::new(
        config.clone(),
        context.clone(),
        Arc::new(ProcessEnvironment),
        templates,
    ));
    let routes = AttachRoutes {
        events,
        ui,
        assets,
        base_path: config.base_path(),
    };

    let server = HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .configure(|cfg| attach_routes(cfg, routes.clone()))
    })
    .bind(config.bind_address())?
    .run();
    let handle = server.handle();

    context.info(&format!(
        "Portal listening on {}, reachable at {}",
        config.bind_address(),
        config.portal_url()
    ));

    let mut server_task = actix_web::rt::spawn(server);
    let mut outcome = session.subscribe();
    let timeout = tokio::time::sleep(Duration::from_secs(config.timeout));

    let exit = tokio::select! {
        changed = outcome.wait_for(Option::is_some) => match changed.ok().and_then(|o| (*o).clone()) {
            Some(SessionOutcome::Submitted(submission)) => PortalExit::Submitted(submission),
            Some(SessionOutcome::Cancelled) => PortalExit::Cancelled,
            None => PortalExit::TimedOut,
        },
        _ = timeout => PortalExit::TimedOut,
        stopped = &mut server_task => {
            return match stopped {
                Ok(Ok(())) => Err(io::Error::other("server stopped before the portal completed")),
                Ok(Err(err)) => Err(err),
                Err(err) => Err(io::Error::other(err)),
            };
        }
    };

    handle.stop(true).await;
    if let Err(err) = server_task.await {
        log::warn!("Server task ended abnormally: {err}");
    }

    Ok(exit)
}
