use std::sync::Arc;

use actix_web::http::header::ContentType;
use actix_web::{HttpRequest, HttpResponse};

use crate::assets::TemplateChain;
use crate::models::config::Config;
use crate::models::context::ActionContext;
use crate::models::environment::Environment;
use crate::routes::{UiHandler, internal_error};
use crate::services::view::build_home;

/// Home page backed by the embedded template chain.
pub struct WebUi {
    config: Arc<Config>,
    context: Arc<dyn ActionContext>,
    environment: Arc<dyn Environment>,
    templates: TemplateChain,
}

impl WebUi {
    pub fn new(
        config: Arc<Config>,
        context: Arc<dyn ActionContext>,
        environment: Arc<dyn Environment>,
        templates: TemplateChain,
    ) -> Self {
        Self {
            config,
            context,
            environment,
            templates,
        }
    }
}

impl UiHandler for WebUi {
    fn home(&self, _req: &HttpRequest) -> HttpResponse {
        let run = match self.context.run_context() {
            Ok(run) => run,
            Err(err) => {
                self.context
                    .error(&format!("Unable to get action context: {err}"));
                return internal_error();
            }
        };

        let view = build_home(&self.config, run.repo_owner(), self.environment.as_ref());

        match self.templates.render_home(&view) {
            Ok(body) => HttpResponse::Ok()
                .content_type(ContentType::html())
                .body(body),
            Err(err) => {
                self.context.error(&format!("Unable to render home page: {err}"));
                internal_error()
            }
        }
    }
}
