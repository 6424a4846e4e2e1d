//! Application entry point: resolve inputs, then serve the portal.
use std::sync::Arc;

use dotenvy::dotenv;

use interactive_portal::models::context::{ActionContext, GithubActionContext};
use interactive_portal::services::config::resolve;
use interactive_portal::{PortalExit, run};

#[actix_web::main]
async fn main() {
    // Load environment variables from `.env` in local development.
    dotenv().ok();
    // Initialize logger with default level INFO if not provided.
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let context = match GithubActionContext::from_env() {
        Ok(context) => Arc::new(context),
        Err(err) => {
            log::error!("Error loading inputs: {}", err);
            std::process::exit(1);
        }
    };

    // Failures are already reported through the context.
    let config = match resolve(context.as_ref()) {
        Ok(config) => config,
        Err(_) => std::process::exit(1),
    };

    match run(config, context.clone()).await {
        Ok(PortalExit::Submitted(submission)) => {
            for label in submission.values.keys().chain(submission.uploads.keys()) {
                context.info(&format!("Received input for `{label}`"));
            }
        }
        Ok(PortalExit::Cancelled) => {
            context.warning("The portal was cancelled");
            std::process::exit(1);
        }
        Ok(PortalExit::TimedOut) => {
            context.warning("The portal timed out before any input was submitted");
            std::process::exit(1);
        }
        Err(err) => {
            log::error!("Error running portal: {}", err);
            std::process::exit(1);
        }
    }
}
