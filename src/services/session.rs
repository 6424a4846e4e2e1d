//! In-process portal session: collects submissions, cancellations and uploads.
use std::collections::{BTreeMap, HashMap};

use actix_multipart::form::MultipartForm;
use actix_web::dev::Payload;
use actix_web::http::Method;
use actix_web::{FromRequest, HttpRequest, HttpResponse, web};
use futures_util::future::LocalBoxFuture;
use parking_lot::Mutex;
use serde::Serialize;
use tempfile::NamedTempFile;
use tokio::sync::watch;
use uuid::Uuid;

use crate::domain::fields::Fields;
use crate::forms::main::UploadFileForm;
use crate::routes::{PortalEventHandler, preflight};

/// Values collected from a submitted portal.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Submission {
    /// Submitted values per field label, in form order.
    pub values: BTreeMap<String, Vec<String>>,
    /// Original names of the files uploaded per field label.
    pub uploads: BTreeMap<String, Vec<String>>,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum SessionOutcome {
    Submitted(Submission),
    Cancelled,
}

struct StoredUpload {
    label: String,
    file_name: String,
    // Held so the temp file lives as long as the session.
    _file: NamedTempFile,
}

#[derive(Serialize)]
struct UploadCreated {
    id: String,
}

/// Default [`PortalEventHandler`]; the first submit or cancel wins.
pub struct PortalSession {
    fields: Fields,
    uploads: Mutex<HashMap<Uuid, StoredUpload>>,
    outcome: watch::Sender<Option<SessionOutcome>>,
}

impl PortalSession {
    pub fn new(fields: Fields) -> Self {
        let (outcome, _) = watch::channel(None);
        Self {
            fields,
            uploads: Mutex::new(HashMap::new()),
            outcome,
        }
    }

    /// Receiver notified once the session reaches an outcome.
    pub fn subscribe(&self) -> watch::Receiver<Option<SessionOutcome>> {
        self.outcome.subscribe()
    }

    pub fn outcome(&self) -> Option<SessionOutcome> {
        self.outcome.borrow().clone()
    }

    fn is_finished(&self) -> bool {
        self.outcome.borrow().is_some()
    }

    fn finish(&self, outcome: SessionOutcome) -> bool {
        self.outcome.send_if_modified(|current| {
            if current.is_some() {
                return false;
            }
            *current = Some(outcome);
            true
        })
    }

    pub fn upload_count(&self) -> usize {
        self.uploads.lock().len()
    }

    /// Group form pairs per known label and check required fields.
    fn collect(&self, pairs: Vec<(String, String)>) -> Result<Submission, String> {
        let mut submission = Submission::default();
        for (label, value) in pairs {
            if self.fields.get(&label).is_none() {
                log::warn!("Ignoring value for unknown field `{label}`");
                continue;
            }
            submission.values.entry(label).or_default().push(value);
        }
        for upload in self.uploads.lock().values() {
            submission
                .uploads
                .entry(upload.label.clone())
                .or_default()
                .push(upload.file_name.clone());
        }

        for field in self.fields.iter().filter(|f| f.properties.required) {
            let has_value = submission
                .values
                .get(&field.label)
                .is_some_and(|values| values.iter().any(|v| !v.trim().is_empty()));
            let has_upload = submission.uploads.contains_key(&field.label);
            if !has_value && !has_upload {
                return Err(field.label.clone());
            }
        }
        Ok(submission)
    }
}

fn conflict() -> HttpResponse {
    HttpResponse::Conflict().body("The portal is no longer accepting input")
}

impl PortalEventHandler for PortalSession {
    fn submit(&self, req: HttpRequest, mut payload: Payload) -> LocalBoxFuture<'_, HttpResponse> {
        Box::pin(async move {
            let pairs = match web::Form::<Vec<(String, String)>>::from_request(&req, &mut payload)
                .await
            {
                Ok(form) => form.into_inner(),
                Err(err) => return HttpResponse::BadRequest().body(err.to_string()),
            };
            if self.is_finished() {
                return conflict();
            }

            let submission = match self.collect(pairs) {
                Ok(submission) => submission,
                Err(label) => {
                    return HttpResponse::BadRequest()
                        .body(format!("Field `{label}` is required"));
                }
            };
            if self.finish(SessionOutcome::Submitted(submission)) {
                log::info!("Portal submitted");
                HttpResponse::Ok().finish()
            } else {
                conflict()
            }
        })
    }

    fn cancel(&self, _req: HttpRequest) -> LocalBoxFuture<'_, HttpResponse> {
        Box::pin(async move {
            if self.finish(SessionOutcome::Cancelled) {
                log::info!("Portal cancelled");
                HttpResponse::Ok().finish()
            } else {
                conflict()
            }
        })
    }

    fn upload(&self, req: HttpRequest, mut payload: Payload) -> LocalBoxFuture<'_, HttpResponse> {
        Box::pin(async move {
            if req.method() == Method::OPTIONS {
                return preflight("POST, OPTIONS");
            }
            if self.is_finished() {
                return conflict();
            }

            let MultipartForm(form) =
                match MultipartForm::<UploadFileForm>::from_request(&req, &mut payload).await {
                    Ok(form) => form,
                    Err(err) => return HttpResponse::BadRequest().body(err.to_string()),
                };

            let label = form.label.0;
            let accepts_files = self
                .fields
                .get(&label)
                .is_some_and(|field| field.properties.field_type.is_upload());
            if !accepts_files {
                return HttpResponse::BadRequest()
                    .body(format!("Field `{label}` does not accept uploads"));
            }

            let id = Uuid::new_v4();
            let file_name = form
                .file
                .file_name
                .unwrap_or_else(|| format!("upload-{id}"));
            log::debug!("Stored upload {id} for field `{label}`");
            self.uploads.lock().insert(
                id,
                StoredUpload {
                    label,
                    file_name,
                    _file: form.file.file,
                },
            );

            HttpResponse::Ok().json(UploadCreated { id: id.to_string() })
        })
    }

    fn reset_upload(
        &self,
        req: HttpRequest,
        upload_id: String,
    ) -> LocalBoxFuture<'_, HttpResponse> {
        Box::pin(async move {
            if req.method() == Method::OPTIONS {
                return preflight("DELETE, OPTIONS");
            }
            let Ok(id) = Uuid::parse_str(&upload_id) else {
                return HttpResponse::BadRequest().body("Invalid upload id");
            };
            match self.uploads.lock().remove(&id) {
                Some(_) => HttpResponse::NoContent().finish(),
                None => HttpResponse::NotFound().finish(),
            }
        })
    }
}
