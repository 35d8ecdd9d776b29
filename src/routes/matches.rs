use actix_web::{web, HttpResponse, Responder};
use validator::Validate;

use crate::core::{parse_profile_id, ActionSubmission};
use crate::models::{ActionResponse, Caller, ErrorResponse, RecordActionRequest};
use crate::routes::{engine_error_response, AppState};

/// Configure all match-related routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/match/action", web::post().to(record_action))
        .route("/match/list/{dog_id}", web::get().to(list_matches));
}

/// Record a like or pass
///
/// POST /match/action
///
/// Request body:
/// ```json
/// {
///   "fromDog": "uuid",
///   "toDog": "uuid",
///   "action": "like|pass"
/// }
/// ```
///
/// `match` in the response is the pair's match when both dogs have liked
/// each other, whether it was created by this request or earlier.
async fn record_action(
    state: web::Data<AppState>,
    caller: Caller,
    req: web::Json<RecordActionRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        tracing::info!("Validation failed for record_action request: {:?}", errors);
        return HttpResponse::BadRequest().json(ErrorResponse {
            error: "Validation failed".to_string(),
            message: errors.to_string(),
            status_code: 400,
        });
    }

    let submission = match ActionSubmission::try_from(&*req) {
        Ok(submission) => submission,
        Err(e) => return engine_error_response(&e),
    };

    match state.engine.submit_action(&caller, submission).await {
        Ok(outcome) => {
            tracing::info!(
                "{} -> {}: {} (match: {})",
                outcome.action.from_profile,
                outcome.action.to_profile,
                outcome.action.kind,
                outcome.matched.is_some()
            );

            HttpResponse::Ok().json(ActionResponse {
                msg: "saved".to_string(),
                action: outcome.action,
                matched: outcome.matched,
                match_created: outcome.match_created,
            })
        }
        Err(e) => engine_error_response(&e),
    }
}

/// List matches for one of the caller's dogs
///
/// GET /match/list/{dogId}
///
/// Each match carries both dog profiles.
async fn list_matches(
    state: web::Data<AppState>,
    caller: Caller,
    path: web::Path<String>,
) -> impl Responder {
    let dog_id = match parse_profile_id("dogId", &path) {
        Ok(id) => id,
        Err(e) => return engine_error_response(&e),
    };

    match state.engine.list_matches(&caller, dog_id).await {
        Ok(matches) => HttpResponse::Ok().json(matches),
        Err(e) => engine_error_response(&e),
    }
}
