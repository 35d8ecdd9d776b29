use actix_web::{web, HttpResponse, Responder};
use validator::Validate;

use crate::core::parse_profile_id;
use crate::models::{Caller, CreateDogRequest, DiscoverQuery, ErrorResponse};
use crate::routes::{engine_error_response, AppState};

/// Configure dog profile routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    // Literal segments must be registered before `/dogs/{dog_id}`
    cfg.route("/dogs/create", web::post().to(create_dog))
        .route("/dogs/mine", web::get().to(my_dogs))
        .route("/dogs/all", web::get().to(community_feed))
        .route("/dogs/discover/{dog_id}", web::get().to(discover))
        .route("/dogs/{dog_id}", web::get().to(get_dog));
}

/// POST /dogs/create
async fn create_dog(
    state: web::Data<AppState>,
    caller: Caller,
    req: web::Json<CreateDogRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        return HttpResponse::BadRequest().json(ErrorResponse {
            error: "Validation failed".to_string(),
            message: errors.to_string(),
            status_code: 400,
        });
    }

    match state.profiles.create_profile(&caller, req.into_inner()).await {
        Ok(profile) => HttpResponse::Created().json(profile),
        Err(e) => engine_error_response(&e),
    }
}

/// GET /dogs/mine
async fn my_dogs(state: web::Data<AppState>, caller: Caller) -> impl Responder {
    match state.profiles.list_owned(&caller).await {
        Ok(dogs) => HttpResponse::Ok().json(dogs),
        Err(e) => engine_error_response(&e),
    }
}

/// GET /dogs/all
async fn community_feed(state: web::Data<AppState>, _caller: Caller) -> impl Responder {
    match state.profiles.community_feed().await {
        Ok(dogs) => HttpResponse::Ok().json(dogs),
        Err(e) => engine_error_response(&e),
    }
}

/// GET /dogs/{dogId}
async fn get_dog(
    state: web::Data<AppState>,
    _caller: Caller,
    path: web::Path<String>,
) -> impl Responder {
    let dog_id = match parse_profile_id("dogId", &path) {
        Ok(id) => id,
        Err(e) => return engine_error_response(&e),
    };

    match state.profiles.get_profile(dog_id).await {
        Ok(dog) => HttpResponse::Ok().json(dog),
        Err(e) => engine_error_response(&e),
    }
}

/// Dogs to swipe on, excluding the swiping dog
///
/// GET /dogs/discover/{dogId}?page=1&limit=20
async fn discover(
    state: web::Data<AppState>,
    caller: Caller,
    path: web::Path<String>,
    query: web::Query<DiscoverQuery>,
) -> impl Responder {
    if let Err(errors) = query.validate() {
        return HttpResponse::BadRequest().json(ErrorResponse {
            error: "Validation failed".to_string(),
            message: errors.to_string(),
            status_code: 400,
        });
    }

    let dog_id = match parse_profile_id("dogId", &path) {
        Ok(id) => id,
        Err(e) => return engine_error_response(&e),
    };

    match state
        .engine
        .list_discoverable(&caller, dog_id, query.page, query.limit)
        .await
    {
        Ok(dogs) => HttpResponse::Ok().json(dogs),
        Err(e) => engine_error_response(&e),
    }
}
