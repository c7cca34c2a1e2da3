use actix_web::{delete, error, get, middleware, post, put, web, App, HttpRequest, HttpResponse,
    HttpServer, Responder};
use chrono::{NaiveDateTime, Utc};
use regex::Regex;
use serde::Serialize;

use interview_slots::coordinator;
use interview_slots::error::CoreError;
use interview_slots::models::{BookSlotRequest, JoinWaitlistRequest, RescheduleRequest, SlotRequest};
use interview_slots::slots;
use interview_slots::store::pg::PgStore;
use interview_slots::waitlist;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Identity headers filled in by the upstream auth layer after decoding the
/// bearer credential. The core only ever sees these opaque ids.
const CANDIDATE_HEADER: &str = "x-candidate-id";
const RECRUITER_HEADER: &str = "x-recruiter-id";

#[derive(Debug, Serialize)]
struct Res {
    success: bool,
    message: String,
}

fn ok_data<T: Serialize>(data: T) -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({ "success": true, "data": data }))
}

fn created_data<T: Serialize>(data: T) -> HttpResponse {
    HttpResponse::Created().json(serde_json::json!({ "success": true, "data": data }))
}

fn ok_message(message: &str) -> HttpResponse {
    HttpResponse::Ok().json(Res {
        success: true,
        message: message.to_owned(),
    })
}

fn bad_request(message: &str) -> HttpResponse {
    HttpResponse::BadRequest().json(Res {
        success: false,
        message: message.to_owned(),
    })
}

fn fail(err: &CoreError) -> HttpResponse {
    if err.status().is_server_error() {
        log::error!("request failed: {:?}", err);
    }
    HttpResponse::build(err.status()).json(Res {
        success: false,
        message: err.to_string(),
    })
}

fn identity(req: &HttpRequest, header: &str) -> Result<String, HttpResponse> {
    let re = Regex::new(r"^[a-zA-Z0-9_-]+$").unwrap();
    match req.headers().get(header).and_then(|v| v.to_str().ok()) {
        Some(v) if re.captures(v).is_some() => Ok(v.to_owned()),
        _ => Err(HttpResponse::Unauthorized().json(Res {
            success: false,
            message: format!("missing or malformed {} header", header),
        })),
    }
}

/// Listing endpoints accept either role.
fn any_identity(req: &HttpRequest) -> Result<String, HttpResponse> {
    identity(req, CANDIDATE_HEADER).or_else(|_| identity(req, RECRUITER_HEADER))
}

fn parse_time(value: &str, field: &str) -> Result<NaiveDateTime, HttpResponse> {
    NaiveDateTime::parse_from_str(value, TIME_FORMAT)
        .map_err(|_| bad_request(&format!("{} must use the {} format", field, TIME_FORMAT)))
}

#[post("/slots")]
async fn add_slot(
    store: web::Data<PgStore>,
    req: HttpRequest,
    form: web::Json<SlotRequest>,
) -> actix_web::Result<impl Responder> {
    let recruiter_id = match identity(&req, RECRUITER_HEADER) {
        Ok(id) => id,
        Err(resp) => return Ok(resp),
    };

    let re = Regex::new(r"^[a-zA-Z0-9 ]+$").unwrap();
    if re.captures(&form.role).is_none() {
        return Ok(bad_request(
            "role should be an alphanumeric string; spaces are the only special character allowed",
        ));
    }

    let start_time = match parse_time(&form.start_time, "start_time") {
        Ok(t) => t,
        Err(resp) => return Ok(resp),
    };
    let end_time = match parse_time(&form.end_time, "end_time") {
        Ok(t) => t,
        Err(resp) => return Ok(resp),
    };

    let result = web::block(move || {
        slots::create_slot(
            store.get_ref(),
            &recruiter_id,
            &form.role,
            start_time,
            end_time,
            form.capacity,
        )
    })
    .await?;

    Ok(match result {
        Ok(slot) => created_data(slot),
        Err(e) => fail(&e),
    })
}

#[get("/slots")]
async fn get_slots(
    store: web::Data<PgStore>,
    req: HttpRequest,
) -> actix_web::Result<impl Responder> {
    if let Err(resp) = any_identity(&req) {
        return Ok(resp);
    }

    let result = web::block(move || slots::list_slots(store.get_ref())).await?;

    Ok(match result {
        Ok(listing) => ok_data(listing),
        Err(e) => fail(&e),
    })
}

#[put("/slots/{slot_id}/reschedule")]
async fn reschedule_slot(
    store: web::Data<PgStore>,
    req: HttpRequest,
    path: web::Path<i32>,
    form: web::Json<RescheduleRequest>,
) -> actix_web::Result<impl Responder> {
    let recruiter_id = match identity(&req, RECRUITER_HEADER) {
        Ok(id) => id,
        Err(resp) => return Ok(resp),
    };
    let slot_id = path.into_inner();

    let start_time = match parse_time(&form.start_time, "start_time") {
        Ok(t) => t,
        Err(resp) => return Ok(resp),
    };
    let end_time = match parse_time(&form.end_time, "end_time") {
        Ok(t) => t,
        Err(resp) => return Ok(resp),
    };

    let result = web::block(move || {
        slots::reschedule_slot(
            store.get_ref(),
            slot_id,
            &recruiter_id,
            start_time,
            end_time,
            Utc::now().naive_utc(),
        )
    })
    .await?;

    Ok(match result {
        Ok(slot) => ok_data(slot),
        Err(e) => fail(&e),
    })
}

#[delete("/slots/{slot_id}")]
async fn delete_slot(
    store: web::Data<PgStore>,
    req: HttpRequest,
    path: web::Path<i32>,
) -> actix_web::Result<impl Responder> {
    let recruiter_id = match identity(&req, RECRUITER_HEADER) {
        Ok(id) => id,
        Err(resp) => return Ok(resp),
    };
    let slot_id = path.into_inner();

    let result =
        web::block(move || slots::delete_slot(store.get_ref(), slot_id, &recruiter_id)).await?;

    Ok(match result {
        Ok(()) => ok_message("slot deleted successfully"),
        Err(e) => fail(&e),
    })
}

#[post("/bookings")]
async fn book_slot(
    store: web::Data<PgStore>,
    req: HttpRequest,
    form: web::Json<BookSlotRequest>,
) -> actix_web::Result<impl Responder> {
    let candidate_id = match identity(&req, CANDIDATE_HEADER) {
        Ok(id) => id,
        Err(resp) => return Ok(resp),
    };

    let result = web::block(move || {
        coordinator::create_booking(
            store.get_ref(),
            form.slot_id,
            &candidate_id,
            form.idempotency_key.as_deref(),
        )
    })
    .await?;

    Ok(match result {
        Ok(booking) => created_data(booking),
        Err(e) => fail(&e),
    })
}

#[delete("/bookings/{booking_id}")]
async fn cancel_booking(
    store: web::Data<PgStore>,
    req: HttpRequest,
    path: web::Path<i32>,
) -> actix_web::Result<impl Responder> {
    let candidate_id = match identity(&req, CANDIDATE_HEADER) {
        Ok(id) => id,
        Err(resp) => return Ok(resp),
    };
    let booking_id = path.into_inner();

    let result =
        web::block(move || coordinator::cancel_booking(store.get_ref(), booking_id, &candidate_id))
            .await?;

    Ok(match result {
        Ok(outcome) => ok_data(outcome),
        Err(e) => fail(&e),
    })
}

#[get("/bookings/my-bookings")]
async fn get_my_bookings(
    store: web::Data<PgStore>,
    req: HttpRequest,
) -> actix_web::Result<impl Responder> {
    let candidate_id = match identity(&req, CANDIDATE_HEADER) {
        Ok(id) => id,
        Err(resp) => return Ok(resp),
    };

    let result =
        web::block(move || coordinator::bookings_by_candidate(store.get_ref(), &candidate_id))
            .await?;

    Ok(match result {
        Ok(listing) => ok_data(listing),
        Err(e) => fail(&e),
    })
}

#[post("/waitlist")]
async fn join_waitlist(
    store: web::Data<PgStore>,
    req: HttpRequest,
    form: web::Json<JoinWaitlistRequest>,
) -> actix_web::Result<impl Responder> {
    let candidate_id = match identity(&req, CANDIDATE_HEADER) {
        Ok(id) => id,
        Err(resp) => return Ok(resp),
    };

    let result =
        web::block(move || waitlist::join_waitlist(store.get_ref(), form.slot_id, &candidate_id))
            .await?;

    Ok(match result {
        Ok(entry) => created_data(entry),
        Err(e) => fail(&e),
    })
}

#[delete("/waitlist/{slot_id}")]
async fn leave_waitlist(
    store: web::Data<PgStore>,
    req: HttpRequest,
    path: web::Path<i32>,
) -> actix_web::Result<impl Responder> {
    let candidate_id = match identity(&req, CANDIDATE_HEADER) {
        Ok(id) => id,
        Err(resp) => return Ok(resp),
    };
    let slot_id = path.into_inner();

    let result =
        web::block(move || waitlist::leave_waitlist(store.get_ref(), slot_id, &candidate_id))
            .await?;

    Ok(match result {
        Ok(()) => ok_message("left waitlist successfully"),
        Err(e) => fail(&e),
    })
}

#[get("/waitlist/my-waitlist")]
async fn get_my_waitlist(
    store: web::Data<PgStore>,
    req: HttpRequest,
) -> actix_web::Result<impl Responder> {
    let candidate_id = match identity(&req, CANDIDATE_HEADER) {
        Ok(id) => id,
        Err(resp) => return Ok(resp),
    };

    let result =
        web::block(move || waitlist::waitlist_for_candidate(store.get_ref(), &candidate_id))
            .await?;

    Ok(match result {
        Ok(listing) => ok_data(listing),
        Err(e) => fail(&e),
    })
}

#[get("/waitlist/{slot_id}")]
async fn get_slot_waitlist(
    store: web::Data<PgStore>,
    req: HttpRequest,
    path: web::Path<i32>,
) -> actix_web::Result<impl Responder> {
    if let Err(resp) = any_identity(&req) {
        return Ok(resp);
    }
    let slot_id = path.into_inner();

    let result = web::block(move || waitlist::waitlist_for_slot(store.get_ref(), slot_id)).await?;

    Ok(match result {
        Ok(listing) => ok_data(listing),
        Err(e) => fail(&e),
    })
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    // initialize the pool outside of `HttpServer::new` so that it is shared
    // across all workers
    let store = web::Data::new(PgStore::from_env());

    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".to_owned());
    log::info!("starting HTTP server at http://{}", bind_addr);

    HttpServer::new(move || {
        App::new()
            .app_data(store.clone())
            .wrap(middleware::Logger::default())
            .app_data(web::JsonConfig::default().error_handler(|err, _req| {
                let detail = err.to_string();
                let response = match err {
                    error::JsonPayloadError::ContentType => {
                        HttpResponse::UnsupportedMediaType().body("Unsupported Media Type")
                    }
                    error::JsonPayloadError::Deserialize(ref err) => bad_request(&err.to_string()),
                    _ => bad_request(&detail),
                };
                error::InternalError::from_response(err, response).into()
            }))
            .service(add_slot)
            .service(get_slots)
            .service(reschedule_slot)
            .service(delete_slot)
            .service(book_slot)
            .service(get_my_bookings)
            .service(cancel_booking)
            .service(join_waitlist)
            .service(get_my_waitlist)
            .service(leave_waitlist)
            .service(get_slot_waitlist)
    })
    .bind(bind_addr)?
    .run()
    .await
}
