use actix_cors::Cors;
use actix_web::{error, web, App, HttpResponse, HttpServer, Result as ActixResult};
use serde::Deserialize;
use std::sync::Arc;
use syllabx_core::Error;
use syllabx_ranking::RankResponse;
use syllabx_storage::ContextHandle;
use tracing::{debug, warn};

#[derive(Deserialize)]
struct RankRequest {
    interest: String,
    limit: Option<usize>,
}

#[derive(Deserialize)]
struct ProgramDetailsRequest {
    college: Option<String>,
    program: String,
}

pub struct RestApi;

impl RestApi {
    pub async fn start(handle: Arc<ContextHandle>, port: u16) -> std::io::Result<()> {
        HttpServer::new(move || {
            let cors = Cors::default()
                .allow_any_origin()
                .allow_any_method()
                .allow_any_header()
                .max_age(3600);

            App::new()
                .wrap(cors)
                .app_data(web::Data::new(handle.clone()))
                .configure(configure)
        })
        .bind(("0.0.0.0", port))?
        .run()
        .await
    }
}

/// Route table, shared by the server and tests
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(|err, _req| {
        let body = serde_json::json!({ "error": err.to_string() });
        error::InternalError::from_response(err, HttpResponse::BadRequest().json(body)).into()
    }))
    .route("/health", web::get().to(health))
    .route("/rank", web::post().to(rank))
    .route("/program-details", web::post().to(program_details))
    .route("/reload", web::post().to(reload));
}

fn error_response(e: &Error) -> HttpResponse {
    let body = serde_json::json!({ "error": e.to_string() });
    match e {
        Error::NotFound(msg) => HttpResponse::NotFound().json(serde_json::json!({ "error": msg })),
        Error::InvalidConfig(_) => HttpResponse::BadRequest().json(body),
        _ => HttpResponse::InternalServerError().json(body),
    }
}

async fn health(handle: web::Data<Arc<ContextHandle>>) -> ActixResult<HttpResponse> {
    let context = handle.current();
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "status": "ok",
        "index": context.info(),
    })))
}

async fn rank(
    handle: web::Data<Arc<ContextHandle>>,
    req: web::Json<RankRequest>,
) -> ActixResult<HttpResponse> {
    let context = handle.current();
    match context.rank(&req.interest, req.limit) {
        Ok(ranking) => {
            debug!(results = ranking.results.len(), "rank request served");
            Ok(HttpResponse::Ok().json(RankResponse::from_ranked(&ranking.results)))
        }
        Err(e) => {
            warn!(error = %e, "rank request failed");
            Ok(error_response(&e))
        }
    }
}

async fn program_details(
    handle: web::Data<Arc<ContextHandle>>,
    req: web::Json<ProgramDetailsRequest>,
) -> ActixResult<HttpResponse> {
    let context = handle.current();
    match context.program_details(req.college.as_deref(), &req.program) {
        Ok(record) => Ok(HttpResponse::Ok().json(record)),
        Err(e) => Ok(error_response(&e)),
    }
}

/// Loading and verifying the index is blocking file I/O, so it runs off the worker thread
async fn reload(handle: web::Data<Arc<ContextHandle>>) -> ActixResult<HttpResponse> {
    let handle = Arc::clone(handle.get_ref());
    let loaded = match web::block(move || handle.reload()).await {
        Ok(loaded) => loaded,
        Err(e) => {
            warn!(error = %e, "reload task did not complete");
            return Ok(HttpResponse::InternalServerError().json(serde_json::json!({ "error": e.to_string() })));
        }
    };

    match loaded {
        Ok(context) => Ok(HttpResponse::Ok().json(serde_json::json!({
            "result": true,
            "index": context.info(),
        }))),
        Err(e) => Ok(error_response(&e)),
    }
}
