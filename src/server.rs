use std::io::Write;

use actix_web::{App, HttpMessage, HttpRequest, HttpResponse, HttpServer, get, post, web};

use crate::error::{RequestError, RequestResult};
use crate::features;
use crate::io_struct::ErrorBody;
use crate::pipeline::InferencePipeline;
use crate::render;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Process-wide immutable state: the loaded pipeline, handed to handlers via
/// `web::Data`. Tests construct it with stub artifacts through the same path.
pub struct AppState {
    pub pipeline: InferencePipeline,
}

#[get("/health")]
pub async fn health(_req: HttpRequest, _: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().body("Ok")
}

#[get("/")]
pub async fn index() -> HttpResponse {
    html(render::landing_page().to_owned())
}

#[get("/predict")]
pub async fn predict_page() -> HttpResponse {
    html(render::landing_page().to_owned())
}

/// One endpoint, two encodings: JSON requests get a JSON response (and a
/// JSON error body on failure), anything else is treated as a form submit
/// and answered with HTML.
#[post("/predict")]
pub async fn predict(
    req: HttpRequest,
    body: web::Bytes,
    app_state: web::Data<AppState>,
) -> HttpResponse {
    if req.content_type().contains("application/json") {
        match predict_json(&app_state, &body) {
            Ok(json) => HttpResponse::Ok()
                .content_type("application/json")
                .body(json),
            Err(error) => {
                log::error!("prediction failed: {}", error);
                HttpResponse::InternalServerError().json(ErrorBody {
                    error: error.to_string(),
                })
            }
        }
    } else {
        match predict_form(&app_state, &body) {
            Ok(page) => html(page),
            Err(error) => {
                log::error!("prediction failed: {}", error);
                HttpResponse::InternalServerError()
                    .content_type("text/html; charset=utf-8")
                    .body(render::error_page(&error.to_string()))
            }
        }
    }
}

fn predict_json(state: &AppState, body: &[u8]) -> RequestResult<String> {
    let records = features::records_from_json(body)?;
    let predictions = state.pipeline.run(&records)?;
    let response = render::json_response(&predictions);
    serde_json::to_string(&response).map_err(|e| RequestError::Unhandled(e.to_string()))
}

fn predict_form(state: &AppState, body: &[u8]) -> RequestResult<String> {
    let record = features::record_from_form(body)?;
    let predictions = state.pipeline.run(std::slice::from_ref(&record))?;
    let prediction = predictions
        .first()
        .ok_or_else(|| RequestError::Unhandled("pipeline returned no prediction".to_owned()))?;
    Ok(render::result_page(&record, prediction))
}

async fn not_found() -> HttpResponse {
    HttpResponse::NotFound()
        .content_type("text/plain; charset=utf-8")
        .body("Endpoint not found")
}

fn html(page: String) -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(page)
}

/// Route table, shared between the binary and the integration tests.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(health)
        .service(index)
        .service(predict_page)
        .service(predict)
        .default_service(web::route().to(not_found));
}

// default level is info
pub fn init_logging() {
    env_logger::Builder::new()
        .format(|buf, record| {
            writeln!(
                buf,
                "{} - {} - {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.args()
            )
        })
        .filter(None, log::LevelFilter::Info)
        .init();
}

pub async fn startup(config: ServerConfig, state: AppState) -> std::io::Result<()> {
    let app_state = web::Data::new(state);

    println!("Starting server at {}:{}", config.host, config.port);

    HttpServer::new(move || {
        App::new()
            .wrap(actix_web::middleware::Logger::default())
            .app_data(app_state.clone())
            .configure(configure)
    })
    .bind((config.host, config.port))?
    .run()
    .await
}
