mod state;

pub use state::{AppState, ExportStore};

use crate::application::use_cases::verified_queries::VerifyOutcome;
use crate::domain::entities::ResultSet;
use actix_cors::Cors;
use actix_web::{dev::Server, get, post, web, App, HttpResponse, HttpServer, Responder};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;
use validator::Validate;

pub const EXPORT_STORE_CAPACITY: usize = 32;

#[derive(Debug, Deserialize, Validate)]
pub struct QueryRequest {
    #[serde(rename = "userQuery")]
    #[validate(length(min = 1))]
    pub user_query: String,
}

#[derive(Serialize)]
pub struct QueryResponse {
    /// The generated SQL, returned alongside data and errors alike so the
    /// caller can always show what was attempted.
    pub result: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<ResultSet>,
    /// Database error text, verbatim.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(rename = "exportToken", skip_serializing_if = "Option::is_none")]
    pub export_token: Option<Uuid>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct VerifyRequest {
    #[serde(rename = "userQuery")]
    #[validate(length(min = 1))]
    pub user_query: String,
    #[serde(rename = "sqlQuery")]
    #[validate(length(min = 1))]
    pub sql_query: String,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct ExportRequest {
    #[serde(rename = "exportToken")]
    pub export_token: Uuid,
}

#[post("/query")]
async fn query(data: web::Data<Arc<AppState>>, req: web::Json<QueryRequest>) -> impl Responder {
    if let Err(e) = req.validate() {
        return HttpResponse::BadRequest().body(e.to_string());
    }

    let generated = match data.pipeline.run(&req.user_query).await {
        Ok(generated) => generated,
        Err(e) => {
            error!(error = %e, "Query pipeline failed");
            return HttpResponse::InternalServerError().body(e.to_string());
        }
    };

    match data.executor.execute(&generated.sql).await {
        Ok(result) => {
            let export_token = data.exports.lock().unwrap().insert(result.clone());
            HttpResponse::Ok().json(QueryResponse {
                result: generated.sql,
                data: Some(result),
                error: None,
                export_token: Some(export_token),
            })
        }
        // Execution failures are data, not HTTP errors: the caller gets the
        // attempted SQL next to the database's own message.
        Err(message) => HttpResponse::Ok().json(QueryResponse {
            result: generated.sql,
            data: None,
            error: Some(message),
            export_token: None,
        }),
    }
}

#[post("/verify_query")]
async fn verify_query(
    data: web::Data<Arc<AppState>>,
    req: web::Json<VerifyRequest>,
) -> impl Responder {
    if let Err(e) = req.validate() {
        return HttpResponse::BadRequest().body(e.to_string());
    }

    match data.recorder.verify(&req.user_query, &req.sql_query).await {
        Ok(VerifyOutcome::Stored) => HttpResponse::Ok().json(MessageResponse {
            message: "Query stored successfully".to_string(),
        }),
        Ok(VerifyOutcome::Duplicate) => HttpResponse::Ok().json(MessageResponse {
            message: "Duplicate entry found. No new data added.".to_string(),
        }),
        Err(e) => {
            error!(error = %e, "Verification failed");
            HttpResponse::InternalServerError().body(e.to_string())
        }
    }
}

#[post("/export_data")]
async fn export_data(
    data: web::Data<Arc<AppState>>,
    req: web::Json<ExportRequest>,
) -> impl Responder {
    let result = data.exports.lock().unwrap().take(&req.export_token);
    let Some(result) = result else {
        return HttpResponse::NotFound().json(MessageResponse {
            message: "Unknown or already exported token".to_string(),
        });
    };

    let path = match data.exporter.write(&result) {
        Ok(path) => path,
        Err(e) => {
            error!(error = %e, "Export failed");
            return HttpResponse::InternalServerError().body(e.to_string());
        }
    };

    match std::fs::read(&path) {
        Ok(bytes) => {
            let filename = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "export.csv".to_string());
            HttpResponse::Ok()
                .content_type("text/csv")
                .insert_header((
                    "Content-Disposition",
                    format!("attachment; filename=\"{}\"", filename),
                ))
                .body(bytes)
        }
        Err(e) => {
            error!(error = %e, "Failed to read export file");
            HttpResponse::InternalServerError().body(e.to_string())
        }
    }
}

#[get("/health")]
async fn health() -> impl Responder {
    HttpResponse::Ok().json(MessageResponse {
        message: "ok".to_string(),
    })
}

pub fn start_server(state: Arc<AppState>, host: &str, port: u16) -> std::io::Result<Server> {
    let state = web::Data::new(state);
    info!(host, port, "Starting HTTP server");

    let server = HttpServer::new(move || {
        let cors = Cors::permissive(); // Allow all origins for local tool

        App::new().wrap(cors).app_data(state.clone()).service(
            web::scope("/api")
                .service(query)
                .service(verify_query)
                .service(export_data)
                .service(health),
        )
    })
    .bind((host, port))?
    .run();

    Ok(server)
}
