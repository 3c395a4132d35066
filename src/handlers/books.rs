use crate::{error::AppError, services::MatchOrchestrator};
use actix_web::{web, HttpResponse};

pub fn books_config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/books/{isbn}").route(web::get().to(inspect_book)))
        .service(web::resource("/books/{isbn}/match").route(web::get().to(match_book)));
}

/// Book metadata plus the genre it would be filed under.
pub async fn inspect_book(
    isbn: web::Path<String>,
    orchestrator: web::Data<MatchOrchestrator>,
) -> Result<HttpResponse, AppError> {
    let preview = orchestrator.inspect(&isbn).await?;
    Ok(HttpResponse::Ok().json(preview))
}

/// Scores a book against the user's taste profile for its genre.
pub async fn match_book(
    isbn: web::Path<String>,
    orchestrator: web::Data<MatchOrchestrator>,
) -> Result<HttpResponse, AppError> {
    let result = orchestrator.evaluate(&isbn).await?;
    Ok(HttpResponse::Ok().json(result))
}
