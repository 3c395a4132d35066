use crate::{error::AppError, models::AddFavoriteRequest, services::MatchOrchestrator};
use actix_web::{
    web::{self, Json},
    HttpResponse,
};

pub fn favorites_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/favorites")
            .route(web::get().to(list_favorites))
            .route(web::post().to(add_favorite))
            .route(web::delete().to(clear_favorites)),
    )
    .service(web::resource("/favorites/{genre}/{isbn}").route(web::delete().to(remove_favorite)));
}

pub async fn list_favorites(orchestrator: web::Data<MatchOrchestrator>) -> HttpResponse {
    HttpResponse::Ok().json(orchestrator.overview())
}

/// Adds a book to favorites under the given genre, or its detected one.
pub async fn add_favorite(
    request: Json<AddFavoriteRequest>,
    orchestrator: web::Data<MatchOrchestrator>,
) -> Result<HttpResponse, AppError> {
    if request.isbn.trim().is_empty() {
        return Err(AppError::InvalidInput("ISBN cannot be empty".to_string()));
    }

    let added = orchestrator
        .add_favorite(&request.isbn, request.genre.as_deref())
        .await?;
    Ok(HttpResponse::Created().json(added))
}

pub async fn remove_favorite(
    path: web::Path<(String, String)>,
    orchestrator: web::Data<MatchOrchestrator>,
) -> Result<HttpResponse, AppError> {
    let (genre, isbn) = path.into_inner();
    orchestrator.remove_favorite(&genre, &isbn)?;
    Ok(HttpResponse::NoContent().finish())
}

pub async fn clear_favorites(
    orchestrator: web::Data<MatchOrchestrator>,
) -> Result<HttpResponse, AppError> {
    orchestrator.clear_favorites()?;
    Ok(HttpResponse::NoContent().finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BookRecord, Isbn};
    use crate::services::testing;
    use actix_web::{http::StatusCode, test, App};
    use serde_json::json;

    fn book(isbn: &str, title: &str, categories: &[&str]) -> BookRecord {
        BookRecord {
            title: title.to_string(),
            authors: vec!["Agatha Christie".to_string()],
            description: format!("{} is a classic whodunit.", title),
            categories: categories.iter().map(|c| c.to_string()).collect(),
            isbn: Isbn::new(isbn),
            source: "OpenLibrary".to_string(),
            ..Default::default()
        }
    }

    fn catalog() -> Vec<BookRecord> {
        vec![
            book("9780062073488", "And Then There Were None", &["Mystery", "Crime"]),
            book("9780062693662", "Murder on the Orient Express", &["Detective"]),
        ]
    }

    #[actix_web::test]
    async fn test_favorites_lifecycle() {
        let dir = tempfile::tempdir().unwrap();
        let orchestrator = web::Data::new(testing::orchestrator(dir.path(), catalog()));
        let app = test::init_service(
            App::new()
                .app_data(orchestrator)
                .configure(favorites_config),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/favorites")
            .set_json(json!({"isbn": "978-0-06-207348-8"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["genre"], "Mystery");
        assert_eq!(body["books_in_genre"], 1);

        let req = test::TestRequest::post()
            .uri("/favorites")
            .set_json(json!({"isbn": "9780062073488"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CONFLICT);

        let req = test::TestRequest::post()
            .uri("/favorites")
            .set_json(json!({"isbn": "9780062693662", "genre": "Classic"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);

        let req = test::TestRequest::get().uri("/favorites").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["total_books"], 2);
        assert_eq!(body["total_genres"], 2);
        assert_eq!(body["favorites"]["Classic"][0]["title"], "Murder on the Orient Express");

        let req = test::TestRequest::delete()
            .uri("/favorites/Classic/9780062693662")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);

        let req = test::TestRequest::delete()
            .uri("/favorites/Classic/9780062693662")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let req = test::TestRequest::delete().uri("/favorites").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);

        let req = test::TestRequest::get().uri("/favorites").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["total_books"], 0);
    }

    #[actix_web::test]
    async fn test_blank_isbn_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let orchestrator = web::Data::new(testing::orchestrator(dir.path(), catalog()));
        let app = test::init_service(
            App::new()
                .app_data(orchestrator)
                .configure(favorites_config),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/favorites")
            .set_json(json!({"isbn": "  "}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
