use actix_web::{web, Scope};

use crate::handlers::{books_config, favorites_config, health_check};

/// Configure all routes for the API
pub fn api_routes() -> Scope {
    web::scope("/api")
        .service(health_check)
        .configure(books_config)
        .configure(favorites_config)
}
