pub mod books;
pub mod favorites;
pub mod health;

pub use books::books_config;
pub use favorites::favorites_config;
pub use health::health_check;
