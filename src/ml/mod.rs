pub mod adapter;
pub mod embedding;
pub mod encoder;
pub mod huggingface_embedder;

pub use adapter::{book_text, EmbeddingAdapter};
pub use embedding::Embedding;
pub use encoder::{HashingEncoder, TextEncoder};
pub use huggingface_embedder::HuggingFaceEncoder;
