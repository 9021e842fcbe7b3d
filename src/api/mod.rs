pub mod images;
pub mod openai;
pub mod speech;
