pub mod export;
pub mod render;
pub mod response_types;
pub mod sync;
pub mod view;
