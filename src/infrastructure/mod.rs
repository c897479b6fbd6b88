pub mod audio;
pub mod cache;
pub mod observability;
pub mod speech;
