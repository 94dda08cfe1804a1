pub mod export;
pub mod health;
pub mod index;
pub mod sync;
pub mod upload;
