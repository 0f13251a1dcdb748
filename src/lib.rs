//! Озвучка текста по предложениям с точными таймингами:
//! синтез, сборка дорожки, субтитры, проверка и пересинхронизация.

pub mod config;
pub mod errors;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod utils;

pub use errors::{AppError, AppResult};
pub use pipeline::{LanguagePackage, NarrationPipeline, ProgressUpdate};

#[cfg(test)]
mod tests;
