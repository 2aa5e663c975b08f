// arc2zen services
// Services provide the migration pipeline: extraction, essential scoring, themes,
// the mozLz4 codec, backups, settings and the relational importer.

pub mod backup;
pub mod essential_scoring;
pub mod importer;
pub mod mozlz4;
pub mod settings_engine;
pub mod sidebar_extractor;
pub mod theme_engine;
