//! Configuration management for Prashna Server

use serde::Deserialize;
use std::env;
use std::path::PathBuf;

/// Character whitelist handed to the recognition engine: Latin and
/// Devanagari digits plus the punctuation and math symbols found on SEE
/// exam papers.
pub const DEFAULT_CHAR_WHITELIST: &str =
    "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789०१२३४५६७८९.,()[]{}+-=<>∠∑π×÷";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub recognizer: RecognizerConfig,
    pub correction: CorrectionConfig,
    pub templates: TemplatesConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
}

/// Recognition engine parameters.
///
/// These are deployment constants, not per-request flags: the language set,
/// page-segmentation mode, and character whitelist are fixed for the kind
/// of paper this server digitizes.
#[derive(Debug, Clone, Deserialize)]
pub struct RecognizerConfig {
    pub tesseract_path: String,
    pub languages: String,
    pub page_seg_mode: u8,
    pub char_whitelist: String,
    pub tessdata_dir: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CorrectionConfig {
    pub base_url: String,
    pub model: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TemplatesConfig {
    /// Optional JSON file replacing the built-in diagram-position table
    pub path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 3000,
            },
            database: DatabaseConfig {
                url: "sqlite:./prashna.db".to_string(),
            },
            recognizer: RecognizerConfig {
                tesseract_path: "tesseract".to_string(),
                languages: "eng+nep+equ".to_string(),
                page_seg_mode: 6,
                char_whitelist: DEFAULT_CHAR_WHITELIST.to_string(),
                tessdata_dir: None,
            },
            correction: CorrectionConfig {
                base_url: "http://localhost:11434".to_string(),
                model: "llama3".to_string(),
                timeout_secs: 60,
            },
            templates: TemplatesConfig { path: None },
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, env::VarError> {
        let defaults = Config::default();

        Ok(Config {
            server: ServerConfig {
                host: env::var("SERVER_HOST").unwrap_or(defaults.server.host),
                port: env::var("SERVER_PORT")
                    .unwrap_or_else(|_| "3000".to_string())
                    .parse()
                    .unwrap_or(3000),
            },
            database: DatabaseConfig {
                url: env::var("DATABASE_URL").unwrap_or(defaults.database.url),
            },
            recognizer: RecognizerConfig {
                tesseract_path: env::var("TESSERACT_PATH")
                    .unwrap_or(defaults.recognizer.tesseract_path),
                languages: env::var("OCR_LANGUAGES").unwrap_or(defaults.recognizer.languages),
                page_seg_mode: env::var("OCR_PSM")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(defaults.recognizer.page_seg_mode),
                char_whitelist: env::var("OCR_CHAR_WHITELIST")
                    .unwrap_or(defaults.recognizer.char_whitelist),
                tessdata_dir: env::var("TESSDATA_DIR").ok(),
            },
            correction: CorrectionConfig {
                base_url: env::var("CORRECTION_URL").unwrap_or(defaults.correction.base_url),
                model: env::var("CORRECTION_MODEL").unwrap_or(defaults.correction.model),
                timeout_secs: env::var("CORRECTION_TIMEOUT_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(defaults.correction.timeout_secs),
            },
            templates: TemplatesConfig {
                path: env::var("TEMPLATES_PATH").ok().map(PathBuf::from),
            },
        })
    }
}
