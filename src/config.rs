use crate::Args;
use std::path::PathBuf;

/// Solver configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub image: PathBuf,
    pub preset: String,
    pub engine: Option<String>,
    #[allow(dead_code)]
    pub language: String,
    #[allow(dead_code)]
    pub tessdata_path: Option<String>,
    pub save_misses: Option<PathBuf>,
    pub json: bool,
}

impl From<Args> for Config {
    fn from(args: Args) -> Self {
        Self {
            image: args.image,
            preset: args.preset,
            engine: args.engine,
            language: args.language,
            tessdata_path: args.tessdata_path,
            save_misses: args.save_misses,
            json: args.json,
        }
    }
}
