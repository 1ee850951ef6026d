use crate::infra::in_memory_service;
use clap::Args;
use meal_engine::config::{AppConfig, EngineSettings};
use meal_engine::error::AppError;
use meal_engine::recommendation::{
    load_catalog, FeedbackEvent, RecommendationContext, RecommendationResponse, UserProfile,
};
use serde::de::DeserializeOwned;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

#[derive(Args, Debug)]
pub(crate) struct RecommendArgs {
    /// User profile JSON document
    #[arg(long)]
    pub(crate) profile: PathBuf,
    /// Recommendation context JSON document
    #[arg(long)]
    pub(crate) context: PathBuf,
    /// Candidate catalog (.json, otherwise CSV)
    #[arg(long)]
    pub(crate) catalog: PathBuf,
    /// Optional JSON array of feedback events to fold in first
    #[arg(long)]
    pub(crate) feedback: Option<PathBuf>,
    /// Seed for the exploration sampler (falls back to ENGINE_RNG_SEED)
    #[arg(long)]
    pub(crate) seed: Option<u64>,
}

pub(crate) fn run_recommend(args: RecommendArgs) -> Result<(), AppError> {
    let response = recommend_from_files(&args)?;
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}

pub(crate) fn recommend_from_files(
    args: &RecommendArgs,
) -> Result<RecommendationResponse, AppError> {
    let engine = match args.seed {
        Some(seed) => EngineSettings {
            rng_seed: Some(seed),
        },
        None => AppConfig::load()?.engine,
    };

    let profile: UserProfile = read_json(&args.profile)?;
    let context: RecommendationContext = read_json(&args.context)?;
    let candidates = load_catalog(&args.catalog)?;
    let feedback: Vec<FeedbackEvent> = match &args.feedback {
        Some(path) => read_json(path)?,
        None => Vec::new(),
    };

    let service = in_memory_service(&engine);
    Ok(service.recommend(&profile, &context, &candidates, &feedback)?)
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, AppError> {
    let reader = BufReader::new(File::open(path)?);
    Ok(serde_json::from_reader(reader)?)
}
