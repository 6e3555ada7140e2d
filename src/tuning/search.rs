//! Cross-validated exhaustive hyperparameter search
//!
//! Every (candidate, fold) pair is fitted and scored independently in
//! parallel; scores are gathered in a fixed order so the outcome does not
//! depend on scheduling.

use std::time::Instant;

use log::info;
use rayon::prelude::*;
use serde::Serialize;

use crate::config::ParamGrid;
use crate::data::table::Dataset;
use crate::error::{PipelineError, Result};
use crate::metrics::f1_macro;
use crate::model::{BoosterParams, GradientBoostedClassifier};
use crate::split::{Fold, stratified_k_fold};
use crate::tuning::grid::expand_grid;
use crate::utils::logging::{create_progress_bar, finish_progress_bar};

/// Cross-validation scores of one candidate
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandidateScore {
    /// Hyperparameters evaluated
    pub params: BoosterParams,
    /// Macro-F1 on each validation fold
    pub fold_scores: Vec<f64>,
    /// Mean of the fold scores
    pub mean_score: f64,
    /// Population standard deviation of the fold scores
    pub std_score: f64,
    /// 1-based rank by mean score; equal means share a rank
    pub rank: usize,
}

/// Outcome of a grid search
#[derive(Debug, Clone)]
pub struct GridSearchResult {
    /// Scores of every candidate, in grid order
    pub candidates: Vec<CandidateScore>,
    /// Index of the selected candidate
    pub best_index: usize,
    /// Selected configuration refitted on all rows
    pub best_model: GradientBoostedClassifier,
}

impl GridSearchResult {
    /// Scores of the selected candidate
    #[must_use]
    pub fn best(&self) -> &CandidateScore {
        &self.candidates[self.best_index]
    }
}

/// Exhaustive search over a parameter grid scored by macro-F1
#[derive(Debug, Clone)]
pub struct GridSearch {
    candidates: Vec<BoosterParams>,
    cv_folds: usize,
    seed: u64,
    show_progress: bool,
}

impl GridSearch {
    /// Prepare a search over every point of `grid`
    pub fn new(grid: &ParamGrid, cv_folds: usize, seed: u64) -> Result<Self> {
        Ok(Self {
            candidates: expand_grid(grid, seed)?,
            cv_folds,
            seed,
            show_progress: false,
        })
    }

    /// Show a progress bar while fitting
    #[must_use]
    pub const fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// Candidates in evaluation order
    #[must_use]
    pub fn candidates(&self) -> &[BoosterParams] {
        &self.candidates
    }

    /// Score every candidate and refit the best on all rows
    pub fn fit(&self, data: &Dataset, n_classes: usize) -> Result<GridSearchResult> {
        let start = Instant::now();
        let folds = stratified_k_fold(&data.labels, self.cv_folds, self.seed)?;

        let jobs: Vec<(usize, usize)> = (0..self.candidates.len())
            .flat_map(|c| (0..folds.len()).map(move |f| (c, f)))
            .collect();
        info!(
            "Evaluating {} candidates x {} folds = {} fits on {} threads",
            self.candidates.len(),
            folds.len(),
            jobs.len(),
            rayon::current_num_threads()
        );

        let pb = create_progress_bar(jobs.len() as u64, Some("Cross-validating"), self.show_progress);
        let scores: Vec<f64> = jobs
            .par_iter()
            .map(|&(candidate, fold)| {
                let score = score_fold(data, &folds[fold], n_classes, &self.candidates[candidate]);
                pb.inc(1);
                score
            })
            .collect::<Result<_>>()?;
        finish_progress_bar(&pb, Some("Cross-validation complete"));

        let mut candidates: Vec<CandidateScore> = self
            .candidates
            .iter()
            .enumerate()
            .map(|(c, params)| {
                let fold_scores = scores[c * folds.len()..(c + 1) * folds.len()].to_vec();
                let (mean_score, std_score) = mean_and_std(&fold_scores);
                CandidateScore {
                    params: *params,
                    fold_scores,
                    mean_score,
                    std_score,
                    rank: 0,
                }
            })
            .collect();
        assign_ranks(&mut candidates);

        let best_index = select_best(&candidates).ok_or_else(|| {
            PipelineError::InvalidConfig("grid search has no candidates".to_string())
        })?;
        let best = &candidates[best_index];
        info!(
            "Best candidate #{best_index} ({}) mean macro-F1 {:.4} +/- {:.4}",
            best.params, best.mean_score, best.std_score
        );

        let best_model = GradientBoostedClassifier::fit(data, n_classes, &best.params)?;
        info!("Grid search finished in {:?}", start.elapsed());

        Ok(GridSearchResult {
            candidates,
            best_index,
            best_model,
        })
    }
}

fn score_fold(data: &Dataset, fold: &Fold, n_classes: usize, params: &BoosterParams) -> Result<f64> {
    let train = data.subset(&fold.train);
    let validation = data.subset(&fold.validation);
    let model = GradientBoostedClassifier::fit(&train, n_classes, params)?;
    let predicted = model.predict_batch(&validation.features);
    Ok(f1_macro(&validation.labels, &predicted, n_classes))
}

fn mean_and_std(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n;
    (mean, variance.sqrt())
}

/// First candidate with the highest mean score
fn select_best(candidates: &[CandidateScore]) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (idx, candidate) in candidates.iter().enumerate() {
        if best.is_none_or(|b| candidate.mean_score > candidates[b].mean_score) {
            best = Some(idx);
        }
    }
    best
}

/// Rank by descending mean; ties share the lowest rank
fn assign_ranks(candidates: &mut [CandidateScore]) {
    let means: Vec<f64> = candidates.iter().map(|c| c.mean_score).collect();
    for (idx, candidate) in candidates.iter_mut().enumerate() {
        candidate.rank = 1 + means
            .iter()
            .enumerate()
            .filter(|&(other, &m)| other != idx && m > means[idx])
            .count();
    }
}
