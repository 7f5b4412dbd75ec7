//! Arg-max reduction of a model's raw output to one labelled prediction.
//!
//! Both output conventions a classifier can expose, a positional score
//! vector paired with a [`ClassLabelTable`] and a named label-to-score
//! sequence, are adapted into the same stream of [`ScoredLabel`]s. The
//! selection itself lives in [`argmax`] and [`rank`] only.

use std::cmp::Ordering;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{ClassifyError, Result};
use crate::postprocess::labels::ClassLabelTable;
use crate::tensor::Tensor;

/// The winning class of one request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub label: String,
    /// The model's raw score for `label`. Only a probability when the model
    /// itself ends in a softmax; no rescaling happens here.
    pub confidence: f32,
    /// Position in the output vector, for positional outputs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_index: Option<usize>,
}

/// One candidate in an output distribution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredLabel<'a> {
    pub label: &'a str,
    pub score: f32,
    pub index: Option<usize>,
}

impl ScoredLabel<'_> {
    fn into_result(self) -> ClassificationResult {
        ClassificationResult {
            label: self.label.to_owned(),
            confidence: self.score,
            class_index: self.index,
        }
    }
}

/// Pairs each score with its label.
///
/// Fails with `LabelIndexOutOfRange` when there are more scores than labels;
/// a longer label table is fine.
pub fn positional<'a>(
    scores: &'a [f32],
    labels: &'a ClassLabelTable,
) -> Result<impl Iterator<Item = ScoredLabel<'a>> + 'a> {
    if scores.len() > labels.len() {
        return Err(ClassifyError::LabelIndexOutOfRange {
            index: labels.len(),
            labels: labels.len(),
        });
    }
    Ok(scores
        .iter()
        .zip(labels.as_slice())
        .enumerate()
        .map(|(i, (&score, label))| ScoredLabel {
            label: label.as_str(),
            score,
            index: Some(i),
        }))
}

/// Adapts an already-named output. Iteration order defines which label wins
/// a tie, so pass an ordered collection.
pub fn named<'a, S>(pairs: &'a [(S, f32)]) -> impl Iterator<Item = ScoredLabel<'a>> + 'a
where
    S: AsRef<str>,
{
    pairs.iter().map(|(label, score)| ScoredLabel {
        label: label.as_ref(),
        score: *score,
        index: None,
    })
}

/// Single-pass arg-max.
///
/// A candidate replaces the current best only when its score is strictly
/// greater, so the first of several equal maxima wins. NaN scores never win.
/// An input with no comparable score is an `EmptyPrediction`.
pub fn argmax<'a, I>(scored: I) -> Result<ClassificationResult>
where
    I: IntoIterator<Item = ScoredLabel<'a>>,
{
    let mut best: Option<ScoredLabel<'a>> = None;
    for candidate in scored {
        let replaces = match &best {
            None => !candidate.score.is_nan(),
            Some(current) => candidate.score > current.score,
        };
        if replaces {
            best = Some(candidate);
        }
    }
    best.map(ScoredLabel::into_result)
        .ok_or(ClassifyError::EmptyPrediction)
}

/// The `k` best candidates, highest first, with the same tie rule as
/// [`argmax`]. `k` beyond the candidate count is clamped.
pub fn rank<'a, I>(scored: I, k: usize) -> Result<Vec<ClassificationResult>>
where
    I: IntoIterator<Item = ScoredLabel<'a>>,
{
    if k == 0 {
        return Err(ClassifyError::config("top-k must be at least 1"));
    }
    let mut candidates: Vec<ScoredLabel<'a>> =
        scored.into_iter().filter(|c| !c.score.is_nan()).collect();
    if candidates.is_empty() {
        return Err(ClassifyError::EmptyPrediction);
    }
    // Stable sort keeps earlier candidates ahead on equal scores. IEEE
    // equality, not total order, so -0.0 and 0.0 tie as they do in argmax.
    candidates.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    Ok(candidates
        .into_iter()
        .take(k)
        .map(ScoredLabel::into_result)
        .collect())
}

/// Interprets positional classifier outputs against a shared label table.
#[derive(Debug, Clone)]
pub struct ResultExtractor {
    labels: Arc<ClassLabelTable>,
}

impl ResultExtractor {
    pub fn new(labels: Arc<ClassLabelTable>) -> Self {
        ResultExtractor { labels }
    }

    pub fn labels(&self) -> &Arc<ClassLabelTable> {
        &self.labels
    }

    pub fn classify(&self, output: &Tensor) -> Result<ClassificationResult> {
        self.classify_scores(output.class_scores()?)
    }

    pub fn classify_scores(&self, scores: &[f32]) -> Result<ClassificationResult> {
        argmax(positional(scores, &self.labels)?)
    }

    pub fn top_k(&self, output: &Tensor, k: usize) -> Result<Vec<ClassificationResult>> {
        rank(positional(output.class_scores()?, &self.labels)?, k)
    }

    /// Named outputs carry their own labels, so the table is not consulted.
    pub fn classify_named<S: AsRef<str>>(&self, pairs: &[(S, f32)]) -> Result<ClassificationResult> {
        argmax(named(pairs))
    }
}

/// One-shot form of [`ResultExtractor::classify`].
pub fn classify(output: &Tensor, labels: &ClassLabelTable) -> Result<ClassificationResult> {
    argmax(positional(output.class_scores()?, labels)?)
}
