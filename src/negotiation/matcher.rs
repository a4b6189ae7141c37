//! Media type matching.
//!
//! # Responsibilities
//! - Score each candidate media type against the request's `Accept` ranges
//! - Select the single best candidate, or none
//!
//! # Design Decisions
//! - The most specific matching range decides a candidate's quality
//! - `q=0` on the deciding range is a hard exclusion
//! - Ranking: quality, then specificity, then header order, then candidate order
//! - Pure function: no I/O, no errors

use std::cmp::Ordering;

use axum::http::HeaderMap;

use crate::negotiation::accept::{AcceptHeader, MediaRange};

/// How well one candidate satisfies the header.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Priority {
    quality: f32,
    specificity: u8,
    header_index: usize,
    candidate_index: usize,
}

impl Priority {
    fn rank(&self, other: &Self) -> Ordering {
        other
            .quality
            .total_cmp(&self.quality)
            .then(other.specificity.cmp(&self.specificity))
            .then(self.header_index.cmp(&other.header_index))
            .then(self.candidate_index.cmp(&other.candidate_index))
    }
}

/// Matches a request's acceptable media types against offered candidates.
#[derive(Debug, Clone)]
pub struct MediaTypeMatcher {
    accept: AcceptHeader,
}

impl MediaTypeMatcher {
    /// Matcher for an already parsed header.
    pub fn new(accept: AcceptHeader) -> Self {
        Self { accept }
    }

    /// Matcher for a request's `Accept` header lines.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        Self::new(AcceptHeader::from_headers(headers))
    }

    /// Return the best candidate, or `None` if nothing is acceptable.
    pub fn best<'a, I>(&self, candidates: I) -> Option<&'a str>
    where
        I: IntoIterator<Item = &'a str>,
    {
        self.ranked(candidates).into_iter().next()
    }

    /// All acceptable candidates, best first.
    pub fn ranked<'a, I>(&self, candidates: I) -> Vec<&'a str>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut scored: Vec<(&'a str, Priority)> = candidates
            .into_iter()
            .enumerate()
            .filter_map(|(index, candidate)| {
                let parsed = MediaRange::parse(candidate, index)?;
                self.priority(&parsed).map(|p| (candidate, p))
            })
            .filter(|(_, p)| p.quality > 0.0)
            .collect();

        scored.sort_by(|(_, a), (_, b)| a.rank(b));
        scored.into_iter().map(|(candidate, _)| candidate).collect()
    }

    fn priority(&self, candidate: &MediaRange) -> Option<Priority> {
        let mut best: Option<Priority> = None;

        for range in self.accept.ranges() {
            let Some(specificity) = range.specificity(candidate) else {
                continue;
            };
            let current = Priority {
                quality: range.quality,
                specificity,
                header_index: range.index,
                candidate_index: candidate.index,
            };
            let replace = match &best {
                None => true,
                Some(b) => specificity
                    .cmp(&b.specificity)
                    .then(range.quality.total_cmp(&b.quality))
                    .then(b.header_index.cmp(&range.index))
                    .is_gt(),
            };
            if replace {
                best = Some(current);
            }
        }

        best
    }
}

/// Pick the best media type among `candidates` for a request with `headers`.
///
/// An empty candidate list yields `None`.
pub fn best_media_type<'a, I>(headers: &HeaderMap, candidates: I) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    MediaTypeMatcher::from_headers(headers).best(candidates)
}
