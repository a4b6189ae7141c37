//! `Accept` header parsing.
//!
//! # Responsibilities
//! - Split the header into media ranges with quality values
//! - Parse candidate media types offered by handlers
//!
//! # Design Decisions
//! - Media type syntax is delegated to the `mime` crate
//! - Unparsable entries are skipped; a header with no usable entries
//!   (or no header at all) means `*/*`
//! - Entries with `q=0` are kept so they can exclude candidates

use axum::http::{header, HeaderMap};
use mime::Mime;

/// One media range from an `Accept` header, or one offered media type.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaRange {
    pub type_: String,
    pub subtype: String,
    /// Parameters other than `q`, names lowercased.
    pub params: Vec<(String, String)>,
    pub quality: f32,
    /// Position in the header (or in the candidate list).
    pub index: usize,
}

impl MediaRange {
    /// Parse a single `Accept` entry such as `text/html;level=1;q=0.5`.
    ///
    /// Returns `None` for syntactically invalid entries and for entries whose
    /// `q` parameter is not a valid qvalue.
    pub fn parse(raw: &str, index: usize) -> Option<Self> {
        let mime: Mime = raw.trim().parse().ok()?;
        let mut quality = 1.0_f32;
        let mut params = Vec::new();

        for (name, value) in mime.params() {
            let name = name.as_str().to_ascii_lowercase();
            if name == "q" {
                quality = parse_quality(value.as_str())?;
            } else {
                params.push((name, value.as_str().to_string()));
            }
        }

        Some(Self {
            type_: mime.type_().as_str().to_ascii_lowercase(),
            subtype: mime.subtype().as_str().to_ascii_lowercase(),
            params,
            quality,
            index,
        })
    }

    /// The `*/*` range.
    pub fn any() -> Self {
        Self {
            type_: "*".to_string(),
            subtype: "*".to_string(),
            params: Vec::new(),
            quality: 1.0,
            index: 0,
        }
    }

    /// Specificity of this range against `candidate`, or `None` if it does not match.
    ///
    /// Exact type scores 4, exact subtype 2, matching parameters 1.
    pub fn specificity(&self, candidate: &MediaRange) -> Option<u8> {
        let mut score = 0;

        if self.type_ == candidate.type_ {
            score |= 4;
        } else if self.type_ != "*" {
            return None;
        }

        if self.subtype == candidate.subtype {
            score |= 2;
        } else if self.subtype != "*" {
            return None;
        }

        if !self.params.is_empty() {
            let all_match = self.params.iter().all(|(name, value)| {
                candidate
                    .params
                    .iter()
                    .any(|(n, v)| n == name && v.eq_ignore_ascii_case(value))
            });
            if !all_match {
                return None;
            }
            score |= 1;
        }

        Some(score)
    }
}

/// Parse a qvalue: `0` or `1`, optionally followed by up to three decimals,
/// never above `1.000`.
fn parse_quality(raw: &str) -> Option<f32> {
    let raw = raw.trim();
    let (whole, fraction) = match raw.split_once('.') {
        Some((whole, fraction)) => (whole, fraction),
        None => (raw, ""),
    };
    if fraction.len() > 3 || !fraction.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    match whole {
        "0" if fraction.is_empty() => Some(0.0),
        "0" => raw.parse().ok(),
        "1" if fraction.bytes().all(|b| b == b'0') => Some(1.0),
        _ => None,
    }
}

/// A parsed `Accept` header.
#[derive(Debug, Clone, PartialEq)]
pub struct AcceptHeader {
    ranges: Vec<MediaRange>,
}

impl AcceptHeader {
    /// Accept anything.
    pub fn any() -> Self {
        Self {
            ranges: vec![MediaRange::any()],
        }
    }

    /// Parse a raw header value.
    pub fn parse(raw: &str) -> Self {
        let ranges: Vec<MediaRange> = raw
            .split(',')
            .filter(|part| !part.trim().is_empty())
            .enumerate()
            .filter_map(|(index, part)| MediaRange::parse(part, index))
            .collect();

        if ranges.is_empty() {
            return Self::any();
        }
        Self { ranges }
    }

    /// Read every `Accept` header line from a request.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let values: Vec<&str> = headers
            .get_all(header::ACCEPT)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .collect();

        if values.is_empty() {
            return Self::any();
        }
        Self::parse(&values.join(","))
    }

    /// Parsed ranges in header order.
    pub fn ranges(&self) -> &[MediaRange] {
        &self.ranges
    }
}
