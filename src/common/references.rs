//! Finds network inputs and output filenames in an ffmpeg argument vector.
//!
//! Output detection is a heuristic over ffmpeg's option grammar: a bare token
//! after the first `-i` that is not the value of a known option is treated as
//! an output file. Outputs written from inside a filter graph (for example
//! `movie=`/`amovie=` sinks or `-filter_complex` expressions) are not seen,
//! and positional values of options missing from [`VALUE_FLAGS`] show up as
//! false positives.

use crate::common::error::{PipelineError, PipelineResult};
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

static LOCATOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"https?://[^\s'"]+"#).expect("locator regex is valid"));

/// Options that consume the following token. Matched against the part of the
/// flag before any stream specifier, so `-c:v:0` and `-metadata:s:a:0` hit
/// `c` and `metadata`.
const VALUE_FLAGS: &[&str] = &[
    // input
    "i",
    // codecs
    "c", "codec", "vcodec", "acodec", "scodec", "dcodec",
    // rates, sizes, quality
    "b", "ab", "vb", "r", "s", "ar", "ac", "aq", "aspect", "maxrate", "minrate",
    "bufsize", "crf", "qp", "q", "qscale", "g", "keyint_min", "bf", "preset",
    "tune", "profile", "level", "pix_fmt", "sample_fmt", "channel_layout",
    "threads", "x264-params", "x265-params", "svtav1-params", "strict",
    // filters
    "vf", "af", "filter", "filter_complex", "lavfi", "filter_script",
    "filter_complex_script",
    // metadata and mapping
    "metadata", "map", "map_metadata", "map_chapters", "disposition", "tag",
    // timing
    "ss", "sseof", "t", "to", "itsoffset", "stream_loop", "frames", "vframes",
    "aframes", "fps_mode", "vsync", "async",
    // formats and muxers
    "f", "movflags", "hls_time", "hls_list_size", "hls_segment_filename",
    "hls_playlist_type", "hls_flags", "segment_time", "segment_format",
    "start_number", "avoid_negative_ts", "loglevel", "v", "progress",
    "max_muxing_queue_size",
    // encoder tuning
    "sc_threshold", "force_key_frames", "pass", "passlogfile", "deadline",
    "cpu-used", "row-mt", "tile-columns",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenClass {
    Flag,
    FlagValue,
    InputReference,
    OutputReference,
    Positional,
}

/// Argument vector with one classification per token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgumentVector {
    tokens: Vec<String>,
    classes: Vec<TokenClass>,
}

fn consumes_value(flag: &str) -> bool {
    let name = flag.trim_start_matches('-');
    let base = name.split(':').next().unwrap_or(name);
    VALUE_FLAGS.contains(&base)
}

fn is_stream_label(token: &str) -> bool {
    token.starts_with('[') && token.ends_with(']')
}

fn looks_like_output(token: &str) -> bool {
    !token.starts_with('-')
        && !is_stream_label(token)
        && !token.contains('=')
        && !token.contains("://")
}

impl ArgumentVector {
    pub fn new(tokens: Vec<String>) -> Self {
        let classes = classify(&tokens);
        Self { tokens, classes }
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// Ordered, de-duplicated `http(s)://` locators found anywhere in the vector.
    pub fn locators(&self) -> Vec<String> {
        find_locators(&self.tokens)
    }

    /// Output filenames as declared by the user.
    pub fn outputs(&self) -> Vec<String> {
        self.tokens
            .iter()
            .zip(&self.classes)
            .filter(|(_, class)| **class == TokenClass::OutputReference)
            .map(|(token, _)| token.clone())
            .collect()
    }

    /// Replaces every downloaded locator with its local path.
    pub fn rewrite_inputs(&mut self, local: &HashMap<String, PathBuf>) {
        // Longest first, so a locator that prefixes another cannot clobber it.
        let mut entries: Vec<_> = local.iter().collect();
        entries.sort_by(|a, b| b.0.len().cmp(&a.0.len()));

        for token in &mut self.tokens {
            for (url, path) in &entries {
                if token.contains(url.as_str()) {
                    *token = token.replace(url.as_str(), &path.to_string_lossy());
                }
            }
        }
    }

    /// Points every output at `outputs_dir`, keeping only the file name so the
    /// binary cannot write outside the workspace.
    /// Two outputs that reduce to the same file name are rejected.
    pub fn rewrite_outputs(&mut self, outputs_dir: &Path) -> PipelineResult<()> {
        let mut seen = HashSet::new();
        for (token, class) in self.tokens.iter_mut().zip(&self.classes) {
            if *class != TokenClass::OutputReference {
                continue;
            }
            let name = Path::new(token.as_str())
                .file_name()
                .ok_or_else(|| PipelineError::parse(format!("invalid output name '{}'", token)))?
                .to_os_string();
            if !seen.insert(name.clone()) {
                return Err(PipelineError::parse(format!(
                    "output '{}' collides with another output named '{}'",
                    token,
                    name.to_string_lossy()
                )));
            }
            *token = outputs_dir.join(&name).to_string_lossy().into_owned();
        }
        Ok(())
    }
}

pub fn find_locators(tokens: &[String]) -> Vec<String> {
    let mut seen = Vec::new();
    for token in tokens {
        for m in LOCATOR_RE.find_iter(token) {
            let url = m.as_str().to_string();
            if !seen.contains(&url) {
                seen.push(url);
            }
        }
    }
    seen
}

pub fn classify(tokens: &[String]) -> Vec<TokenClass> {
    let mut classes = Vec::with_capacity(tokens.len());
    let mut seen_input = false;
    let mut pending_value: Option<bool> = None;

    for token in tokens {
        if let Some(is_input) = pending_value.take() {
            if is_input {
                seen_input = true;
                classes.push(TokenClass::InputReference);
            } else {
                classes.push(TokenClass::FlagValue);
            }
            continue;
        }

        if token.starts_with('-') && token.len() > 1 {
            if consumes_value(token) {
                pending_value = Some(token == "-i");
            }
            classes.push(TokenClass::Flag);
        } else if seen_input && looks_like_output(token) {
            classes.push(TokenClass::OutputReference);
        } else {
            classes.push(TokenClass::Positional);
        }
    }

    classes
}
