//! Fallback caption segmentation.
//!
//! Used when no time-coded cues are available: raw text is split into
//! readable chunks and timed from their length, then stretched so the
//! caption track spans exactly the known audio duration.

use clipcast_common::config::SegmentationConfig;
use clipcast_composition_model::caption::CaptionCue;

/// Split `text` into cues spanning exactly `total_secs`.
///
/// Each chunk gets `chars / chars_per_second` seconds, clamped to the cue
/// bounds. All durations are then scaled by one factor to fit the total and
/// clamped again. The last cue always ends at `total_secs`, so after the
/// second clamp individual cues may fall outside the bounds.
pub fn segment_text(text: &str, total_secs: f64, config: &SegmentationConfig) -> Vec<CaptionCue> {
    if !total_secs.is_finite() || total_secs <= 0.0 {
        return Vec::new();
    }

    let chunks = chunk_words(text, config);
    if chunks.is_empty() {
        return Vec::new();
    }

    let clamp = |d: f64| d.clamp(config.min_cue_secs, config.max_cue_secs);
    let cps = if config.chars_per_second > 0.0 {
        config.chars_per_second
    } else {
        1.0
    };

    let mut durations: Vec<f64> = chunks
        .iter()
        .map(|c| clamp(c.chars().count() as f64 / cps))
        .collect();

    let factor = total_secs / durations.iter().sum::<f64>();
    for d in durations.iter_mut() {
        *d = clamp(*d * factor);
    }

    // Re-clamping can break the sum again; a final exact rescale wins.
    let sum: f64 = durations.iter().sum();
    let correction = total_secs / sum;
    let last = durations.len() - 1;
    let mut cursor = 0.0;
    let mut cues = Vec::with_capacity(chunks.len());
    for (i, (chunk, d)) in chunks.into_iter().zip(durations).enumerate() {
        let end = if i == last {
            total_secs
        } else {
            cursor + d * correction
        };
        cues.push(CaptionCue::new(cursor, end, chunk));
        cursor = end;
    }

    tracing::debug!(
        cues = cues.len(),
        total_secs,
        factor,
        "Segmented caption text"
    );

    cues
}

/// Greedy word packing up to `max_chars`. A final chunk shorter than
/// `min_chars` borrows trailing words from its predecessor while both stay
/// within `max_chars`; the cap wins over the minimum. Only a single word
/// longer than `max_chars` can exceed the cap.
fn chunk_words(text: &str, config: &SegmentationConfig) -> Vec<String> {
    let mut packed: Vec<Vec<&str>> = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for word in text.split_whitespace() {
        if !current.is_empty() && joined_len(&current) + 1 + char_len(word) > config.max_chars {
            packed.push(std::mem::take(&mut current));
        }
        current.push(word);
    }
    if !current.is_empty() {
        packed.push(current);
    }

    if let [.., prev, tail] = packed.as_mut_slice() {
        while joined_len(tail) < config.min_chars && prev.len() > 1 {
            let Some(&word) = prev.last() else { break };
            if joined_len(tail) + 1 + char_len(word) > config.max_chars {
                break;
            }
            prev.pop();
            tail.insert(0, word);
        }
    }

    packed.into_iter().map(|words| words.join(" ")).collect()
}

fn char_len(word: &str) -> usize {
    word.chars().count()
}

fn joined_len(words: &[&str]) -> usize {
    words.iter().map(|w| char_len(w)).sum::<usize>() + words.len().saturating_sub(1)
}
