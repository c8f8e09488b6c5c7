//! Scene chunking - deterministic partition of story text into scenes
//!
//! Splits a story into `num_scenes` contiguous caption groups. The same
//! (text, num_scenes) pair always yields identical chunk boundaries and
//! captions, so scene assets are reproducible across runs.

use crate::domain::value_objects::SceneChunk;

/// Caption character budget, ellipsis marker included. Tunable constant;
/// captions never exceed this length.
pub const CAPTION_MAX_CHARS: usize = 120;

const ELLIPSIS: &str = "...";

/// Partition `story_text` into exactly `num_scenes` chunks
///
/// Paragraphs are distributed `base = len / n` per chunk with the first
/// `len % n` chunks receiving one extra paragraph each, preserving
/// original order (uneven remainders spread toward the front). When there
/// are fewer paragraphs than scenes, chunks beyond the available
/// paragraphs reuse the last available paragraph so every scene has
/// non-empty source text for caption derivation.
///
/// `num_scenes == 0` is invalid at the request surface and yields an
/// empty list here.
pub fn chunk(story_text: &str, num_scenes: usize) -> Vec<SceneChunk> {
    if num_scenes == 0 {
        return Vec::new();
    }

    let paragraphs = split_paragraphs(story_text);
    let base = paragraphs.len() / num_scenes;
    let remainder = paragraphs.len() % num_scenes;

    let mut chunks = Vec::with_capacity(num_scenes);
    let mut cursor = 0;
    for index in 0..num_scenes {
        let take = base + usize::from(index < remainder);
        let group: Vec<String> = if take == 0 {
            // Fewer paragraphs than scenes: reuse the last available one
            vec![paragraphs.last().cloned().unwrap_or_default()]
        } else {
            let group = paragraphs[cursor..cursor + take].to_vec();
            cursor += take;
            group
        };

        let caption = derive_caption(&group.join(" "));
        chunks.push(SceneChunk {
            index,
            paragraphs: group,
            caption,
        });
    }

    chunks
}

/// Blank-line separated paragraphs; intra-paragraph line breaks collapse
/// to spaces
fn split_paragraphs(text: &str) -> Vec<String> {
    let mut paragraphs = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            if !current.is_empty() {
                paragraphs.push(current.join(" "));
                current.clear();
            }
        } else {
            current.push(line);
        }
    }
    if !current.is_empty() {
        paragraphs.push(current.join(" "));
    }
    paragraphs
}

/// Derive a chunk caption: the first sentence, truncated to
/// [`CAPTION_MAX_CHARS`] with an ellipsis marker when cut
pub fn derive_caption(text: &str) -> String {
    let text = text.trim();
    let candidate = first_sentence(text).unwrap_or(text);

    if candidate.chars().count() <= CAPTION_MAX_CHARS {
        return candidate.to_string();
    }

    let kept: String = candidate
        .chars()
        .take(CAPTION_MAX_CHARS - ELLIPSIS.len())
        .collect();
    format!("{}{}", kept.trim_end(), ELLIPSIS)
}

/// First sentence terminated by `.`, `!` or `?` followed by whitespace or
/// end of text
fn first_sentence(text: &str) -> Option<&str> {
    let mut chars = text.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        if matches!(c, '.' | '!' | '?') {
            match chars.peek() {
                None => return Some(text),
                Some((_, next)) if next.is_whitespace() => {
                    return Some(&text[..i + c.len_utf8()]);
                }
                _ => {}
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn story(paragraph_count: usize) -> String {
        (0..paragraph_count)
            .map(|i| format!("Paragraph number {i} tells part of the tale."))
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    #[test]
    fn test_even_distribution() {
        let chunks = chunk(&story(6), 3);
        assert_eq!(chunks.len(), 3);
        for chunk in &chunks {
            assert_eq!(chunk.paragraphs.len(), 2);
        }
    }

    #[test]
    fn test_remainder_spreads_toward_the_front() {
        let chunks = chunk(&story(7), 3);
        let sizes: Vec<usize> = chunks.iter().map(|c| c.paragraphs.len()).collect();
        assert_eq!(sizes, vec![3, 2, 2]);

        let chunks = chunk(&story(5), 3);
        let sizes: Vec<usize> = chunks.iter().map(|c| c.paragraphs.len()).collect();
        assert_eq!(sizes, vec![2, 2, 1]);
    }

    #[test]
    fn test_order_is_preserved() {
        let chunks = chunk(&story(7), 3);
        assert!(chunks[0].paragraphs[0].contains("number 0"));
        assert!(chunks[1].paragraphs[0].contains("number 3"));
        assert!(chunks[2].paragraphs[0].contains("number 5"));
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.index, i);
        }
    }

    #[test]
    fn test_fewer_paragraphs_than_scenes_reuses_last() {
        let chunks = chunk(&story(2), 4);
        assert_eq!(chunks.len(), 4);
        for chunk in &chunks {
            assert_eq!(chunk.paragraphs.len(), 1);
            assert!(!chunk.caption.is_empty());
        }
        assert!(chunks[2].paragraphs[0].contains("number 1"));
        assert!(chunks[3].paragraphs[0].contains("number 1"));
    }

    #[test]
    fn test_deterministic_boundaries_and_captions() {
        let text = story(9);
        let first = chunk(&text, 4);
        let second = chunk(&text, 4);
        assert_eq!(first, second);
    }

    #[test]
    fn test_caption_is_first_sentence() {
        let caption = derive_caption("The fox curled up. Then the moon rose high.");
        assert_eq!(caption, "The fox curled up.");
    }

    #[test]
    fn test_caption_ignores_decimal_points() {
        let caption = derive_caption("It was 3.5 miles to the den. The walk was calm.");
        assert_eq!(caption, "It was 3.5 miles to the den.");
    }

    #[test]
    fn test_caption_truncates_within_budget() {
        let long = "a ".repeat(200);
        let caption = derive_caption(&long);
        assert!(caption.chars().count() <= CAPTION_MAX_CHARS);
        assert!(caption.ends_with("..."));
    }

    #[test]
    fn test_long_first_sentence_is_still_truncated() {
        let long_sentence = format!("{}{}", "very ".repeat(50), "sleepy fox.");
        let caption = derive_caption(&long_sentence);
        assert!(caption.chars().count() <= CAPTION_MAX_CHARS);
        assert!(caption.ends_with("..."));
    }

    #[test]
    fn test_single_paragraph_story_chunks() {
        let chunks = chunk("One calm line with no breaks at all.", 3);
        assert_eq!(chunks.len(), 3);
        for chunk in &chunks {
            assert_eq!(chunk.paragraphs.len(), 1);
        }
    }

    #[test]
    fn test_zero_scenes_yields_empty() {
        assert!(chunk(&story(3), 0).is_empty());
    }
}
