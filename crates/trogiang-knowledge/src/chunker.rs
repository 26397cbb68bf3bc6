//! Document chunker — splits text into sentence-aligned passages.
//!
//! Passages are measured in words, not characters, so the same budget
//! works for Vietnamese and English text alike.

use serde::{Deserialize, Serialize};

/// Default passage size in words.
pub const DEFAULT_MAX_WORDS: usize = 100;

/// One passage of a source document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Zero-based position in the document.
    pub index: usize,
    pub text: String,
    pub word_count: usize,
}

impl Chunk {
    /// Chunk `text` and attach positions and word counts.
    pub fn from_document(text: &str, max_words: usize) -> Vec<Chunk> {
        split_into_chunks(text, max_words)
            .into_iter()
            .enumerate()
            .map(|(index, text)| Chunk {
                index,
                word_count: text.split_whitespace().count(),
                text,
            })
            .collect()
    }
}

/// Split `text` into passages of at most `max_words` words.
///
/// Sentences end at a word finishing in `.`, `!` or `?`. Whole sentences are
/// packed into a passage until the next one would overflow it; a sentence
/// longer than `max_words` is cut into `max_words`-sized word windows.
/// Empty or whitespace-only input yields no passages.
pub fn split_into_chunks(text: &str, max_words: usize) -> Vec<String> {
    let max_words = max_words.max(1);
    let mut chunks = Vec::new();
    let mut buffer: Vec<&str> = Vec::new();

    for sentence in sentences(text) {
        let mut words = sentence.as_slice();

        if words.len() > max_words {
            flush(&mut buffer, &mut chunks);
            while words.len() > max_words {
                chunks.push(words[..max_words].join(" "));
                words = &words[max_words..];
            }
        }
        if words.is_empty() {
            continue;
        }

        if buffer.len() + words.len() > max_words {
            flush(&mut buffer, &mut chunks);
        }
        buffer.extend_from_slice(words);
    }
    flush(&mut buffer, &mut chunks);

    chunks
}

/// Group whitespace-separated words into sentences.
fn sentences(text: &str) -> Vec<Vec<&str>> {
    let mut out = Vec::new();
    let mut current = Vec::new();
    for word in text.split_whitespace() {
        current.push(word);
        if word.ends_with(['.', '!', '?']) {
            out.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        out.push(current);
    }
    out
}

fn flush(buffer: &mut Vec<&str>, chunks: &mut Vec<String>) {
    if !buffer.is_empty() {
        chunks.push(buffer.join(" "));
        buffer.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word_count(s: &str) -> usize {
        s.split_whitespace().count()
    }

    fn normalized(s: &str) -> String {
        s.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    #[test]
    fn test_empty_input() {
        assert!(split_into_chunks("", 100).is_empty());
        assert!(split_into_chunks("   \n\r\t  ", 100).is_empty());
    }

    #[test]
    fn test_sentence_packing() {
        let text = "Cats are mammals. Dogs are mammals too. Fish live in water.";
        let chunks = split_into_chunks(text, 5);
        assert_eq!(
            chunks,
            vec!["Cats are mammals.", "Dogs are mammals too.", "Fish live in water."]
        );
        let total: usize = chunks.iter().map(|c| word_count(c)).sum();
        assert_eq!(total, word_count(text));
    }

    #[test]
    fn test_sentences_share_a_chunk_when_they_fit() {
        let text = "Một. Hai ba. Bốn năm sáu!";
        let chunks = split_into_chunks(text, 10);
        assert_eq!(chunks, vec!["Một. Hai ba. Bốn năm sáu!"]);
    }

    #[test]
    fn test_line_breaks_are_spaces() {
        let text = "Dòng một\nvẫn cùng câu.\r\nCâu hai?";
        let chunks = split_into_chunks(text, 5);
        assert_eq!(chunks, vec!["Dòng một vẫn cùng câu.", "Câu hai?"]);
    }

    #[test]
    fn test_exact_budget_is_one_chunk() {
        let text = "a b c d e f g h i j";
        assert_eq!(split_into_chunks(text, 10).len(), 1);
    }

    #[test]
    fn test_one_over_budget_splits() {
        let text = "a b c d e f g h i j k";
        let chunks = split_into_chunks(text, 10);
        assert!(chunks.len() >= 2);
        assert_eq!(chunks[0], "a b c d e f g h i j");
        assert_eq!(chunks[1], "k");
    }

    #[test]
    fn test_long_sentence_keeps_document_order() {
        let text = "Short one. w1 w2 w3 w4 w5 w6 w7. Tail.";
        let chunks = split_into_chunks(text, 3);
        assert_eq!(chunks, vec!["Short one.", "w1 w2 w3", "w4 w5 w6", "w7. Tail."]);
    }

    #[test]
    fn test_chunks_respect_budget_and_reconstruct() {
        let text = "Tế bào là đơn vị cơ bản của sự sống. Mọi sinh vật đều được cấu tạo từ tế bào! \
                    Ti thể là nơi diễn ra hô hấp tế bào, tạo ra năng lượng ATP cho mọi hoạt động sống \
                    của tế bào và cơ thể sinh vật nhân thực. Lục lạp có ở tế bào thực vật? Có.";
        for max_words in [1, 2, 5, 7, 12, 100] {
            let chunks = split_into_chunks(text, max_words);
            assert!(chunks.iter().all(|c| word_count(c) <= max_words && !c.trim().is_empty()));
            assert_eq!(chunks.join(" "), normalized(text));
        }
    }

    #[test]
    fn test_rechunking_is_idempotent() {
        let text = "Alpha beta gamma. Delta epsilon! Zeta eta theta iota kappa lambda mu. Nu?";
        let first = split_into_chunks(text, 4);
        let second = split_into_chunks(&first.join(" "), 4);
        assert_eq!(first, second);
    }

    #[test]
    fn test_chunk_metadata() {
        let chunks = Chunk::from_document("One two. Three four five.", 2);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].index, 0);
        assert_eq!(chunks[2].index, 2);
        assert_eq!(chunks[1].text, "Three four");
        assert_eq!(chunks[1].word_count, 2);
    }
}
