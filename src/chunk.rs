/// Split text into chunks of at most `chunk_size` characters by greedy word packing.
///
/// Words are separated by single spaces inside a chunk. A word longer than
/// `chunk_size` gets a chunk of its own.
pub fn chunk_transcript(text: &str, chunk_size: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for word in text.split_whitespace() {
        let word_len = word.chars().count();
        if current.is_empty() {
            current.push_str(word);
            current_len = word_len;
        } else if current_len + 1 + word_len > chunk_size {
            chunks.push(std::mem::take(&mut current));
            current.push_str(word);
            current_len = word_len;
        } else {
            current.push(' ');
            current.push_str(word);
            current_len += 1 + word_len;
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

/// First `max_chars` characters of `text`
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input() {
        assert!(chunk_transcript("", 3000).is_empty());
        assert!(chunk_transcript("  \n\t ", 3000).is_empty());
    }

    #[test]
    fn test_single_chunk() {
        assert_eq!(chunk_transcript("hello   world\nagain", 3000), vec!["hello world again"]);
    }

    #[test]
    fn test_exact_fit() {
        // "aaa bbb" is 7 characters
        assert_eq!(chunk_transcript("aaa bbb ccc", 7), vec!["aaa bbb", "ccc"]);
    }

    #[test]
    fn test_oversized_word() {
        assert_eq!(
            chunk_transcript("a bbbbbbbbbb c", 4),
            vec!["a", "bbbbbbbbbb", "c"]
        );
    }

    #[test]
    fn test_counts_characters_not_bytes() {
        // each Hangul syllable is 3 bytes but 1 character
        let chunks = chunk_transcript("안녕 하세요 여러분", 6);
        assert_eq!(chunks, vec!["안녕 하세요", "여러분"]);
    }

    #[test]
    fn test_reconstructs_words_and_respects_limit() {
        let text = "the quick  brown fox\njumps over the lazy dog and keeps running far away";
        for size in [1, 3, 5, 10, 20, 200] {
            let chunks = chunk_transcript(text, size);
            let rebuilt = chunks.join(" ");
            let expected = text.split_whitespace().collect::<Vec<_>>().join(" ");
            assert_eq!(rebuilt, expected, "size {size}");
            for chunk in &chunks {
                let single_word = !chunk.contains(' ');
                assert!(chunk.chars().count() <= size || single_word, "size {size}: {chunk}");
            }
        }
    }

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("hello", 3), "hel");
        assert_eq!(truncate_chars("hi", 10), "hi");
        assert_eq!(truncate_chars("요약입니다", 2), "요약");
    }
}
