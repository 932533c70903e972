//! End-to-end chunking behavior: page text in, chunks out.

use pdfrag::chunking::sentences::split_sentences;
use pdfrag::{Chunk, ChunkConfig, ChunkError, Document, OverlapPolicy, SentenceChunker};

const CAT: &str = "A cat sat. It was happy. The sun was warm today.";

fn chunker(chunk_size: usize, overlap: OverlapPolicy) -> SentenceChunker {
    SentenceChunker::new(ChunkConfig::new(chunk_size, overlap)).unwrap()
}

fn texts(chunks: &[Chunk]) -> Vec<&str> {
    chunks.iter().map(|c| c.text.as_str()).collect()
}

/// Pages of short, distinct sentences
fn pages(count: usize) -> Vec<String> {
    let sentences: Vec<String> = (0..count)
        .map(|i| format!("Sentence number {} talks about topic {}.", i, i % 7))
        .collect();
    sentences.chunks(5).map(|page| page.join(" ")).collect()
}

#[test]
fn test_cat_scenario_with_overlap() {
    let doc = Document::from_pages("cat.pdf", &[CAT], &chunker(40, OverlapPolicy::SentenceCount { count: 1 }));
    assert_eq!(
        texts(doc.chunks()),
        vec!["A cat sat. It was happy.", "It was happy. The sun was warm today."]
    );
}

#[test]
fn test_cat_scenario_overlap_dropped_when_it_cannot_fit() {
    let doc = Document::from_pages("cat.pdf", &[CAT], &chunker(25, OverlapPolicy::SentenceCount { count: 1 }));
    assert_eq!(
        texts(doc.chunks()),
        vec!["A cat sat. It was happy.", "The sun was warm today."]
    );
}

#[test]
fn test_pages_are_cleaned_and_joined() {
    let raw = ["A cat\nsat. It was hap-\n py.", "", "The sun\twas warm today."];
    let doc = Document::from_pages("cat.pdf", &raw, &chunker(500, OverlapPolicy::default()));
    assert_eq!(doc.page_count, 3);
    assert_eq!(doc.full_text, CAT);
    assert_eq!(doc.sentences(), ["A cat sat.", "It was happy.", "The sun was warm today."]);
    assert_eq!(texts(doc.chunks()), vec![CAT]);
}

#[test]
fn test_every_sentence_lands_in_order() {
    let doc = Document::from_pages("long.pdf", &pages(60), &chunker(200, OverlapPolicy::SentenceCount { count: 2 }));
    assert!(doc.chunks().len() > 1);

    let mut last_chunk = 0;
    for sentence in doc.sentences() {
        let first = doc
            .chunks()
            .iter()
            .position(|c| c.text.contains(sentence.as_str()))
            .unwrap_or_else(|| panic!("sentence missing from chunks: {}", sentence));
        assert!(first >= last_chunk, "sentence out of order: {}", sentence);
        last_chunk = first;
    }
}

#[test]
fn test_chunks_respect_size_bound() {
    for chunk_size in [60, 120, 200, 333] {
        for overlap in [
            OverlapPolicy::SentenceCount { count: 0 },
            OverlapPolicy::SentenceCount { count: 2 },
            OverlapPolicy::CharRatio { ratio: 0.25 },
        ] {
            let doc = Document::from_pages("long.pdf", &pages(40), &chunker(chunk_size, overlap));
            for chunk in doc.chunks() {
                assert!(
                    chunk.char_len() <= chunk_size,
                    "chunk of {} chars exceeds {} ({:?})",
                    chunk.char_len(),
                    chunk_size,
                    overlap
                );
            }
        }
    }
}

#[test]
fn test_chunk_indices_are_sequential() {
    let doc = Document::from_pages("long.pdf", &pages(30), &chunker(150, OverlapPolicy::default()));
    for (i, chunk) in doc.chunks().iter().enumerate() {
        assert_eq!(chunk.index, i);
        assert!(!chunk.text.is_empty());
        assert_eq!(chunk.text, chunk.text.trim());
    }
}

#[test]
fn test_sentence_overlap_repeats_previous_tail() {
    let doc = Document::from_pages("long.pdf", &pages(30), &chunker(200, OverlapPolicy::SentenceCount { count: 1 }));
    for pair in doc.chunks().windows(2) {
        let tail = split_sentences(&pair[0].text).last().copied().unwrap();
        assert!(
            pair[1].text.starts_with(tail),
            "{:?} does not start with {:?}",
            pair[1].text,
            tail
        );
    }
}

#[test]
fn test_two_sentence_overlap_drops_oldest_when_crowded() {
    let text = "One two three. Four five six. Seven eight nine ten.";
    let doc = Document::from_pages("x.pdf", &[text], &chunker(40, OverlapPolicy::SentenceCount { count: 2 }));
    assert_eq!(
        texts(doc.chunks()),
        vec!["One two three. Four five six.", "Four five six. Seven eight nine ten."]
    );
}

#[test]
fn test_two_sentence_overlap_clamped_across_document() {
    // Two sentences fill a chunk; only one of them fits beside the next
    let doc = Document::from_pages("long.pdf", &pages(30), &chunker(90, OverlapPolicy::SentenceCount { count: 2 }));
    assert!(doc.chunks().len() > 2);
    for pair in doc.chunks().windows(2) {
        let prev = split_sentences(&pair[0].text);
        let next = split_sentences(&pair[1].text);
        assert_eq!(prev.len(), 2);
        assert_eq!(next[0], prev[1], "carry is the newest sentence");
        assert!(!pair[1].text.contains(prev[0]), "oldest sentence was carried");
        assert!(pair[1].char_len() <= 90);
    }
}

#[test]
fn test_char_overlap_repeats_previous_suffix() {
    let doc = Document::from_pages("long.pdf", &pages(30), &chunker(200, OverlapPolicy::CharRatio { ratio: 0.25 }));
    assert!(doc.chunks().len() > 1);
    for pair in doc.chunks().windows(2) {
        let prev: Vec<char> = pair[0].text.chars().collect();
        let suffix: String = prev[prev.len().saturating_sub(50)..].iter().collect();
        assert!(pair[1].text.starts_with(suffix.trim_start()));
    }
}

#[test]
fn test_no_overlap_partitions_sentences() {
    let doc = Document::from_pages("long.pdf", &pages(25), &chunker(120, OverlapPolicy::SentenceCount { count: 0 }));
    let rejoined = texts(doc.chunks()).join(" ");
    assert_eq!(rejoined, doc.full_text);
}

#[test]
fn test_oversized_sentence_stands_alone() {
    let long = format!("{} end.", "word ".repeat(20).trim());
    let text = format!("Short one. {} Short two.", long);
    let doc = Document::from_pages("x.pdf", &[text.as_str()], &chunker(30, OverlapPolicy::SentenceCount { count: 2 }));
    assert_eq!(texts(doc.chunks()), vec!["Short one.", long.as_str(), "Short two."]);
}

#[test]
fn test_chunking_is_deterministic() {
    let chunker = chunker(180, OverlapPolicy::CharRatio { ratio: 0.15 });
    let first = Document::from_pages("a.pdf", &pages(50), &chunker);
    let second = Document::from_pages("a.pdf", &pages(50), &chunker);
    assert_eq!(first.chunks(), second.chunks());
}

#[test]
fn test_empty_document_has_no_chunks() {
    let empty: Vec<String> = vec![String::new(), "   \n".to_string()];
    let doc = Document::from_pages("blank.pdf", &empty, &chunker(100, OverlapPolicy::default()));
    assert!(doc.is_empty());
    assert!(doc.sentences().is_empty());
}

#[test]
fn test_zero_chunk_size_rejected() {
    let result = SentenceChunker::new(ChunkConfig::new(0, OverlapPolicy::default()));
    assert!(matches!(result, Err(ChunkError::InvalidConfiguration(_))));
}

#[test]
fn test_ratio_out_of_range_rejected() {
    for ratio in [1.0, -0.1, f64::NAN] {
        let result = SentenceChunker::new(ChunkConfig::new(100, OverlapPolicy::CharRatio { ratio }));
        assert!(result.is_err(), "ratio {} accepted", ratio);
    }
}
