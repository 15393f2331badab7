use crate::config::StreamingConfig;
use futures::stream::{self, Stream};
use std::collections::VecDeque;
use std::time::Duration;

/// Split `answer` into groups of `chunk_words` words
///
/// Words inside a group are joined by one space and every chunk except the
/// last carries a trailing space, so concatenating the chunks yields the
/// answer with its whitespace normalized.
pub fn chunk_answer(answer: &str, chunk_words: usize) -> Vec<String> {
    let words: Vec<&str> = answer.split_whitespace().collect();
    let size = chunk_words.max(1);
    let groups = words.len().div_ceil(size);

    words
        .chunks(size)
        .enumerate()
        .map(|(i, group)| {
            let mut chunk = group.join(" ");
            if i + 1 < groups {
                chunk.push(' ');
            }
            chunk
        })
        .collect()
}

/// Paces chunks of a finished answer into a stream
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StreamSynthesizer {
    pub chunk_words: usize,
    pub interval: Duration,
}

impl Default for StreamSynthesizer {
    fn default() -> Self {
        Self::from(&StreamingConfig::default())
    }
}

impl From<&StreamingConfig> for StreamSynthesizer {
    fn from(config: &StreamingConfig) -> Self {
        Self {
            chunk_words: config.chunk_words,
            interval: config.interval,
        }
    }
}

impl StreamSynthesizer {
    pub fn new(chunk_words: usize, interval: Duration) -> Self {
        Self {
            chunk_words,
            interval,
        }
    }

    pub fn chunks(&self, answer: &str) -> Vec<String> {
        chunk_answer(answer, self.chunk_words)
    }

    /// Yield the chunks of `answer` in order, sleeping `interval` between them
    pub fn stream(&self, answer: &str) -> impl Stream<Item = String> + Send + 'static {
        let pending: VecDeque<String> = self.chunks(answer).into();
        let interval = self.interval;

        stream::unfold((pending, true), move |(mut pending, first)| async move {
            let chunk = pending.pop_front()?;
            if !first && !interval.is_zero() {
                tokio::time::sleep(interval).await;
            }
            Some((chunk, (pending, false)))
        })
    }
}
