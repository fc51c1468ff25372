use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Shared cancellation flag. Clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevealProgress {
    Revealing,
    Finished,
    Cancelled,
}

/// Reveals text one character per `per_char_delay`, driven by frame time.
/// The token is checked before every character; once cancelled nothing
/// more is emitted.
#[derive(Debug, Clone)]
pub struct TextReveal {
    chars: Vec<char>,
    next_index: usize,
    revealed: String,
    per_char_delay: Duration,
    pending: Duration,
    cancel: CancelToken,
}

impl TextReveal {
    pub fn new(text: &str, per_char_delay: Duration, cancel: CancelToken) -> Self {
        let chars: Vec<char> = text.chars().collect();
        Self {
            revealed: String::with_capacity(text.len()),
            chars,
            next_index: 0,
            per_char_delay,
            pending: Duration::ZERO,
            cancel,
        }
    }

    pub fn revealed(&self) -> &str {
        &self.revealed
    }

    pub fn progress(&self) -> RevealProgress {
        if self.cancel.is_cancelled() {
            RevealProgress::Cancelled
        } else if self.next_index >= self.chars.len() {
            RevealProgress::Finished
        } else {
            RevealProgress::Revealing
        }
    }

    pub fn advance(&mut self, frame_dt: Duration) -> RevealProgress {
        if self.per_char_delay.is_zero() {
            for _ in self.by_ref() {}
            return self.progress();
        }

        self.pending = self.pending.saturating_add(frame_dt);
        while self.pending >= self.per_char_delay {
            if self.next().is_none() {
                self.pending = Duration::ZERO;
                break;
            }
            self.pending -= self.per_char_delay;
        }
        self.progress()
    }
}

impl Iterator for TextReveal {
    type Item = char;

    fn next(&mut self) -> Option<char> {
        if self.cancel.is_cancelled() {
            return None;
        }
        let ch = *self.chars.get(self.next_index)?;
        self.next_index += 1;
        self.revealed.push(ch);
        Some(ch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DELAY: Duration = Duration::from_millis(10);

    #[test]
    fn advance_reveals_by_elapsed_time() {
        let mut reveal = TextReveal::new("Hello", DELAY, CancelToken::new());
        assert_eq!(
            reveal.advance(Duration::from_millis(25)),
            RevealProgress::Revealing
        );
        assert_eq!(reveal.revealed(), "He");
        assert_eq!(
            reveal.advance(Duration::from_millis(5)),
            RevealProgress::Revealing
        );
        assert_eq!(reveal.revealed(), "Hel");
        assert_eq!(
            reveal.advance(Duration::from_secs(1)),
            RevealProgress::Finished
        );
        assert_eq!(reveal.revealed(), "Hello");
    }

    #[test]
    fn iterator_yields_each_character() {
        let reveal = TextReveal::new("ab", DELAY, CancelToken::new());
        assert_eq!(reveal.collect::<String>(), "ab");
    }

    #[test]
    fn cancellation_stops_further_characters() {
        let token = CancelToken::new();
        let mut reveal = TextReveal::new("dialog text", DELAY, token.clone());
        assert_eq!(reveal.next(), Some('d'));
        assert_eq!(reveal.next(), Some('i'));

        token.cancel();
        assert_eq!(reveal.next(), None);
        assert_eq!(
            reveal.advance(Duration::from_secs(5)),
            RevealProgress::Cancelled
        );
        assert_eq!(reveal.revealed(), "di");
    }

    #[test]
    fn cancelled_before_start_reveals_nothing() {
        let token = CancelToken::new();
        token.cancel();
        let mut reveal = TextReveal::new("abc", Duration::ZERO, token);
        assert_eq!(reveal.advance(DELAY), RevealProgress::Cancelled);
        assert_eq!(reveal.revealed(), "");
    }

    #[test]
    fn zero_delay_reveals_everything_at_once() {
        let mut reveal = TextReveal::new("héllo", Duration::ZERO, CancelToken::new());
        assert_eq!(reveal.advance(Duration::ZERO), RevealProgress::Finished);
        assert_eq!(reveal.revealed(), "héllo");
    }

    #[test]
    fn empty_text_is_finished() {
        let mut reveal = TextReveal::new("", DELAY, CancelToken::new());
        assert_eq!(reveal.progress(), RevealProgress::Finished);
        assert_eq!(reveal.advance(DELAY), RevealProgress::Finished);
    }
}
