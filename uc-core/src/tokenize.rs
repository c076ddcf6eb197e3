//! Token estimation.
//!
//! Explicit heuristic contract, not a tokenizer: `ceil(char_count / 3.5)`.
//! Left as a documented approximation: swapping in a real tokenizer would
//! break the budget-search monotonicity guarantee that depends on it being
//! a pure function of character count.

use crate::types::Message;

/// Estimate the token count of a raw character count.
pub fn estimate_tokens_for_len(char_count: usize) -> u32 {
    if char_count == 0 {
        return 0;
    }
    // ceil(n / 3.5) == ceil(10n / 35) computed in integer arithmetic.
    let scaled = (char_count as u64) * 10;
    ((scaled + 34) / 35) as u32
}

/// Estimate a message's token count: 0 when `content` is absent.
pub fn estimate_tokens(message: &Message) -> u32 {
    message
        .content
        .as_deref()
        .map(|s| estimate_tokens_for_len(s.chars().count()))
        .unwrap_or(0)
}

/// Sum of `estimate_tokens` over a slice of messages.
pub fn estimate_tokens_total(messages: &[Message]) -> u32 {
    messages.iter().map(estimate_tokens).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_length_is_zero_tokens() {
        assert_eq!(estimate_tokens_for_len(0), 0);
    }

    #[test]
    fn rounds_up() {
        assert_eq!(estimate_tokens_for_len(1), 1);
        assert_eq!(estimate_tokens_for_len(3), 1);
        assert_eq!(estimate_tokens_for_len(4), 2);
        assert_eq!(estimate_tokens_for_len(7), 2);
        assert_eq!(estimate_tokens_for_len(35), 10);
    }

    #[test]
    fn message_without_content_is_zero() {
        let msg = Message::new("1", 0);
        assert_eq!(estimate_tokens(&msg), 0);
    }
}
