pub fn truncate_words(text: &str, max_words: usize) -> String {
    let mut words = text.split_whitespace();
    let kept = words.by_ref().take(max_words.max(1)).collect::<Vec<_>>();
    let truncated = words.next().is_some();

    let mut label = kept.join(" ");
    if truncated {
        label.push('…');
    }
    label
}

pub fn preview(text: &str) -> String {
    truncate_words(text, 5)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncates_on_word_boundaries() {
        assert_eq!(truncate_words("one two three four", 2), "one two…");
        assert_eq!(truncate_words("  one   two ", 2), "one two");
        assert_eq!(truncate_words("", 3), "");
    }
}
