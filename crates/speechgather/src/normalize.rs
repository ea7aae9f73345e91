use unicode_normalization::UnicodeNormalization;

/// Reduces text to printable ASCII for sinks that cannot render anything else.
pub fn normalize(text: &str) -> String {
    text.nfkd()
        .filter_map(|c| match c {
            '\n' => Some('\n'),
            c if c.is_whitespace() => Some(' '),
            ' '..='~' => Some(c),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_diacritics() {
        assert_eq!(normalize("Café Zoë naïve"), "Cafe Zoe naive");
    }

    #[test]
    fn test_expands_compatibility_forms() {
        assert_eq!(normalize("ﬁnal ½"), "final 12");
        assert_eq!(normalize("Ⅻ"), "XII");
    }

    #[test]
    fn test_preserves_word_boundaries() {
        assert_eq!(normalize("budget\u{00a0}bill\tnow"), "budget bill now");
        assert_eq!(normalize("first line\nsecond line"), "first line\nsecond line");
        assert_eq!(normalize("Mr Speaker — order"), "Mr Speaker  order");
    }

    #[test]
    fn test_drops_unrepresentable_characters() {
        assert_eq!(normalize("vote ✓ 日本"), "vote  ");
        assert_eq!(normalize("bell\u{0007}"), "bell");
        assert_eq!(normalize(""), "");
    }

    #[test]
    fn test_output_is_printable_ascii() {
        let out = normalize("“Quoted” – ‘text’ … with ŝtrange ćharacters\r\n");
        assert!(out.chars().all(|c| c == '\n' || (' '..='~').contains(&c)));
    }

    #[test]
    fn test_idempotent() {
        let samples = [
            "plain ascii",
            "Café\u{00a0}crème — “quotes”",
            "ﬁ ½ Ⅻ ㎏",
            "tabs\tand\r\nnewlines",
            "emoji 🎉 and 中文",
            "",
        ];
        for sample in samples {
            let once = normalize(sample);
            assert_eq!(normalize(&once), once, "not idempotent for {sample:?}");
        }
    }
}
