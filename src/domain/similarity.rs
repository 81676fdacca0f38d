//! Name similarity scoring tuned for Korean food names.
//!
//! Precomposed Hangul syllables are split into their lead, vowel and trailing
//! jamo before comparison, so "된장찌개" and "된장뛔개" differ by two symbols
//! instead of one opaque syllable. The decomposed strings are then compared
//! with Jaro-Winkler.

const SYLLABLE_BASE: u32 = 0xAC00;
const LEAD_COUNT: u32 = 19;
const VOWEL_COUNT: u32 = 21;
const TRAIL_COUNT: u32 = 28;
const SYLLABLE_BLOCK: u32 = VOWEL_COUNT * TRAIL_COUNT;
const SYLLABLE_COUNT: u32 = LEAD_COUNT * SYLLABLE_BLOCK;

const WINKLER_SCALE: f64 = 0.1;
const WINKLER_MAX_PREFIX: usize = 4;

const LEADS: [char; LEAD_COUNT as usize] = [
    'ㄱ', 'ㄲ', 'ㄴ', 'ㄷ', 'ㄸ', 'ㄹ', 'ㅁ', 'ㅂ', 'ㅃ', 'ㅅ', 'ㅆ', 'ㅇ', 'ㅈ', 'ㅉ', 'ㅊ', 'ㅋ', 'ㅌ',
    'ㅍ', 'ㅎ',
];

const VOWELS: [char; VOWEL_COUNT as usize] = [
    'ㅏ', 'ㅐ', 'ㅑ', 'ㅒ', 'ㅓ', 'ㅔ', 'ㅕ', 'ㅖ', 'ㅗ', 'ㅘ', 'ㅙ', 'ㅚ', 'ㅛ', 'ㅜ', 'ㅝ', 'ㅞ', 'ㅟ',
    'ㅠ', 'ㅡ', 'ㅢ', 'ㅣ',
];

// Index 0 means "no trailing consonant" and is never emitted.
const TRAILS: [char; TRAIL_COUNT as usize] = [
    '\0', 'ㄱ', 'ㄲ', 'ㄳ', 'ㄴ', 'ㄵ', 'ㄶ', 'ㄷ', 'ㄹ', 'ㄺ', 'ㄻ', 'ㄼ', 'ㄽ', 'ㄾ', 'ㄿ', 'ㅀ', 'ㅁ',
    'ㅂ', 'ㅄ', 'ㅅ', 'ㅆ', 'ㅇ', 'ㅈ', 'ㅊ', 'ㅋ', 'ㅌ', 'ㅍ', 'ㅎ',
];

/// Score how likely two free-text names denote the same dish, in `[0, 1]`.
pub fn score(a: &str, b: &str) -> f64 {
    let left = decompose(&normalize(a));
    let right = decompose(&normalize(b));
    jaro_winkler(&left, &right)
}

/// Lowercase and drop every whitespace character.
pub fn normalize(input: &str) -> String {
    input
        .chars()
        .filter(|ch| !ch.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Split precomposed Hangul syllables into compatibility jamo; other characters pass through.
pub fn decompose(input: &str) -> Vec<char> {
    let mut out = Vec::with_capacity(input.len());
    for ch in input.chars() {
        let code = ch as u32;
        if !(SYLLABLE_BASE..SYLLABLE_BASE + SYLLABLE_COUNT).contains(&code) {
            out.push(ch);
            continue;
        }

        let index = code - SYLLABLE_BASE;
        let lead = index / SYLLABLE_BLOCK;
        let vowel = (index % SYLLABLE_BLOCK) / TRAIL_COUNT;
        let trail = index % TRAIL_COUNT;

        out.push(LEADS[lead as usize]);
        out.push(VOWELS[vowel as usize]);
        if trail > 0 {
            out.push(TRAILS[trail as usize]);
        }
    }
    out
}

/// Jaro similarity over two symbol sequences.
pub fn jaro(left: &[char], right: &[char]) -> f64 {
    if left.is_empty() || right.is_empty() {
        return 0.0;
    }
    if left == right {
        return 1.0;
    }

    let window = (left.len().max(right.len()) / 2).saturating_sub(1);
    let mut left_matched = vec![false; left.len()];
    let mut right_matched = vec![false; right.len()];
    let mut matches = 0usize;

    for (i, symbol) in left.iter().enumerate() {
        let start = i.saturating_sub(window);
        let end = (i + window + 1).min(right.len());
        for j in start..end {
            if right_matched[j] || right[j] != *symbol {
                continue;
            }
            left_matched[i] = true;
            right_matched[j] = true;
            matches += 1;
            break;
        }
    }

    if matches == 0 {
        return 0.0;
    }

    let mut half_transpositions = 0usize;
    let mut cursor = 0usize;
    for (i, symbol) in left.iter().enumerate() {
        if !left_matched[i] {
            continue;
        }
        while !right_matched[cursor] {
            cursor += 1;
        }
        if *symbol != right[cursor] {
            half_transpositions += 1;
        }
        cursor += 1;
    }

    let m = matches as f64;
    let t = half_transpositions as f64 / 2.0;
    (m / left.len() as f64 + m / right.len() as f64 + (m - t) / m) / 3.0
}

/// Jaro similarity boosted by the shared prefix, capped at four symbols.
pub fn jaro_winkler(left: &[char], right: &[char]) -> f64 {
    let base = jaro(left, right);
    if base == 0.0 {
        return 0.0;
    }

    let prefix = left
        .iter()
        .zip(right)
        .take(WINKLER_MAX_PREFIX)
        .take_while(|(a, b)| a == b)
        .count();

    base + prefix as f64 * WINKLER_SCALE * (1.0 - base)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn normalize_lowercases_and_strips_whitespace() {
        assert_eq!(normalize(" Kimchi  Fried\tRice "), "kimchifriedrice");
        assert_eq!(normalize("김치 볶음밥"), "김치볶음밥");
    }

    #[test]
    fn decompose_splits_syllables_into_jamo() {
        assert_eq!(decompose("한"), vec!['ㅎ', 'ㅏ', 'ㄴ']);
        assert_eq!(decompose("개"), vec!['ㄱ', 'ㅐ']);
        assert_eq!(decompose("a밥1"), vec!['a', 'ㅂ', 'ㅏ', 'ㅂ', '1']);
    }

    #[test]
    fn decompose_covers_both_ends_of_the_syllable_range() {
        assert_eq!(decompose("가"), vec!['ㄱ', 'ㅏ']);
        assert_eq!(decompose("힣"), vec!['ㅎ', 'ㅣ', 'ㅎ']);
    }

    #[test]
    fn identical_names_score_one() {
        assert_close(score("된장찌개", "된장찌개"), 1.0);
        assert_close(score("Pad Thai", "padthai"), 1.0);
    }

    #[test]
    fn empty_input_scores_zero() {
        assert_eq!(score("", "김밥"), 0.0);
        assert_eq!(score("   ", "   "), 0.0);
    }

    #[test]
    fn score_is_symmetric() {
        let pairs = [
            ("된장찌개", "된장뛔개"),
            ("김치찌개", "부대찌개"),
            ("martha", "marhta"),
            ("완전히다른음식이름", "된장찌개"),
        ];
        for (a, b) in pairs {
            assert_close(score(a, b), score(b, a));
        }
    }

    #[test]
    fn classic_latin_reference_values() {
        assert_close(jaro(&decompose("martha"), &decompose("marhta")), 0.944_444_444_4);
        assert_close(score("martha", "marhta"), 0.961_111_111_1);
        assert_close(score("dixon", "dicksonx"), 0.813_333_333_3);
    }

    #[test]
    fn one_jamo_variant_scores_above_threshold() {
        // ㄷㅚㄴㅈㅏㅇㅉㅣㄱㅐ vs ㄷㅚㄴㅈㅏㅇㄸㅞㄱㅐ: 8 of 10 symbols match in place.
        assert_close(score("된장찌개", "된장뛔개"), 0.92);
    }

    #[test]
    fn trailing_consonant_substitution_stays_close() {
        let near = score("된장찌개", "됨장찌개");
        let unrelated = score("된장찌개", "초코케이크");
        assert!(near > 0.75, "near duplicate scored {near}");
        assert!(near - unrelated > 0.3, "near {near} vs unrelated {unrelated}");
    }

    #[test]
    fn unrelated_long_name_falls_below_threshold() {
        assert!(score("완전히다른음식이름", "된장찌개") < 0.75);
    }
}
