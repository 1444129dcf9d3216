// Property tests for guess scoring and secret generation.

use bulls_backend::scoring::{is_valid_guess, score};
use bulls_backend::secret::generate_secret;
use proptest::prelude::*;

fn proptest_config() -> ProptestConfig {
    let cases = std::env::var("PROPTEST_CASES")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(256);

    ProptestConfig {
        cases,
        ..ProptestConfig::default()
    }
}

fn code() -> impl Strategy<Value = String> {
    "[0-9]{4}"
}

/// Independent per-position oracle.
fn oracle(secret: &str, guess: &str) -> String {
    let s: Vec<char> = secret.chars().collect();
    let g: Vec<char> = guess.chars().collect();
    (0..4)
        .map(|i| {
            if s[i] == g[i] {
                'B'
            } else if s.contains(&g[i]) {
                'K'
            } else {
                '.'
            }
        })
        .collect()
}

proptest! {
    #![proptest_config(proptest_config())]

    #[test]
    fn prop_self_score_is_all_bulls(s in code()) {
        prop_assert_eq!(score(&s, &s), "BBBB");
    }

    #[test]
    fn prop_output_shape(secret in code(), guess in code()) {
        let out = score(&secret, &guess);
        prop_assert_eq!(out.len(), 4);
        prop_assert!(out.chars().all(|c| matches!(c, 'B' | 'K' | '.')));
    }

    #[test]
    fn prop_bull_iff_same_digit(secret in code(), guess in code()) {
        let out: Vec<char> = score(&secret, &guess).chars().collect();
        for i in 0..4 {
            prop_assert_eq!(out[i] == 'B', secret.as_bytes()[i] == guess.as_bytes()[i]);
        }
    }

    #[test]
    fn prop_matches_oracle(secret in code(), guess in code()) {
        prop_assert_eq!(score(&secret, &guess), oracle(&secret, &guess));
    }

    #[test]
    fn prop_miss_means_digit_absent(secret in code(), guess in code()) {
        let out: Vec<char> = score(&secret, &guess).chars().collect();
        for (i, g) in guess.chars().enumerate() {
            prop_assert_eq!(out[i] == '.', !secret.contains(g));
        }
    }

    #[test]
    fn prop_valid_codes_pass_validation(s in code()) {
        prop_assert!(is_valid_guess(&s));
    }

    #[test]
    fn prop_wrong_length_fails_validation(s in "[0-9]{0,3}|[0-9]{5,8}") {
        prop_assert!(!is_valid_guess(&s));
    }

    #[test]
    fn prop_non_digit_fails_validation(prefix in "[0-9]{0,3}", bad in "[a-zA-Z .+-]") {
        let mut s = prefix.clone();
        s.push_str(&bad);
        while s.len() < 4 {
            s.push('0');
        }
        prop_assert!(!is_valid_guess(&s));
    }
}

#[test]
fn containment_not_multiset() {
    assert_eq!(score("1234", "1111"), "BKKK");
}

#[test]
fn generated_secrets_are_valid() {
    for _ in 0..500 {
        let s = generate_secret();
        assert_eq!(s.len(), 4);
        assert!(is_valid_guess(&s));
    }
}
