// Guess scoring: bulls, cows and misses for a 4-digit guess.
//
// Cows use plain containment: a guessed digit that appears anywhere in the
// secret is a cow, even if that secret digit was already counted as a bull.

/// Number of digits in a secret and in a guess.
pub const CODE_LEN: usize = 4;

pub const BULL: char = 'B';
pub const COW: char = 'K';
pub const MISS: char = '.';

/// Whether `text` is exactly four ASCII digits.
pub fn is_valid_guess(text: &str) -> bool {
    text.len() == CODE_LEN && text.bytes().all(|b| b.is_ascii_digit())
}

/// Score `guess` against `secret`, one symbol per position.
///
/// Both inputs must already be valid 4-digit strings.
pub fn score(secret: &str, guess: &str) -> String {
    let secret = secret.as_bytes();
    guess
        .bytes()
        .zip(secret.iter())
        .map(|(g, &s)| {
            if g == s {
                BULL
            } else if secret.contains(&g) {
                COW
            } else {
                MISS
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_match_is_all_bulls() {
        assert_eq!(score("1234", "1234"), "BBBB");
        assert_eq!(score("0007", "0007"), "BBBB");
    }

    #[test]
    fn test_no_common_digits() {
        assert_eq!(score("1234", "5678"), "....");
    }

    #[test]
    fn test_all_cows() {
        assert_eq!(score("4321", "1234"), "KKKK");
    }

    #[test]
    fn test_mixed() {
        assert_eq!(score("1234", "1243"), "BBKK");
        assert_eq!(score("1234", "1509"), "B...");
        assert_eq!(score("9081", "1980"), "KKBK");
    }

    #[test]
    fn test_repeated_guess_digit_counts_every_time() {
        // No multiset accounting: the single '1' in the secret feeds every cow.
        assert_eq!(score("1234", "1111"), "BKKK");
        assert_eq!(score("1234", "2222"), "KBKK");
    }

    #[test]
    fn test_repeated_secret_digit() {
        assert_eq!(score("0007", "7000"), "KBBK");
    }

    #[test]
    fn test_valid_guess() {
        assert!(is_valid_guess("0000"));
        assert!(is_valid_guess("9876"));
    }

    #[test]
    fn test_invalid_guess() {
        assert!(!is_valid_guess(""));
        assert!(!is_valid_guess("123"));
        assert!(!is_valid_guess("12345"));
        assert!(!is_valid_guess("12a4"));
        assert!(!is_valid_guess(" 123"));
        assert!(!is_valid_guess("1234\n"));
        assert!(!is_valid_guess("-123"));
        // Non-ASCII digits are rejected even when they are four chars long.
        assert!(!is_valid_guess("١٢٣٤"));
    }
}
