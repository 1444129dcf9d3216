// Secret number generation.

use rand::Rng;

/// Exclusive upper bound for a 4-digit secret.
const SECRET_RANGE: u32 = 10_000;

/// Generate a random secret like `"0042"` using the thread-local RNG.
pub fn generate_secret() -> String {
    generate_secret_with(&mut rand::thread_rng())
}

/// Generate a secret from the given RNG, zero-padded to four digits.
pub fn generate_secret_with<R: Rng + ?Sized>(rng: &mut R) -> String {
    let n = rng.gen_range(0..SECRET_RANGE);
    format!("{n:04}")
}
