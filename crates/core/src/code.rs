use rand::Rng;

/// Length of the human-readable codes handed out for requests, donations,
/// and banks.
pub const CODE_LEN: usize = 6;

/// Generate a random six-digit code such as `"048213"`.
///
/// Codes are not guaranteed unique; stores enforce uniqueness and callers
/// regenerate on collision.
#[must_use]
pub fn generate_code() -> String {
    let mut rng = rand::thread_rng();
    (0..CODE_LEN)
        .map(|_| char::from(b'0' + rng.gen_range(0..10u8)))
        .collect()
}

/// Whether `s` has the shape of a generated code.
#[must_use]
pub fn is_valid_code(s: &str) -> bool {
    s.len() == CODE_LEN && s.bytes().all(|b| b.is_ascii_digit())
}
