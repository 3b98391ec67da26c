/// Invite code generation
///
/// An invite code is a standing credential stored on a grouped user. Anyone
/// holding it can join that user's group until the code is regenerated, so it
/// must resist enumeration.
///
/// # Format
///
/// - 12 characters, base62 (`[A-Za-z0-9]`)
/// - Key space: 62^12 ≈ 2^71
/// - Join-by-code accepts 6 to 20 characters on input; anything else in
///   that range simply misses on lookup
///
/// # Example
///
/// ```
/// use duotask_shared::auth::invite_code::{generate_invite_code, INVITE_CODE_LENGTH};
///
/// let code = generate_invite_code();
/// assert_eq!(code.len(), INVITE_CODE_LENGTH);
/// ```

use rand::Rng;

/// Length of generated codes
pub const INVITE_CODE_LENGTH: usize = 12;

const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Generates a fresh invite code
///
/// Uses `rand::thread_rng()`, a CSPRNG reseeded from the OS.
pub fn generate_invite_code() -> String {
    let mut rng = rand::thread_rng();

    (0..INVITE_CODE_LENGTH)
        .map(|_| {
            let idx = rng.gen_range(0..CHARSET.len());
            CHARSET[idx] as char
        })
        .collect()
}
