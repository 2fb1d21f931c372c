//! Display masking for account numbers.

const VISIBLE_CHARS: usize = 4;

/// Render an account number for list display: `****` followed by the last four
/// characters when it is longer than four characters, unchanged otherwise.
pub fn mask_account_number(account_number: &str) -> String {
    let len = account_number.chars().count();
    if len <= VISIBLE_CHARS {
        return account_number.to_string();
    }
    let tail: String = account_number.chars().skip(len - VISIBLE_CHARS).collect();
    format!("****{tail}")
}
