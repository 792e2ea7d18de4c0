//! Submission validation
//!
//! Runs in the adapter before a `submitItems` command reaches the room
//! engine, which itself enforces no minimum.

use tandem_common::{Error, Result};

/// Trim names, drop blanks, and require at least `min_items` survivors
pub fn clean_names(names: Vec<String>, min_items: usize) -> Result<Vec<String>> {
    let cleaned: Vec<String> = names
        .into_iter()
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .collect();

    if cleaned.len() < min_items {
        return Err(Error::InvalidSubmission(format!(
            "need at least {} items, got {}",
            min_items,
            cleaned.len()
        )));
    }
    Ok(cleaned)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_trims_and_drops_blanks() {
        let cleaned = clean_names(v(&["  Tacos ", "", "   ", "Pho", "Sushi"]), 3).unwrap();
        assert_eq!(cleaned, v(&["Tacos", "Pho", "Sushi"]));
    }

    #[test]
    fn test_too_few_after_cleaning() {
        let err = clean_names(v(&["Tacos", " ", "Pho"]), 3).unwrap_err();
        assert!(matches!(err, Error::InvalidSubmission(_)));
        assert!(err.to_string().contains("got 2"));
    }

    #[test]
    fn test_zero_minimum_accepts_empty() {
        assert!(clean_names(vec![], 0).unwrap().is_empty());
    }
}
