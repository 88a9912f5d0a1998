//! Prompt composition and naming helpers

use crate::{ComfyError, Result};
use rand::Rng;

const PROMPT_PREFIX: &str = "A vibrant red Chinese paper";
const PROMPT_SUFFIX: &str = "complex Chinese patterns, stand proudly among the swirling clouds and stylized clouds. The background is pure white, emphasizing a bold traditional design";

/// Largest seed handed to the sampler (2^48 - 1)
pub const MAX_SEED: u64 = (1 << 48) - 1;

/// Wrap the user's subject in the papercut style prompt
pub fn build_full_prompt(prompt: &str) -> Result<String> {
    let prompt = prompt.trim();
    if prompt.is_empty() {
        return Err(ComfyError::InvalidPrompt("prompt is empty".into()));
    }
    Ok(format!("{}, {}, {}", PROMPT_PREFIX, prompt, PROMPT_SUFFIX))
}

/// Random sampler seed in `1..=MAX_SEED`
pub fn random_seed() -> u64 {
    rand::thread_rng().gen_range(1..=MAX_SEED)
}

/// File name for a raw generation: `flux_{safe_prompt}_{timestamp}.png`
pub fn output_filename(prompt: &str, timestamp: i64) -> String {
    let safe: String = prompt
        .chars()
        .take(20)
        .filter(|c| c.is_alphanumeric() || matches!(c, ' ' | '-' | '_'))
        .collect();
    let safe = safe.trim().replace(' ', "_");
    format!("flux_{}_{}.png", safe, timestamp)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_prompt_wraps_subject() {
        let full = build_full_prompt("  tiger ").unwrap();
        assert!(full.starts_with("A vibrant red Chinese paper, tiger, complex Chinese patterns"));
        assert!(full.ends_with("bold traditional design"));
    }

    #[test]
    fn test_empty_prompt_rejected() {
        assert!(matches!(
            build_full_prompt("   "),
            Err(ComfyError::InvalidPrompt(_))
        ));
    }

    #[test]
    fn test_random_seed_in_range() {
        for _ in 0..100 {
            let seed = random_seed();
            assert!(seed >= 1 && seed <= MAX_SEED);
        }
    }

    #[test]
    fn test_output_filename_sanitizes() {
        assert_eq!(
            output_filename("a cat/dog: on the roof!", 1700000000),
            "flux_a_catdog_on_the_ro_1700000000.png"
        );
        assert_eq!(output_filename("  tiger  ", 5), "flux_tiger_5.png");
    }

    #[test]
    fn test_output_filename_keeps_unicode_letters() {
        assert_eq!(output_filename("老虎", 1), "flux_老虎_1.png");
    }
}
