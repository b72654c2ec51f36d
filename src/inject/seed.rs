//! Seed randomization policy.
//!
//! A seed-like input holding [`SEED_SENTINEL`] or [`FORM_RANDOMIZE_SEED`]
//! asks for a fresh random seed at execution time. Any other value is an
//! explicit choice and is kept.
use rand::Rng;
use serde_json::Value;

/// `f64::MIN`; a user cannot tell it apart from "randomize".
pub const SEED_SENTINEL: f64 = f64::MIN;

/// Smallest positive double (`5e-324`), written by the form's randomize toggle.
pub const FORM_RANDOMIZE_SEED: f64 = 5e-324;

/// Input names treated as seeds.
pub const SEED_LIKE_INPUTS: &[&str] = &["seed", "noise_seed", "rand_seed"];

pub fn is_seed_like(input_name: &str) -> bool {
    SEED_LIKE_INPUTS.contains(&input_name)
}

pub fn is_sentinel(value: &Value) -> bool {
    matches!(value.as_f64(), Some(v) if v == SEED_SENTINEL || v == FORM_RANDOMIZE_SEED)
}

/// Uniform over the full `u32` range, as ComfyUI samplers accept.
pub fn random_seed<R: Rng>(rng: &mut R) -> Value {
    Value::from(rng.random::<u32>())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use serde_json::json;

    #[test]
    fn only_the_two_randomize_values_are_sentinels() {
        assert!(is_sentinel(&json!(f64::MIN)));
        assert!(is_sentinel(&json!(-1.7976931348623157e308)));
        assert!(is_sentinel(&json!(FORM_RANDOMIZE_SEED)));
        assert!(is_sentinel(&serde_json::from_str::<Value>("5e-324").unwrap()));
        assert!(!is_sentinel(&json!(0)));
        assert!(!is_sentinel(&json!(-1)));
        assert!(!is_sentinel(&json!(f64::MIN_POSITIVE)));
        assert!(!is_sentinel(&json!(1e-323)));
        assert!(!is_sentinel(&json!("seed")));
    }

    #[test]
    fn seed_names_match_exactly() {
        assert!(is_seed_like("noise_seed"));
        assert!(!is_seed_like("seed_mode"));
    }

    #[test]
    fn random_seed_fits_u32() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..64 {
            let v = random_seed(&mut rng);
            assert!(v.as_u64().is_some_and(|s| s <= u64::from(u32::MAX)));
        }
    }
}
