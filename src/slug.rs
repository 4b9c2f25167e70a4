use anyhow::Result;
use rand::Rng;
use regex::Regex;

const SUFFIX_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const SUFFIX_LEN: usize = 4;

pub fn slugify(text: &str) -> Result<String> {
    let disallowed = Regex::new(r"[^a-z0-9\s-]")?;
    let whitespace = Regex::new(r"\s+")?;
    let dashes = Regex::new(r"-+")?;

    let lower = text.to_lowercase();
    let cleaned = disallowed.replace_all(lower.trim(), "");
    let dashed = whitespace.replace_all(&cleaned, "-");
    Ok(dashes.replace_all(&dashed, "-").into_owned())
}

/// `slugify(name)` plus a short random suffix, e.g. `acme-co-x3k9`.
pub fn generate_company_slug(name: &str) -> Result<String> {
    generate_company_slug_with(name, &mut rand::thread_rng())
}

pub fn generate_company_slug_with<R: Rng + ?Sized>(name: &str, rng: &mut R) -> Result<String> {
    let suffix: String = (0..SUFFIX_LEN)
        .map(|_| SUFFIX_ALPHABET[rng.gen_range(0..SUFFIX_ALPHABET.len())] as char)
        .collect();
    Ok(format!("{}-{}", slugify(name)?, suffix))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Acme Corp").unwrap(), "acme-corp");
        assert_eq!(slugify("  Acme & Co.  ").unwrap(), "acme-co");
        assert_eq!(slugify("Foo -- Bar").unwrap(), "foo-bar");
        assert_eq!(slugify("Café Ünited").unwrap(), "caf-nited");
        assert_eq!(slugify("").unwrap(), "");
    }

    #[test]
    fn test_generated_slug_shape() {
        let mut rng = StdRng::seed_from_u64(42);
        let slug = generate_company_slug_with("Acme Corp", &mut rng).unwrap();
        let suffix = slug.strip_prefix("acme-corp-").unwrap();
        assert_eq!(suffix.len(), 4);
        assert!(suffix.chars().all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));

        let mut again = StdRng::seed_from_u64(42);
        assert_eq!(generate_company_slug_with("Acme Corp", &mut again).unwrap(), slug);
    }
}
