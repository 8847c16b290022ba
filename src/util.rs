use std::env;
use std::io;

pub(crate) fn env_optional(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.trim().is_empty())
}

pub(crate) fn env_u64(name: &str, default: u64) -> Result<u64, Box<dyn std::error::Error>> {
    parse_u64(name, env_optional(name), default)
}

pub(crate) fn env_bool(name: &str, default: bool) -> bool {
    parse_bool(env_optional(name), default)
}

fn parse_u64(
    name: &str,
    value: Option<String>,
    default: u64,
) -> Result<u64, Box<dyn std::error::Error>> {
    match value {
        Some(value) => Ok(value
            .trim()
            .parse::<u64>()
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, format!("Invalid {name}")))?),
        None => Ok(default),
    }
}

fn parse_bool(value: Option<String>, default: bool) -> bool {
    match value {
        Some(value) => {
            let v = value.trim().to_ascii_lowercase();
            matches!(v.as_str(), "1" | "true" | "yes" | "y" | "on")
        }
        None => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn u64_default_when_unset() {
        assert_eq!(parse_u64("X", None, 7).unwrap(), 7);
    }

    #[test]
    fn u64_parses_and_rejects() {
        assert_eq!(parse_u64("X", Some(" 42 ".into()), 7).unwrap(), 42);
        let err = parse_u64("POKEDEX_SPECIES_LIMIT", Some("many".into()), 7).unwrap_err();
        assert_eq!(err.to_string(), "Invalid POKEDEX_SPECIES_LIMIT");
    }

    #[test]
    fn bool_variants() {
        assert!(parse_bool(Some("Yes".into()), false));
        assert!(parse_bool(Some("1".into()), false));
        assert!(!parse_bool(Some("off".into()), true));
        assert!(parse_bool(None, true));
    }
}
