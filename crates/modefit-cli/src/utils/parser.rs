use modefit::core::modes::solver::ModeCount;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("Invalid mode count '{0}'. Expected a positive integer or 'all'.")]
    InvalidModeCount(String),

    #[error("Invalid --set format: '{0}'. Expected KEY=VALUE.")]
    InvalidKeyValue(String),

    #[error("Component '{component}' cannot be empty in '{input}'.")]
    EmptyComponent {
        component: &'static str,
        input: String,
    },
}

/// Parses `all` or a positive integer.
pub fn parse_mode_count(input: &str) -> Result<ModeCount, ParseError> {
    let trimmed = input.trim();
    if trimmed.eq_ignore_ascii_case("all") {
        return Ok(ModeCount::All);
    }
    match trimmed.parse::<usize>() {
        Ok(n) if n > 0 => Ok(ModeCount::Count(n)),
        _ => Err(ParseError::InvalidModeCount(input.to_string())),
    }
}

/// Splits a `-S key=value` override at the first `=`.
pub fn parse_key_value(input: &str) -> Result<(&str, &str), ParseError> {
    let Some((key, value)) = input.split_once('=') else {
        return Err(ParseError::InvalidKeyValue(input.to_string()));
    };
    let key = key.trim();
    let value = value.trim();
    if key.is_empty() {
        return Err(ParseError::EmptyComponent {
            component: "key",
            input: input.to_string(),
        });
    }
    if value.is_empty() {
        return Err(ParseError::EmptyComponent {
            component: "value",
            input: input.to_string(),
        });
    }
    Ok((key, value))
}
