/// One `KEY=VALUE` pair from the backend's `.env`-style document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvVar {
    pub key: String,
    pub value: String,
}

/// Parse `.env`-style text. Comment and blank lines are dropped, declaration
/// order is preserved, and a matching pair of surrounding quotes is stripped
/// from the value.
pub fn parse_env(content: &str) -> Vec<EnvVar> {
    content
        .lines()
        .filter_map(|line| {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                return None;
            }
            let (key, value) = line.split_once('=')?;
            Some(EnvVar {
                key: key.trim().to_string(),
                value: unquote(value.trim()).to_string(),
            })
        })
        .collect()
}

pub fn serialize_env(vars: &[EnvVar]) -> String {
    let mut out = String::new();
    for var in vars {
        out.push_str(&var.key);
        out.push('=');
        out.push_str(&var.value);
        out.push('\n');
    }
    out
}

fn unquote(value: &str) -> &str {
    if value.len() >= 2 {
        let bytes = value.as_bytes();
        if (bytes[0] == b'"' && bytes[value.len() - 1] == b'"')
            || (bytes[0] == b'\'' && bytes[value.len() - 1] == b'\'')
        {
            return &value[1..value.len() - 1];
        }
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn var(key: &str, value: &str) -> EnvVar {
        EnvVar {
            key: key.into(),
            value: value.into(),
        }
    }

    #[test]
    fn test_parse_skips_comments_and_blanks() {
        let content = "# LLM settings\n\nLLM_PROVIDER=ollama\n  \nOLLAMA_BASE_URL=http://localhost:11434/v1\n# trailing note\n";
        assert_eq!(
            parse_env(content),
            vec![
                var("LLM_PROVIDER", "ollama"),
                var("OLLAMA_BASE_URL", "http://localhost:11434/v1"),
            ]
        );
    }

    #[test]
    fn test_parse_strips_matching_quotes_only() {
        assert_eq!(parse_env("A=\"quoted\""), vec![var("A", "quoted")]);
        assert_eq!(parse_env("A='quoted'"), vec![var("A", "quoted")]);
        assert_eq!(parse_env("A=\"mismatch'"), vec![var("A", "\"mismatch'")]);
        assert_eq!(parse_env("A=\""), vec![var("A", "\"")]);
        assert_eq!(parse_env("A=\"\""), vec![var("A", "")]);
    }

    #[test]
    fn test_value_may_contain_equals() {
        assert_eq!(
            parse_env("TOKEN=abc=def"),
            vec![var("TOKEN", "abc=def")]
        );
    }

    #[test]
    fn test_lines_without_separator_are_dropped() {
        assert_eq!(parse_env("not a pair\nA=1"), vec![var("A", "1")]);
    }

    #[test]
    fn test_round_trip() {
        let vars = vec![
            var("TELEGRAM_BOT_TOKEN", "123:abc"),
            var("LLM_PROVIDER", "openai"),
            var("QA_MODEL_NAME", "gpt-5-nano"),
            var("EMPTY", ""),
        ];
        assert_eq!(parse_env(&serialize_env(&vars)), vars);
    }

    #[test]
    fn test_round_trip_drops_comments_but_keeps_order() {
        let content = "B=2\n# note\nA=1\n";
        let vars = parse_env(content);
        assert_eq!(serialize_env(&vars), "B=2\nA=1\n");
    }
}
