//! Plain-text flashcard import
//!
//! One card per line, front and back separated by a delimiter. Blank lines
//! and lines without both sides are skipped.

use std::str::FromStr;

use uuid::Uuid;

use super::models::NewFlashcard;

/// Separator between the front and back of an imported line
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Delimiter {
    #[default]
    Tab,
    Comma,
    Semicolon,
    Custom(String),
}

impl Delimiter {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Tab => "\t",
            Self::Comma => ",",
            Self::Semicolon => ";",
            Self::Custom(s) if s.is_empty() => ",",
            Self::Custom(s) => s,
        }
    }
}

impl FromStr for Delimiter {
    type Err = std::convert::Infallible;

    /// Named delimiters, anything else is taken literally
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "tab" | "\t" => Self::Tab,
            "comma" | "," => Self::Comma,
            "semicolon" | ";" => Self::Semicolon,
            other => Self::Custom(other.to_string()),
        })
    }
}

/// Parse `content` into cards for `set_id`
pub fn parse_import_text(content: &str, delimiter: &Delimiter, set_id: Uuid) -> Vec<NewFlashcard> {
    let sep = delimiter.as_str();
    content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| {
            let mut terms = line.split(sep).map(str::trim);
            match (terms.next(), terms.next()) {
                (Some(front), Some(back)) if !front.is_empty() && !back.is_empty() => {
                    Some(NewFlashcard {
                        front: front.to_string(),
                        back: back.to_string(),
                        set_id: Some(set_id),
                    })
                }
                _ => None,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tab_separated() {
        let set_id = Uuid::new_v4();
        let cards = parse_import_text("hello\txin chào\n\ncat\tcon mèo\n", &Delimiter::Tab, set_id);
        assert_eq!(cards.len(), 2);
        assert_eq!(cards[0].front, "hello");
        assert_eq!(cards[0].back, "xin chào");
        assert_eq!(cards[1].set_id, Some(set_id));
    }

    #[test]
    fn test_parse_skips_incomplete_lines() {
        let cards = parse_import_text(
            " a , b \nonly-front\n , missing front\nc,d,extra",
            &Delimiter::Comma,
            Uuid::new_v4(),
        );
        let pairs: Vec<_> = cards.iter().map(|c| (c.front.as_str(), c.back.as_str())).collect();
        assert_eq!(pairs, vec![("a", "b"), ("c", "d")]);
    }

    #[test]
    fn test_custom_delimiter() {
        let delimiter: Delimiter = "::".parse().unwrap();
        assert_eq!(delimiter, Delimiter::Custom("::".to_string()));
        let cards = parse_import_text("sun::mặt trời", &delimiter, Uuid::new_v4());
        assert_eq!(cards[0].back, "mặt trời");
    }

    #[test]
    fn test_default_is_tab() {
        assert_eq!(Delimiter::default(), Delimiter::Tab);
        assert_eq!(Delimiter::default().as_str(), "\t");
    }

    #[test]
    fn test_crlf_lines() {
        let cards = parse_import_text("a;b\r\nc;d\r\n", &Delimiter::Semicolon, Uuid::new_v4());
        assert_eq!(cards.len(), 2);
        assert_eq!(cards[0].back, "b");
    }
}
