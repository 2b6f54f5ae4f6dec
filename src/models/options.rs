use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// One dimension of [`SummaryOptions`]. `ALL` lists the values in their
/// canonical order, which is also the tie-break order for statistics.
pub trait OptionValue: Copy + Eq + fmt::Debug + 'static {
    const ALL: &'static [Self];

    fn as_str(&self) -> &'static str;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SummaryLength {
    Short,
    #[default]
    Medium,
    Long,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SummaryStyle {
    #[default]
    Paragraph,
    Bullet,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SummaryFocus {
    #[default]
    General,
    Academic,
    Technical,
}

impl OptionValue for SummaryLength {
    const ALL: &'static [Self] = &[Self::Short, Self::Medium, Self::Long];

    fn as_str(&self) -> &'static str {
        match self {
            Self::Short => "short",
            Self::Medium => "medium",
            Self::Long => "long",
        }
    }
}

impl OptionValue for SummaryStyle {
    const ALL: &'static [Self] = &[Self::Paragraph, Self::Bullet];

    fn as_str(&self) -> &'static str {
        match self {
            Self::Paragraph => "paragraph",
            Self::Bullet => "bullet",
        }
    }
}

impl OptionValue for SummaryFocus {
    const ALL: &'static [Self] = &[Self::General, Self::Academic, Self::Technical];

    fn as_str(&self) -> &'static str {
        match self {
            Self::General => "general",
            Self::Academic => "academic",
            Self::Technical => "technical",
        }
    }
}

fn parse_option<T: OptionValue>(s: &str) -> Result<T, String> {
    let wanted = s.trim().to_ascii_lowercase();
    T::ALL
        .iter()
        .copied()
        .find(|v| v.as_str() == wanted)
        .ok_or_else(|| {
            let allowed: Vec<_> = T::ALL.iter().map(|v| v.as_str()).collect();
            format!("invalid value '{}', expected one of: {}", s, allowed.join(", "))
        })
}

macro_rules! impl_display_from_str {
    ($($ty:ty),*) => {
        $(
            impl fmt::Display for $ty {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(self.as_str())
                }
            }

            impl FromStr for $ty {
                type Err = String;

                fn from_str(s: &str) -> Result<Self, Self::Err> {
                    parse_option(s)
                }
            }
        )*
    };
}

impl_display_from_str!(SummaryLength, SummaryStyle, SummaryFocus);

/// The configuration a summary was produced with. Copied into each
/// history record and never changed afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SummaryOptions {
    pub length: SummaryLength,
    pub style: SummaryStyle,
    pub focus: SummaryFocus,
}

impl SummaryOptions {
    pub fn new(length: SummaryLength, style: SummaryStyle, focus: SummaryFocus) -> Self {
        Self {
            length,
            style,
            focus,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_case_insensitively() {
        assert_eq!("Bullet".parse::<SummaryStyle>(), Ok(SummaryStyle::Bullet));
        assert_eq!(" long ".parse::<SummaryLength>(), Ok(SummaryLength::Long));
    }

    #[test]
    fn test_rejects_unknown_value_with_allowed_list() {
        let err = "legal".parse::<SummaryFocus>().unwrap_err();
        assert!(err.contains("general, academic, technical"));
    }

    #[test]
    fn test_serializes_lowercase() {
        let options = SummaryOptions::new(
            SummaryLength::Short,
            SummaryStyle::Bullet,
            SummaryFocus::Technical,
        );
        let json = serde_json::to_string(&options).unwrap();
        assert_eq!(
            json,
            r#"{"length":"short","style":"bullet","focus":"technical"}"#
        );
    }
}
