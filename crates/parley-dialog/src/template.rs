//! Model-family prompt templates.
//!
//! Each family's tokenizer expects a rigid delimiter grammar. A wrong or
//! missing delimiter does not error, it silently degrades generation, so
//! the strings below must match the model cards byte for byte.

use std::fmt;
use std::str::FromStr;

use parley_common::ConfigError;

/// Role delimiters for one model family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromptTemplate {
    pub begin_of_text: &'static str,
    pub begin_system: &'static str,
    pub begin_user: &'static str,
    pub end_user: &'static str,
    pub begin_assistant: &'static str,
    pub end_assistant: &'static str,
}

const LLAMA3: PromptTemplate = PromptTemplate {
    begin_of_text: "<|begin_of_text|>",
    begin_system: "<|start_header_id|>system<|end_header_id|>\n\n",
    begin_user: "<|start_header_id|>user<|end_header_id|>\n\n",
    end_user: "<|eot_id|>",
    begin_assistant: "<|start_header_id|>assistant<|end_header_id|>\n\n",
    end_assistant: "<|eot_id|>",
};

const LLAMA2: PromptTemplate = PromptTemplate {
    begin_of_text: "",
    begin_system: "<<SYS>>\n",
    begin_user: "<s>[INST] ",
    end_user: " [/INST] ",
    begin_assistant: "",
    end_assistant: "\n</s>\n",
};

/// Supported model families.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ModelFamily {
    #[default]
    Llama3,
    /// TAIDE fine-tune of Llama 3. Same grammar as `Llama3`.
    Llama3Taide,
    Llama2,
}

impl ModelFamily {
    pub const ALL: [ModelFamily; 3] = [Self::Llama3, Self::Llama3Taide, Self::Llama2];

    pub const fn template(self) -> &'static PromptTemplate {
        match self {
            Self::Llama3 | Self::Llama3Taide => &LLAMA3,
            Self::Llama2 => &LLAMA2,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Llama3 => "llama3",
            Self::Llama3Taide => "llama3-taide",
            Self::Llama2 => "llama2",
        }
    }
}

impl fmt::Display for ModelFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ModelFamily {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "llama3" => Ok(Self::Llama3),
            "llama3-taide" | "llama3_taide" | "taide" => Ok(Self::Llama3Taide),
            "llama2" => Ok(Self::Llama2),
            other => Err(ConfigError::ValidationError(format!(
                "unknown model family '{other}' (expected llama3, llama3-taide or llama2)"
            ))),
        }
    }
}

/// Prompt for the turn that opens a conversation and carries the system text.
pub fn format_first_turn(family: ModelFamily, system_text: &str, user_text: &str) -> String {
    let t = family.template();
    [
        t.begin_of_text,
        t.begin_system,
        system_text,
        t.begin_user,
        user_text,
        t.end_user,
        t.begin_assistant,
    ]
    .concat()
}

/// Prompt for every turn after the first. Closes the previous assistant reply.
pub fn format_subsequent_turn(family: ModelFamily, user_text: &str) -> String {
    let t = family.template();
    [
        t.end_assistant,
        t.begin_user,
        user_text,
        t.end_user,
        t.begin_assistant,
    ]
    .concat()
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn llama3_empty_first_turn_is_exact() {
        let expected = "<|begin_of_text|>\
<|start_header_id|>system<|end_header_id|>\n\n\
<|start_header_id|>user<|end_header_id|>\n\n\
<|eot_id|>\
<|start_header_id|>assistant<|end_header_id|>\n\n";
        assert_eq!(format_first_turn(ModelFamily::Llama3, "", ""), expected);
        assert_eq!(format_first_turn(ModelFamily::Llama3Taide, "", ""), expected);
    }

    #[test]
    fn llama2_empty_first_turn_is_exact() {
        assert_eq!(
            format_first_turn(ModelFamily::Llama2, "", ""),
            "<<SYS>>\n<s>[INST]  [/INST] "
        );
    }

    #[test]
    fn llama3_first_turn_with_text() {
        let prompt = format_first_turn(ModelFamily::Llama3, "You are helpful.", "Hi");
        assert_eq!(
            prompt,
            "<|begin_of_text|><|start_header_id|>system<|end_header_id|>\n\nYou are helpful.\
<|start_header_id|>user<|end_header_id|>\n\nHi<|eot_id|>\
<|start_header_id|>assistant<|end_header_id|>\n\n"
        );
    }

    #[test]
    fn llama2_subsequent_turn_with_text() {
        assert_eq!(
            format_subsequent_turn(ModelFamily::Llama2, "next"),
            "\n</s>\n<s>[INST] next [/INST] "
        );
    }

    #[test]
    fn subsequent_turn_shape() {
        for family in ModelFamily::ALL {
            let t = family.template();
            let prompt = format_subsequent_turn(family, "U2");
            let expected = format!(
                "{}{}U2{}{}",
                t.end_assistant, t.begin_user, t.end_user, t.begin_assistant
            );
            assert_eq!(prompt, expected, "family {family}");
        }
    }

    #[test]
    fn subsequent_turn_has_no_system_or_bot_markers() {
        for family in ModelFamily::ALL {
            let t = family.template();
            let prompt = format_subsequent_turn(family, "hello there");
            assert!(!prompt.contains(t.begin_system), "family {family}");
            if !t.begin_of_text.is_empty() {
                assert!(!prompt.contains(t.begin_of_text), "family {family}");
            }
        }
    }

    #[test]
    fn first_turn_ends_with_begin_assistant() {
        for family in ModelFamily::ALL {
            let prompt = format_first_turn(family, "S", "U1");
            assert!(prompt.ends_with(family.template().begin_assistant));
            assert!(prompt.starts_with(family.template().begin_of_text));
        }
    }

    #[test]
    fn family_from_str() {
        assert_eq!("llama3".parse::<ModelFamily>().unwrap(), ModelFamily::Llama3);
        assert_eq!("Llama3".parse::<ModelFamily>().unwrap(), ModelFamily::Llama3);
        assert_eq!(
            "llama3_taide".parse::<ModelFamily>().unwrap(),
            ModelFamily::Llama3Taide
        );
        assert_eq!("taide".parse::<ModelFamily>().unwrap(), ModelFamily::Llama3Taide);
        assert_eq!("llama2".parse::<ModelFamily>().unwrap(), ModelFamily::Llama2);

        let err = "mistral".parse::<ModelFamily>().unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
        assert!(err.to_string().contains("mistral"));
    }

    #[test]
    fn family_name_round_trips() {
        for family in ModelFamily::ALL {
            assert_eq!(family.name().parse::<ModelFamily>().unwrap(), family);
        }
    }

    #[test]
    fn default_family_is_llama3() {
        assert_eq!(ModelFamily::default(), ModelFamily::Llama3);
    }
}
