//! Model-family adapters (spec.md §4.1, §9 "cyclic/polymorphic typing").
//!
//! The engine exposes a single `encode_query`/`encode_documents` contract;
//! which prefix (if any) gets prepended to the raw text is an adapter
//! decision chosen once, at construction time, by introspecting the
//! configured model name. Modeled as a sum type rather than a trait object
//! so the whole adapter table is exhaustively matched in one place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelFamily {
    /// `intfloat/e5-*`-style models: `"query: "` / `"passage: "` prefixes.
    QueryPrefix,
    /// Instruction-tuned embedders (e.g. `*-instruct`): an instruction
    /// string is prepended ahead of the text, pair-wise.
    Instruction,
    /// No prefixing; the text is encoded as-is.
    Plain,
}

impl ModelFamily {
    /// Chosen by substring match on the model name, mirroring the
    /// source's model-name introspection.
    pub fn from_model_name(model_name: &str) -> Self {
        let lower = model_name.to_lowercase();
        if lower.contains("e5") || lower.contains("query-prefix") {
            ModelFamily::QueryPrefix
        } else if lower.contains("instruct") || lower.contains("gte") {
            ModelFamily::Instruction
        } else {
            ModelFamily::Plain
        }
    }

    /// Default instruction used by the instruction-pair family when the
    /// caller doesn't supply one explicitly.
    pub const DEFAULT_INSTRUCTION: &'static str =
        "Represent this sentence for searching relevant passages:";

    /// Apply this family's prefixing rule to a single text.
    pub fn prepare(&self, text: &str, is_query: bool, instruction: Option<&str>) -> String {
        match self {
            ModelFamily::QueryPrefix => {
                let prefix = if is_query { "query: " } else { "passage: " };
                format!("{prefix}{text}")
            }
            ModelFamily::Instruction => {
                let instr = instruction.unwrap_or(Self::DEFAULT_INSTRUCTION);
                format!("{instr}\n{text}")
            }
            ModelFamily::Plain => text.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn family_detection_by_name() {
        assert_eq!(ModelFamily::from_model_name("intfloat/e5-large-v2"), ModelFamily::QueryPrefix);
        assert_eq!(ModelFamily::from_model_name("thenlper/gte-base"), ModelFamily::Instruction);
        assert_eq!(ModelFamily::from_model_name("sentence-transformers/all-MiniLM-L6-v2"), ModelFamily::Plain);
    }

    #[test]
    fn query_prefix_family_distinguishes_query_from_passage() {
        let f = ModelFamily::QueryPrefix;
        assert_eq!(f.prepare("red sneakers", true, None), "query: red sneakers");
        assert_eq!(f.prepare("red sneakers", false, None), "passage: red sneakers");
    }

    #[test]
    fn instruction_family_prepends_default_instruction() {
        let f = ModelFamily::Instruction;
        let out = f.prepare("red sneakers", true, None);
        assert!(out.starts_with(ModelFamily::DEFAULT_INSTRUCTION));
        assert!(out.ends_with("red sneakers"));
    }

    #[test]
    fn plain_family_is_passthrough() {
        assert_eq!(ModelFamily::Plain.prepare("hi", true, None), "hi");
    }
}
