use serde::{Deserialize, Serialize};

pub const ROOT_SCOPE: &str = "__scope_default__";

pub const GENERATED_VALUES_KEY: &str = "generated-values";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceSpan {
    pub start: SourceLocation,
    pub end: SourceLocation,
}

impl SourceSpan {
    pub fn synthetic() -> Self {
        Self {
            start: SourceLocation { line: 1, column: 1 },
            end: SourceLocation { line: 1, column: 1 },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DedupPolicy {
    #[default]
    Global,
    PerScope,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    pub name: String,
    pub scope: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceholderForm {
    Bare,
    Qualified,
}

impl Reference {
    pub fn render(&self, form: PlaceholderForm) -> String {
        match form {
            PlaceholderForm::Bare => format!("{{{{{}}}}}", self.name),
            PlaceholderForm::Qualified => format!(
                "{{{{{}.{}.{}}}}}",
                GENERATED_VALUES_KEY, self.scope, self.name
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkupSegment {
    pub scope: String,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ResponseKind {
    StringResponse,
    RadioButtonResponse,
    OptionResponse,
    RankResponse,
    NumericalResponse,
    ReactionResponse,
    FormulaResponse,
    CustomResponse,
}

impl ResponseKind {
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "stringresponse" => Some(Self::StringResponse),
            "radiobuttonresponse" => Some(Self::RadioButtonResponse),
            "optionresponse" => Some(Self::OptionResponse),
            "rankresponse" => Some(Self::RankResponse),
            "numericalresponse" => Some(Self::NumericalResponse),
            "reactionresponse" => Some(Self::ReactionResponse),
            "formularesponse" => Some(Self::FormulaResponse),
            "customresponse" => Some(Self::CustomResponse),
            _ => None,
        }
    }

    pub fn tag(&self) -> &'static str {
        match self {
            Self::StringResponse => "stringresponse",
            Self::RadioButtonResponse => "radiobuttonresponse",
            Self::OptionResponse => "optionresponse",
            Self::RankResponse => "rankresponse",
            Self::NumericalResponse => "numericalresponse",
            Self::ReactionResponse => "reactionresponse",
            Self::FormulaResponse => "formularesponse",
            Self::CustomResponse => "customresponse",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseSite {
    pub answer_id: String,
    pub kind: ResponseKind,
    pub scope: String,
    pub prompt: String,
    pub attributes: Vec<(String, String)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum HintFileKind {
    Html,
    Image,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HintFile {
    pub href: String,
    pub name: String,
    pub kind: HintFileKind,
}

impl HintFile {
    pub fn from_href(href: &str) -> Self {
        let name = href.rsplit('/').next().unwrap_or(href).to_string();
        let kind = match name.rsplit_once('.').map(|(_, suffix)| suffix.to_ascii_lowercase()) {
            Some(suffix) if matches!(suffix.as_str(), "html" | "htm") => HintFileKind::Html,
            Some(suffix)
                if matches!(
                    suffix.as_str(),
                    "jpg" | "jpeg" | "png" | "gif" | "svg" | "tif" | "tiff"
                ) =>
            {
                HintFileKind::Image
            }
            _ => HintFileKind::Unknown,
        };
        Self {
            href: href.to_string(),
            name,
            kind,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HintSite {
    pub scope: String,
    pub answer_id: Option<String>,
    pub preceding_text: String,
    pub prompt: String,
    pub files: Vec<HintFile>,
}

#[cfg(test)]
mod types_tests {
    use super::*;

    #[test]
    fn placeholder_forms_render_scope_only_when_qualified() {
        let reference = Reference {
            name: "value-2".to_string(),
            scope: "scope_p1".to_string(),
        };
        assert_eq!(reference.render(PlaceholderForm::Bare), "{{value-2}}");
        assert_eq!(
            reference.render(PlaceholderForm::Qualified),
            "{{generated-values.scope_p1.value-2}}"
        );
    }

    #[test]
    fn response_kinds_round_trip_through_tags() {
        for tag in [
            "stringresponse",
            "radiobuttonresponse",
            "optionresponse",
            "rankresponse",
            "numericalresponse",
            "reactionresponse",
            "formularesponse",
            "customresponse",
        ] {
            let kind = ResponseKind::from_tag(tag).expect("known response tag");
            assert_eq!(kind.tag(), tag);
        }
        assert_eq!(ResponseKind::from_tag("hintgroup"), None);
    }

    #[test]
    fn hint_files_are_classified_by_suffix() {
        let page = HintFile::from_href("/res/msu/physics/help.HTM");
        assert_eq!(page.name, "help.HTM");
        assert_eq!(page.kind, HintFileKind::Html);
        assert_eq!(HintFile::from_href("plot.png").kind, HintFileKind::Image);
        assert_eq!(HintFile::from_href("/res/notes").kind, HintFileKind::Unknown);
        assert_eq!(HintFile::from_href("data.csv").kind, HintFileKind::Unknown);
    }

    #[test]
    fn dedup_policy_serializes_kebab_case() {
        let text = serde_json::to_string(&DedupPolicy::PerScope).expect("serialize");
        assert_eq!(text, "\"per-scope\"");
        assert_eq!(DedupPolicy::default(), DedupPolicy::Global);
    }
}
