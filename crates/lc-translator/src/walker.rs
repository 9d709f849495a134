use std::collections::BTreeSet;

use lc_core::{
    ConvertError, HintFile, HintSite, MarkupSegment, PlaceholderForm, ResponseKind,
    ResponseSite, ROOT_SCOPE,
};
use lc_parser::{XmlElementNode, XmlNode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::context::TranslationContext;
use crate::reduce::reduce_embedded_exprs;
use crate::rewrite::translate_script;

const STRUCTURAL_TAGS: [&str; 8] = [
    "root",
    "problem",
    "startouttext",
    "endouttext",
    "starttext",
    "endtext",
    "allow",
    "parameter",
];

const HINT_TAG: &str = "hintgroup";

const VOID_TAGS: [&str; 6] = ["br", "hr", "img", "input", "meta", "link"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementRole {
    Script,
    Part,
    Structural,
    Response(ResponseKind),
    Hint,
    Markup,
}

impl ElementRole {
    pub fn of(tag: &str) -> Self {
        match tag {
            "script" => Self::Script,
            "part" => Self::Part,
            HINT_TAG => Self::Hint,
            _ if STRUCTURAL_TAGS.contains(&tag) => Self::Structural,
            _ => ResponseKind::from_tag(tag).map_or(Self::Markup, Self::Response),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalkOutput {
    pub segments: Vec<MarkupSegment>,
    pub responses: Vec<ResponseSite>,
    pub hints: Vec<HintSite>,
}

enum WorkItem<'a> {
    Element(&'a XmlElementNode),
    Text(&'a str),
    CloseMarkup(String),
    PopScope,
}

pub fn walk_document(
    context: &mut TranslationContext,
    root: &XmlElementNode,
) -> Result<WalkOutput, ConvertError> {
    let mut walker = Walker::new(context);
    walker.run(root)?;
    Ok(walker.output)
}

struct Walker<'c> {
    context: &'c mut TranslationContext,
    scopes: Vec<String>,
    used_scope_ids: BTreeSet<String>,
    buffer: String,
    part_count: usize,
    answer_count: usize,
    output: WalkOutput,
}

impl<'c> Walker<'c> {
    fn new(context: &'c mut TranslationContext) -> Self {
        context.set_script(ROOT_SCOPE, "");
        Self {
            context,
            scopes: vec![ROOT_SCOPE.to_string()],
            used_scope_ids: BTreeSet::from([ROOT_SCOPE.to_string()]),
            buffer: String::new(),
            part_count: 0,
            answer_count: 0,
            output: WalkOutput::default(),
        }
    }

    fn current_scope(&self) -> &str {
        self.scopes.last().map_or(ROOT_SCOPE, String::as_str)
    }

    fn run(&mut self, root: &XmlElementNode) -> Result<(), ConvertError> {
        let mut work = vec![WorkItem::Element(root)];

        while let Some(item) = work.pop() {
            match item {
                WorkItem::Text(text) => self.buffer.push_str(text),
                WorkItem::CloseMarkup(tag) => self.buffer.push_str(&tag),
                WorkItem::PopScope => {
                    self.flush()?;
                    self.scopes.pop();
                }
                WorkItem::Element(element) => match ElementRole::of(&element.name) {
                    ElementRole::Script => {
                        let script = translate_script(&element.text_content())?;
                        let scope = self.current_scope().to_string();
                        debug!(scope = %scope, "registered script");
                        self.context.set_script(&scope, script);
                    }
                    ElementRole::Part => {
                        let scope = self.part_scope_id(element)?;
                        self.flush()?;
                        self.context.set_script(&scope, "");
                        self.scopes.push(scope);
                        work.push(WorkItem::PopScope);
                        push_children(&mut work, element);
                    }
                    ElementRole::Structural => push_children(&mut work, element),
                    ElementRole::Response(kind) => self.response(kind, element)?,
                    ElementRole::Hint => {
                        let preceding = std::mem::take(&mut self.buffer);
                        if !self.hint(element, &preceding, None)? {
                            self.buffer = preceding;
                        }
                    }
                    ElementRole::Markup => {
                        self.buffer.push_str(&open_tag(element));
                        if element.children.is_empty() && VOID_TAGS.contains(&element.name.as_str()) {
                            continue;
                        }
                        work.push(WorkItem::CloseMarkup(format!("</{}>", element.name)));
                        push_children(&mut work, element);
                    }
                },
            }
        }

        self.flush()
    }

    fn part_scope_id(&mut self, element: &XmlElementNode) -> Result<String, ConvertError> {
        self.part_count += 1;
        let scope = match element.attribute("id") {
            Some(id) => format!("scope_{}", id),
            None => format!("scope_part{}", self.part_count),
        };
        if !self.used_scope_ids.insert(scope.clone()) {
            return Err(ConvertError::DuplicateScopeId {
                scope,
                span: Some(element.location.clone()),
            });
        }
        Ok(scope)
    }

    fn response(&mut self, kind: ResponseKind, element: &XmlElementNode) -> Result<(), ConvertError> {
        let scope = self.current_scope().to_string();
        let prompt_text = std::mem::take(&mut self.buffer);
        let prompt = reduce_embedded_exprs(self.context, &prompt_text, &scope, PlaceholderForm::Qualified)?;

        let mut attributes = Vec::with_capacity(element.attributes.len());
        for (name, value) in &element.attributes {
            let reduced = reduce_embedded_exprs(self.context, value, &scope, PlaceholderForm::Bare)?;
            attributes.push((name.clone(), reduced));
        }

        self.answer_count += 1;
        let answer_id = format!("ans-{}", self.answer_count);
        debug!(scope = %scope, answer = %answer_id, kind = kind.tag(), "recorded response");
        self.output.responses.push(ResponseSite {
            answer_id: answer_id.clone(),
            kind,
            scope,
            prompt,
            attributes,
        });

        if let Some(hint) = element.element_children().find(|child| child.name == HINT_TAG) {
            self.hint(hint, "", Some(answer_id))?;
        }
        Ok(())
    }

    fn hint(
        &mut self,
        element: &XmlElementNode,
        preceding: &str,
        answer_id: Option<String>,
    ) -> Result<bool, ConvertError> {
        let scope = self.current_scope().to_string();
        let text = element.deep_text().split_whitespace().collect::<Vec<_>>().join(" ");
        let files: Vec<HintFile> = element
            .element_children()
            .filter(|child| child.name == "a")
            .filter_map(|child| child.attribute("href"))
            .map(HintFile::from_href)
            .collect();
        if text.is_empty() && files.is_empty() {
            debug!(scope = %scope, "skipped empty hint");
            return Ok(false);
        }

        let prompt = reduce_embedded_exprs(self.context, &text, &scope, PlaceholderForm::Qualified)?;
        let preceding_text =
            reduce_embedded_exprs(self.context, preceding, &scope, PlaceholderForm::Qualified)?;
        self.output.hints.push(HintSite {
            scope,
            answer_id,
            preceding_text,
            prompt,
            files,
        });
        Ok(true)
    }

    fn flush(&mut self) -> Result<(), ConvertError> {
        let text = std::mem::take(&mut self.buffer);
        if text.trim().is_empty() {
            return Ok(());
        }
        let scope = self.current_scope().to_string();
        let reduced = reduce_embedded_exprs(self.context, &text, &scope, PlaceholderForm::Qualified)?;
        self.output.segments.push(MarkupSegment {
            scope,
            text: reduced,
        });
        Ok(())
    }
}

fn push_children<'a>(work: &mut Vec<WorkItem<'a>>, element: &'a XmlElementNode) {
    for child in element.children.iter().rev() {
        work.push(match child {
            XmlNode::Element(child) => WorkItem::Element(child),
            XmlNode::Text(text) => WorkItem::Text(&text.value),
        });
    }
}

fn open_tag(element: &XmlElementNode) -> String {
    let mut tag = format!("<{}", element.name);
    for (name, value) in &element.attributes {
        tag.push_str(&format!(" {}=\"{}\"", name, value.replace('"', "&quot;")));
    }
    if element.children.is_empty() && VOID_TAGS.contains(&element.name.as_str()) {
        tag.push_str("/>");
    } else {
        tag.push('>');
    }
    tag
}
