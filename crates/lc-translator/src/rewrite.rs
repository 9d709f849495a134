use std::collections::BTreeSet;

use lc_core::ConvertError;

use crate::lexer::{is_numeric_literal, tokenize, Token, TokenKind};
use crate::reference::{builtin_symbol, scalar_symbol, vector_symbol};
use crate::template::{figure_literal, is_image_markup, quote_literal, template_string};

pub fn translate_script(source: &str) -> Result<String, ConvertError> {
    let tokens = tokenize(source)?;
    Ok(rewrite(&tokens))
}

pub fn rewrite(tokens: &[Token]) -> String {
    let mut writer = ScriptWriter::new();
    let mut skip_next = false;

    for (index, token) in tokens.iter().enumerate() {
        if std::mem::take(&mut skip_next) {
            continue;
        }
        let next = tokens.get(index + 1).map(|token| token.kind);
        let opens_list = std::mem::take(&mut writer.list_open_pending);
        let statement_start = std::mem::replace(&mut writer.statement_start, false);
        if statement_start
            && !matches!(token.kind, TokenKind::LineComment | TokenKind::BlockComment)
        {
            writer.begin_statement(token);
        }

        match token.kind {
            TokenKind::Identifier => writer.identifier(token, next, statement_start),
            TokenKind::Integer | TokenKind::FloatFixed | TokenKind::FloatScientific => {
                writer.word(&normalize_number(&token.text));
            }
            TokenKind::Str => writer.string(token),
            TokenKind::Keyword => writer.keyword(&token.text),
            TokenKind::Bareword => writer.word(&quote_literal(&token.text)),
            TokenKind::Assign => {
                writer.binary("=");
                writer.list_open_pending = std::mem::take(&mut writer.list_target);
            }
            TokenKind::Slash if next == Some(TokenKind::Assign) => {
                writer.divide_assign();
                skip_next = true;
            }
            TokenKind::Plus
            | TokenKind::Minus
            | TokenKind::Star
            | TokenKind::Slash
            | TokenKind::Percent
            | TokenKind::Power
            | TokenKind::Concat => {
                let operator = match token.kind {
                    TokenKind::Concat => "+",
                    _ => token.text.as_str(),
                };
                if next == Some(TokenKind::Assign) {
                    writer.binary(&format!("{}=", operator));
                    skip_next = true;
                } else {
                    writer.binary(operator);
                }
            }
            TokenKind::NotEqual
            | TokenKind::Equal
            | TokenKind::Less
            | TokenKind::Greater
            | TokenKind::LessEqual
            | TokenKind::GreaterEqual
            | TokenKind::And
            | TokenKind::Or => writer.binary(&token.text),
            TokenKind::Not => writer.symbol("!"),
            TokenKind::LeftParen => writer.open_paren(opens_list),
            TokenKind::RightParen => writer.close_paren(),
            TokenKind::LeftBracket => writer.symbol("["),
            TokenKind::RightBracket => writer.symbol("]"),
            TokenKind::LeftBrace => {
                if !writer.out.ends_with([' ', '\n']) && !writer.out.is_empty() {
                    writer.out.push(' ');
                }
                writer.symbol("{");
                writer.line_end();
                writer.blocks.push(BTreeSet::new());
                writer.statement_start = true;
            }
            TokenKind::RightBrace => {
                writer.close_pending();
                writer.line_end();
                writer.symbol("}");
                writer.line_end();
                if writer.blocks.len() > 1 {
                    writer.blocks.pop();
                }
                writer.statement_start = true;
            }
            TokenKind::Comma => writer.comma(),
            TokenKind::Semicolon => {
                writer.close_pending();
                writer.symbol(";");
                writer.line_end();
                writer.statement_start = true;
            }
            TokenKind::Range => writer.range(),
            TokenKind::LineComment => {
                writer.line_comment(&token.text);
                writer.statement_start = statement_start;
            }
            TokenKind::BlockComment => {
                writer.block_comment(&token.text);
                writer.statement_start = statement_start;
            }
            TokenKind::Whitespace => {}
        }
    }

    writer.close_pending();
    writer.out
}

enum Paren {
    Group,
    List(ListFrame),
}

// Offsets into the output of an `@name = (...)` list being written.
struct ListFrame {
    open: usize,
    item: usize,
    items: usize,
    ranged: bool,
    range_open: bool,
}

struct ScriptWriter {
    out: String,
    after_word: bool,
    statement_start: bool,
    statement_offset: usize,
    top_statement_offset: usize,
    declare_next: bool,
    list_target: bool,
    list_open_pending: bool,
    pending_closes: usize,
    parens: Vec<Paren>,
    // Declared names per open block; index 0 is the script's top level.
    blocks: Vec<BTreeSet<String>>,
    known: BTreeSet<String>,
}

impl ScriptWriter {
    fn new() -> Self {
        Self {
            out: String::new(),
            after_word: false,
            statement_start: true,
            statement_offset: 0,
            top_statement_offset: 0,
            declare_next: false,
            list_target: false,
            list_open_pending: false,
            pending_closes: 0,
            parens: Vec::new(),
            blocks: vec![BTreeSet::new()],
            known: BTreeSet::new(),
        }
    }

    fn begin_statement(&mut self, token: &Token) {
        self.statement_offset = self.out.len();
        let continues_chain =
            token.kind == TokenKind::Keyword && matches!(token.text.as_str(), "else" | "elsif");
        if self.blocks.len() == 1 && !continues_chain {
            self.top_statement_offset = self.out.len();
        }
    }

    fn word(&mut self, text: &str) {
        if self.after_word {
            self.out.push(' ');
        }
        self.out.push_str(text);
        self.after_word = true;
    }

    fn symbol(&mut self, text: &str) {
        self.out.push_str(text);
        self.after_word = false;
    }

    fn binary(&mut self, operator: &str) {
        if !self.out.is_empty() && !self.out.ends_with([' ', '\n', '(', '[']) {
            self.out.push(' ');
        }
        self.out.push_str(operator);
        self.out.push(' ');
        self.after_word = false;
    }

    fn line_end(&mut self) {
        if !self.out.is_empty() && !self.out.ends_with('\n') {
            self.out.push('\n');
        }
        self.after_word = false;
    }

    fn keyword(&mut self, keyword: &str) {
        let emitted = match keyword {
            "my" => {
                self.declare_next = true;
                "let"
            }
            "elsif" => "else if",
            other => other,
        };
        if self.after_word {
            self.out.push(' ');
        }
        self.out.push_str(emitted);
        self.out.push(' ');
        self.after_word = false;
    }

    fn is_declared(&self, symbol: &str) -> bool {
        self.blocks.iter().any(|block| block.contains(symbol))
    }

    fn identifier(&mut self, token: &Token, next: Option<TokenKind>, statement_start: bool) {
        let name = &token.text[1..];
        let symbol = match token.sigil() {
            Some('@') => vector_symbol(name),
            Some('&') => builtin_symbol(name),
            _ if next == Some(TokenKind::LeftBracket) => vector_symbol(name),
            _ => scalar_symbol(name),
        };

        let assigned = next == Some(TokenKind::Assign);
        if std::mem::take(&mut self.declare_next) {
            if let Some(block) = self.blocks.last_mut() {
                block.insert(symbol.clone());
            }
        } else if statement_start && assigned && !self.is_declared(&symbol) {
            if self.blocks.len() == 1 {
                self.word("let");
            } else {
                self.hoist(&symbol);
            }
            if let Some(top) = self.blocks.first_mut() {
                top.insert(symbol.clone());
            }
        }
        self.list_target = assigned && token.sigil() == Some('@');

        self.word(&symbol);
        self.known.insert(symbol);
    }

    // Keeps a value an earlier script left in the shared scope.
    fn hoist(&mut self, symbol: &str) {
        let line = format!(
            "let {0} = if is_def_var(\"{0}\") {{ {0} }} else {{ () }};\n",
            symbol
        );
        let at = self.top_statement_offset;
        self.out.insert_str(at, &line);

        let shift = line.len();
        self.top_statement_offset += shift;
        if self.statement_offset >= at {
            self.statement_offset += shift;
        }
        for paren in &mut self.parens {
            if let Paren::List(frame) = paren {
                if frame.open >= at {
                    frame.open += shift;
                    frame.item += shift;
                }
            }
        }
    }

    fn divide_assign(&mut self) {
        let target = self
            .out
            .get(self.statement_offset..)
            .unwrap_or_default()
            .trim()
            .to_string();
        self.binary("=");
        self.word(&target);
        self.binary("/");
        self.symbol("(");
        self.pending_closes += 1;
    }

    fn close_pending(&mut self) {
        for _ in 0..std::mem::take(&mut self.pending_closes) {
            self.out.push(')');
        }
    }

    fn open_paren(&mut self, list: bool) {
        if list {
            let open = self.out.len();
            self.symbol("[");
            self.parens.push(Paren::List(ListFrame {
                open,
                item: self.out.len(),
                items: 1,
                ranged: false,
                range_open: false,
            }));
        } else {
            self.parens.push(Paren::Group);
            self.symbol("(");
        }
    }

    fn close_paren(&mut self) {
        let Some(Paren::List(frame)) = self.parens.pop() else {
            self.symbol(")");
            return;
        };
        if frame.range_open {
            self.out.push(')');
        }
        if frame.ranged && frame.items == 1 {
            self.out.remove(frame.open);
        } else if frame.ranged {
            self.out.push(']');
            self.out.insert_str(frame.open, "flatten_list(");
            self.out.push(')');
        } else {
            self.out.push(']');
        }
        self.after_word = false;
    }

    fn comma(&mut self) {
        if let Some(Paren::List(frame)) = self.parens.last_mut() {
            if std::mem::take(&mut frame.range_open) {
                self.out.push(')');
            }
            self.out.push_str(", ");
            frame.item = self.out.len();
            frame.items += 1;
            self.after_word = false;
            return;
        }
        self.symbol(", ");
    }

    fn range(&mut self) {
        if let Some(Paren::List(frame)) = self.parens.last_mut() {
            self.out.insert_str(frame.item, "inclusive_range(");
            frame.ranged = true;
            frame.range_open = true;
            self.out.push_str(", ");
            self.after_word = false;
            return;
        }
        self.symbol("..=");
    }

    fn string(&mut self, token: &Token) {
        let body = token.string_body().unwrap_or_default();
        let rendered = if is_numeric_literal(body) {
            normalize_number(body)
        } else if is_image_markup(body) {
            figure_literal(body)
        } else {
            template_string(body, &self.known)
        };
        self.word(&rendered);
    }

    fn line_comment(&mut self, text: &str) {
        self.line_end();
        let body = text.trim_start_matches('#').trim_end();
        self.out.push_str("//");
        self.out.push_str(body);
        self.out.push('\n');
    }

    fn block_comment(&mut self, text: &str) {
        self.line_end();
        let body = text.strip_prefix('=').unwrap_or(text);
        for line in body.lines() {
            if line.contains("=cut") {
                break;
            }
            let comment = format!("// {}", line);
            self.out.push_str(comment.trim_end());
            self.out.push('\n');
        }
    }
}

fn normalize_number(text: &str) -> String {
    let sign_len = usize::from(text.starts_with(['+', '-']));
    let (sign, number) = text.split_at(sign_len);
    let mut out = String::from(sign);
    if number.starts_with('.') {
        out.push('0');
    }
    match number.find(['e', 'E']) {
        Some(position) => {
            let (mantissa, exponent) = number.split_at(position);
            out.push_str(mantissa);
            if !mantissa.contains('.') {
                out.push_str(".0");
            } else if mantissa.ends_with('.') {
                out.push('0');
            }
            out.push_str(exponent);
        }
        None => out.push_str(number),
    }
    out
}

#[cfg(test)]
mod rewrite_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn translate(source: &str) -> String {
        translate_script(source).expect("script should translate")
    }

    #[test]
    fn declares_on_first_assignment_only() {
        assert_eq!(
            translate("$x = 5; $x = $x + 1;"),
            "let scalar_x = 5;\nscalar_x = scalar_x + 1;\n"
        );
    }

    #[test]
    fn my_becomes_let() {
        assert_eq!(translate("my $y = 2;"), "let scalar_y = 2;\n");
    }

    #[test]
    fn array_lists_become_brackets() {
        assert_eq!(
            translate("@v = (1, 2, 3); $z = $v[1];"),
            "let vector_v = [1, 2, 3];\nlet scalar_z = vector_v[1];\n"
        );
    }

    #[test]
    fn builtins_and_grouping_parentheses() {
        assert_eq!(
            translate("$r = &random(1, 10, 1) * ($a - 2);"),
            "let scalar_r = builtin_random(1, 10, 1) * (scalar_a - 2);\n"
        );
    }

    #[test]
    fn concatenation_becomes_addition() {
        assert_eq!(
            translate("$s = \"a\" . $t; $s .= \"b\";"),
            "let scalar_s = \"a\" + scalar_t;\nscalar_s += \"b\";\n"
        );
    }

    #[test]
    fn numeric_strings_and_barewords() {
        assert_eq!(
            translate("$n = \"3.5\"; $u = meters; $f = .5; $e = 2e3;"),
            "let scalar_n = 3.5;\nlet scalar_u = \"meters\";\nlet scalar_f = 0.5;\nlet scalar_e = 2.0e3;\n"
        );
    }

    #[test]
    fn strings_interpolate_known_locals() {
        assert_eq!(
            translate("$x = 1; $s = \"x=$x, y=$y\";"),
            "let scalar_x = 1;\nlet scalar_s = interpolate(\"x={}, y=$y\", [scalar_x]);\n"
        );
    }

    #[test]
    fn conditionals_keep_their_blocks() {
        assert_eq!(
            translate("$a = 1; $b = 0; if ($a > 0) { $b = 1; } elsif ($a < 0) { $b = 2; } else { $b = 3; }"),
            "let scalar_a = 1;\nlet scalar_b = 0;\nif (scalar_a > 0) {\nscalar_b = 1;\n}\nelse if (scalar_a < 0) {\nscalar_b = 2;\n}\nelse {\nscalar_b = 3;\n}\n"
        );
    }

    #[test]
    fn branch_assignments_are_hoisted_to_top_level() {
        assert_eq!(
            translate("$a = 1; if ($a > 0) { $sign = \"plus\"; } else { $sign = \"minus\"; }"),
            "let scalar_a = 1;\nlet scalar_sign = if is_def_var(\"scalar_sign\") { scalar_sign } else { () };\nif (scalar_a > 0) {\nscalar_sign = \"plus\";\n}\nelse {\nscalar_sign = \"minus\";\n}\n"
        );
    }

    #[test]
    fn hoisted_declarations_precede_the_whole_conditional_chain() {
        assert_eq!(
            translate("if ($a) { $x = 1; } else { $y = 2; }"),
            "let scalar_x = if is_def_var(\"scalar_x\") { scalar_x } else { () };\nlet scalar_y = if is_def_var(\"scalar_y\") { scalar_y } else { () };\nif (scalar_a) {\nscalar_x = 1;\n}\nelse {\nscalar_y = 2;\n}\n"
        );
    }

    #[test]
    fn my_inside_a_block_stays_block_scoped() {
        assert_eq!(
            translate("if ($a) { my $t = 1; $u = $t; } $t = 2;"),
            "let scalar_u = if is_def_var(\"scalar_u\") { scalar_u } else { () };\nif (scalar_a) {\nlet scalar_t = 1;\nscalar_u = scalar_t;\n}\nlet scalar_t = 2;\n"
        );
    }

    #[test]
    fn divide_assign_expands_through_the_division_operator() {
        assert_eq!(
            translate("$x = 9; $x /= $n + 1;"),
            "let scalar_x = 9;\nscalar_x = scalar_x / (scalar_n + 1);\n"
        );
    }

    #[test]
    fn list_ranges_expand_inclusively() {
        assert_eq!(
            translate("@v = (1..5); @w = (0, 2..4, $k); $n = $v[4];"),
            "let vector_v = inclusive_range(1, 5);\nlet vector_w = flatten_list([0, inclusive_range(2, 4), scalar_k]);\nlet scalar_n = vector_v[4];\n"
        );
    }

    #[test]
    fn ranges_outside_lists_are_inclusive() {
        assert_eq!(translate("$r = (1..3);"), "let scalar_r = (1..=3);\n");
    }

    #[test]
    fn comments_are_preserved() {
        assert_eq!(
            translate("# setup\n$x = 1;\n=pod\nfirst\nsecond\n=cut\n$y = 2;"),
            "// setup\nlet scalar_x = 1;\n// pod\n// first\n// second\nlet scalar_y = 2;\n"
        );
    }

    #[test]
    fn image_strings_become_figures() {
        assert_eq!(
            translate("$img = \"<img src=\\\"/res/u/plot.gif\\\">\";"),
            "let scalar_img = \"<pl-figure file-name=\\\"plot.gif\\\" directory=\\\"clientFilesQuestion\\\"></pl-figure>\";\n"
        );
    }

    #[test]
    fn negative_literals_keep_their_sign() {
        assert_eq!(translate("$d = $x-1;"), "let scalar_d = scalar_x -1;\n");
    }

    #[test]
    fn lexer_failures_surface_as_convert_errors() {
        let error = translate_script("$s = 'open").expect_err("unterminated");
        assert_eq!(error.code(), "LEX_UNTERMINATED_STRING");
    }
}
