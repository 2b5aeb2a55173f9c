//! Custom-property discovery from CSS.
//!
//! Scans a stylesheet for custom-property declarations and records which
//! color modes they are declared for. Only the names matter; values are
//! skipped. Scoping follows the usual shadcn/Tailwind layout:
//!
//! | Where | Scope |
//! |-------|-------|
//! | `:root { ... }`, `html { ... }` | both modes |
//! | `.dark { ... }`, `:root.dark { ... }` | dark |
//! | `.light { ... }`, `:root.light { ... }` | light |
//! | `@media (prefers-color-scheme: dark) { :root { ... } }` | dark |
//! | `@layer`, `@supports`, other `@media` | transparent |
//! | `@keyframes`, `@font-face`, other at-rules | ignored |
//!
//! Declarations on any other selector (`.card { --inner: ... }`) are not
//! global and are ignored. A variable declared twice in the same scope is an
//! error.
//!
//! ```css
//! @layer base {
//!   :root {
//!     --background: 0 0% 100%;
//!     --radius: 0.5rem;
//!   }
//!   .dark {
//!     --background: 240 10% 3.9%;
//!   }
//! }
//! ```

use std::collections::{BTreeMap, BTreeSet};

use cssparser::{
    AtRuleParser, CowRcStr, DeclarationParser, ParseError, Parser, ParserInput, ParserState,
    QualifiedRuleParser, RuleBodyItemParser, RuleBodyParser, Token,
};

use crate::error::DocumentError;
use crate::theme::ColorMode;

use super::KnownVariables;

impl KnownVariables {
    /// Scans CSS text for custom-property declarations.
    ///
    /// See [`parse_css_variables`].
    pub fn from_css(css: &str) -> Result<Self, DocumentError> {
        parse_css_variables(css)
    }
}

/// Scans CSS text for custom-property declarations.
///
/// # Errors
///
/// - [`DocumentError::Parse`] if the stylesheet cannot be tokenized into rules
/// - [`DocumentError::DuplicateVariable`] if a name is declared twice in the
///   same scope
pub fn parse_css_variables(css: &str) -> Result<KnownVariables, DocumentError> {
    let mut input = ParserInput::new(css);
    let mut parser = Parser::new(&mut input);
    let mut scanner = VariableScanner::default();

    let errors: Vec<String> = cssparser::StyleSheetParser::new(&mut parser, &mut scanner)
        .filter_map(|result| result.err())
        .map(|(err, _)| describe(&err))
        .collect();

    if let Some(message) = errors.into_iter().next() {
        return Err(DocumentError::Parse {
            format: "css",
            message,
        });
    }
    if let Some(err) = scanner.error {
        return Err(err);
    }
    Ok(scanner.known)
}

fn describe(err: &ParseError<'_, ()>) -> String {
    format!(
        "line {}, column {}: {:?}",
        err.location.line + 1,
        err.location.column,
        err.kind
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Scope {
    Shared,
    Mode(ColorMode),
}

impl Scope {
    fn mode(self) -> Option<ColorMode> {
        match self {
            Scope::Shared => None,
            Scope::Mode(mode) => Some(mode),
        }
    }

    fn label(self) -> String {
        match self {
            Scope::Shared => "shared".to_string(),
            Scope::Mode(mode) => mode.to_string(),
        }
    }
}

enum AtPrelude {
    /// Scan the block's rules, under the given media color mode.
    Nested(Option<ColorMode>),
    /// Skip the block entirely.
    Skip,
}

#[derive(Default)]
struct VariableScanner {
    known: KnownVariables,
    seen: BTreeMap<Scope, BTreeSet<String>>,
    media_mode: Option<ColorMode>,
    error: Option<DocumentError>,
}

impl VariableScanner {
    fn root_scope(&self) -> Scope {
        match self.media_mode {
            Some(mode) => Scope::Mode(mode),
            None => Scope::Shared,
        }
    }

    fn scope_for(&self, selector: &str) -> Option<Scope> {
        match selector {
            ":root" | "html" => Some(self.root_scope()),
            ".dark" | ":root.dark" | "html.dark" => Some(Scope::Mode(ColorMode::Dark)),
            ".light" | ":root.light" | "html.light" => Some(Scope::Mode(ColorMode::Light)),
            _ => None,
        }
    }

    fn declare(&mut self, scope: Scope, name: String) {
        if self.seen.entry(scope).or_default().insert(name.clone()) {
            self.known.insert(scope.mode(), name);
        } else if self.error.is_none() {
            self.error = Some(DocumentError::DuplicateVariable {
                name,
                scope: scope.label(),
            });
        }
    }
}

impl<'i> QualifiedRuleParser<'i> for VariableScanner {
    type Prelude = Vec<Scope>;
    type QualifiedRule = ();
    type Error = ();

    fn parse_prelude<'t>(
        &mut self,
        input: &mut Parser<'i, 't>,
    ) -> Result<Self::Prelude, ParseError<'i, Self::Error>> {
        let mut selectors = Vec::new();
        let mut current = String::new();

        while let Ok(token) = input.next_including_whitespace() {
            match token {
                Token::Comma => selectors.push(std::mem::take(&mut current)),
                Token::Colon => current.push(':'),
                Token::Delim(c) => current.push(*c),
                Token::Ident(name) => current.push_str(name.as_ref()),
                Token::WhiteSpace(_) => current.push(' '),
                _ => current.push('?'),
            }
        }
        selectors.push(current);

        let mut scopes: Vec<Scope> = selectors
            .iter()
            .filter_map(|selector| self.scope_for(selector.trim()))
            .collect();
        scopes.sort();
        scopes.dedup();
        Ok(scopes)
    }

    fn parse_block<'t>(
        &mut self,
        scopes: Self::Prelude,
        _start: &ParserState,
        input: &mut Parser<'i, 't>,
    ) -> Result<Self::QualifiedRule, ParseError<'i, Self::Error>> {
        if scopes.is_empty() {
            while input.next().is_ok() {}
            return Ok(());
        }

        let mut declarations = DeclarationScanner;
        let names: Vec<String> = RuleBodyParser::new(input, &mut declarations)
            .flatten()
            .flatten()
            .collect();

        for scope in scopes {
            for name in &names {
                self.declare(scope, name.clone());
            }
        }
        Ok(())
    }
}

impl<'i> AtRuleParser<'i> for VariableScanner {
    type Prelude = AtPrelude;
    type AtRule = ();
    type Error = ();

    fn parse_prelude<'t>(
        &mut self,
        name: CowRcStr<'i>,
        input: &mut Parser<'i, 't>,
    ) -> Result<Self::Prelude, ParseError<'i, Self::Error>> {
        let prelude = if name.eq_ignore_ascii_case("media") {
            let mut found_mode: Option<ColorMode> = None;
            loop {
                match input.next() {
                    Ok(Token::ParenthesisBlock) => {
                        let nested = input.parse_nested_block(|input| {
                            input.expect_ident_matching("prefers-color-scheme")?;
                            input.expect_colon()?;
                            let value = input.expect_ident()?.clone();
                            match value.as_ref() {
                                "dark" => Ok(ColorMode::Dark),
                                "light" => Ok(ColorMode::Light),
                                _ => Err(input.new_custom_error::<(), ()>(())),
                            }
                        });
                        if let Ok(mode) = nested {
                            found_mode = Some(mode);
                        }
                    }
                    Ok(_) => {}
                    Err(_) => break,
                }
            }
            AtPrelude::Nested(found_mode.or(self.media_mode))
        } else if ["layer", "supports", "container"]
            .iter()
            .any(|transparent| name.eq_ignore_ascii_case(transparent))
        {
            while input.next().is_ok() {}
            AtPrelude::Nested(self.media_mode)
        } else {
            while input.next().is_ok() {}
            AtPrelude::Skip
        };
        Ok(prelude)
    }

    fn rule_without_block(
        &mut self,
        _prelude: Self::Prelude,
        _start: &ParserState,
    ) -> Result<Self::AtRule, ()> {
        // `@import`, `@tailwind base;` and friends declare nothing.
        Ok(())
    }

    fn parse_block<'t>(
        &mut self,
        prelude: Self::Prelude,
        _start: &ParserState,
        input: &mut Parser<'i, 't>,
    ) -> Result<Self::AtRule, ParseError<'i, Self::Error>> {
        let mode = match prelude {
            AtPrelude::Skip => {
                while input.next().is_ok() {}
                return Ok(());
            }
            AtPrelude::Nested(mode) => mode,
        };

        let outer = self.media_mode;
        self.media_mode = mode;
        let errors: Vec<String> = cssparser::StyleSheetParser::new(input, self)
            .filter_map(|result| result.err())
            .map(|(err, _)| describe(&err))
            .collect();
        self.media_mode = outer;

        if self.error.is_none() {
            self.error = errors.into_iter().next().map(|message| DocumentError::Parse {
                format: "css",
                message,
            });
        }
        Ok(())
    }
}

/// Yields the names of custom-property declarations; other properties map to `None`.
struct DeclarationScanner;

impl<'i> DeclarationParser<'i> for DeclarationScanner {
    type Declaration = Option<String>;
    type Error = ();

    fn parse_value<'t>(
        &mut self,
        name: CowRcStr<'i>,
        input: &mut Parser<'i, 't>,
    ) -> Result<Self::Declaration, ParseError<'i, Self::Error>> {
        while input.next().is_ok() {}
        let name: &str = name.as_ref();
        Ok(name.starts_with("--").then(|| name.to_string()))
    }
}

impl<'i> AtRuleParser<'i> for DeclarationScanner {
    type Prelude = ();
    type AtRule = Option<String>;
    type Error = ();
}

impl<'i> QualifiedRuleParser<'i> for DeclarationScanner {
    type Prelude = ();
    type QualifiedRule = Option<String>;
    type Error = ();
}

impl<'i> RuleBodyItemParser<'i, Option<String>, ()> for DeclarationScanner {
    fn parse_declarations(&self) -> bool {
        true
    }
    fn parse_qualified(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHADCN: &str = r#"
        @tailwind base;
        @tailwind components;

        @layer base {
          :root {
            --background: 0 0% 100%;
            --foreground: 240 10% 3.9%;
            --radius: 0.5rem;
          }

          .dark {
            --background: 240 10% 3.9%;
            --foreground: 0 0% 98%;
            --glow: 0 0 6px rgba(156, 207, 216, 1);
          }
        }
    "#;

    #[test]
    fn test_shared_and_dark_scopes() {
        let known = parse_css_variables(SHADCN).unwrap();

        for mode in ColorMode::ALL {
            assert!(known.contains(mode, "--background"));
            assert!(known.contains(mode, "--foreground"));
            assert!(known.contains(mode, "--radius"));
        }
        assert!(known.contains(ColorMode::Dark, "--glow"));
        assert!(!known.contains(ColorMode::Light, "--glow"));
    }

    #[test]
    fn test_media_query_scope() {
        let css = r#"
            :root { --text: #575279; }
            @media (prefers-color-scheme: dark) {
              :root { --text: #e0def4; --love: #eb6f92; }
            }
        "#;
        let known = parse_css_variables(css).unwrap();
        assert!(known.contains(ColorMode::Light, "--text"));
        assert!(known.contains(ColorMode::Dark, "--love"));
        assert!(!known.contains(ColorMode::Light, "--love"));
    }

    #[test]
    fn test_unrelated_selectors_and_properties_ignored() {
        let css = r#"
            :root { color: red; --ring: 240 5% 64.9%; }
            .card { --inner: 4px; }
            .dark .card { --nested: 1; }
            @keyframes spin { from { --spin: 0; } to { --spin: 1; } }
        "#;
        let known = parse_css_variables(css).unwrap();
        assert!(known.contains(ColorMode::Light, "--ring"));
        assert!(!known.contains(ColorMode::Light, "color"));
        assert!(!known.contains(ColorMode::Light, "--inner"));
        assert!(!known.contains(ColorMode::Dark, "--nested"));
        assert!(!known.contains(ColorMode::Light, "--spin"));
    }

    #[test]
    fn test_selector_lists() {
        let css = ":root, .light { --a: 1; } :root.dark { --b: 2; }";
        let known = parse_css_variables(css).unwrap();
        assert!(known.contains(ColorMode::Dark, "--a"));
        assert!(known.contains(ColorMode::Dark, "--b"));
        assert!(!known.contains(ColorMode::Light, "--b"));
    }

    #[test]
    fn test_duplicate_in_same_scope() {
        let css = ":root { --radius: 0.5rem; } :root { --radius: 1rem; }";
        let err = parse_css_variables(css).unwrap_err();
        assert_eq!(
            err,
            DocumentError::DuplicateVariable {
                name: "--radius".into(),
                scope: "shared".into(),
            }
        );
    }

    #[test]
    fn test_same_name_in_different_scopes_is_fine() {
        let css = ":root { --bg: #fff; } .dark { --bg: #000; } .light { --bg: #fafafa; }";
        assert!(parse_css_variables(css).is_ok());
    }

    #[test]
    fn test_from_css_constructor() {
        let known = KnownVariables::from_css(":root { --border: 240 5.9% 90%; }").unwrap();
        assert!(known.contains(ColorMode::Dark, "--border"));
    }

    #[test]
    fn test_empty_stylesheet() {
        let known = parse_css_variables("").unwrap();
        assert!(known.is_empty());
    }
}
