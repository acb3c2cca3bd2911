//! DSL AST types and `syn::parse::Parse` implementations.
//!
//! Parses the word-based spec syntax into a structured AST.

use proc_macro2::TokenStream;
use syn::parse::{Parse, ParseStream};
use syn::{braced, parenthesized, Ident, LitStr, Result, Token};

// ============================================================================
// AST types
// ============================================================================

/// Top-level input: an optional `suite "Name";` header, then DSL items.
#[derive(Debug)]
pub struct SpecInput {
    pub suite_name: Option<LitStr>,
    pub items: Vec<DslItem>,
}

/// A single DSL node.
#[derive(Debug)]
pub enum DslItem {
    Describe(ScopeBlock),
    Share(ScopeBlock),
    BehavesLike(LitStr),
    Example(ExampleBlock),
    Hook(HookBlock),
}

/// `describe "name" { ... }` / `context` / `when` / `share`.
#[derive(Debug)]
pub struct ScopeBlock {
    /// The keyword as written; it is also the builder method called.
    pub keyword: Ident,
    pub name: LitStr,
    pub items: Vec<DslItem>,
}

/// `it "text" { ... }` / `specify "text" { ... }` / `ignore` / `xit`.
#[derive(Debug)]
pub struct ExampleBlock {
    pub keyword: Ident,
    pub text: LitStr,
    pub ignored: bool,
    pub tags: Vec<LitStr>,
    pub body: TokenStream,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookKind {
    BeforeEach,
    AfterEach,
    BeforeAll,
    AfterAll,
}

/// `before_each { ... }` and the other three hooks.
#[derive(Debug)]
pub struct HookBlock {
    pub kind: HookKind,
    pub body: TokenStream,
}

// ============================================================================
// Parsing
// ============================================================================

impl Parse for SpecInput {
    fn parse(input: ParseStream) -> Result<Self> {
        let suite_name = if starts_with_keyword(input, "suite") {
            let _: Ident = input.parse()?;
            let name: LitStr = input.parse()?;
            input.parse::<Token![;]>()?;
            Some(name)
        } else {
            None
        };
        let items = parse_items(input)?;
        Ok(SpecInput { suite_name, items })
    }
}

fn starts_with_keyword(input: ParseStream, keyword: &str) -> bool {
    let fork = input.fork();
    matches!(fork.parse::<Ident>(), Ok(ident) if ident == keyword)
}

/// Parse a sequence of DSL items until the stream is exhausted.
fn parse_items(input: ParseStream) -> Result<Vec<DslItem>> {
    let mut items = Vec::new();
    while !input.is_empty() {
        items.push(input.parse::<DslItem>()?);
    }
    Ok(items)
}

impl Parse for DslItem {
    fn parse(input: ParseStream) -> Result<Self> {
        let ident: Ident = input.parse()?;
        let name = ident.to_string();

        match name.as_str() {
            "describe" | "context" | "when" => {
                Ok(DslItem::Describe(parse_scope_block(input, ident)?))
            }
            "share" => Ok(DslItem::Share(parse_scope_block(input, ident)?)),
            "behaves_like" => {
                let name: LitStr = input.parse()?;
                input.parse::<Token![;]>()?;
                Ok(DslItem::BehavesLike(name))
            }

            "it" | "specify" => Ok(DslItem::Example(parse_example_block(input, ident, false)?)),
            "ignore" | "xit" => Ok(DslItem::Example(parse_example_block(input, ident, true)?)),

            "before_each" => Ok(DslItem::Hook(parse_hook_block(input, HookKind::BeforeEach)?)),
            "after_each" => Ok(DslItem::Hook(parse_hook_block(input, HookKind::AfterEach)?)),
            "before_all" => Ok(DslItem::Hook(parse_hook_block(input, HookKind::BeforeAll)?)),
            "after_all" => Ok(DslItem::Hook(parse_hook_block(input, HookKind::AfterAll)?)),

            _ => Err(syn::Error::new(
                ident.span(),
                format!(
                    "unknown DSL keyword `{name}`. Expected one of: \
                     describe, context, when, share, behaves_like, it, specify, \
                     ignore, xit, before_each, after_each, before_all, after_all"
                ),
            )),
        }
    }
}

// ============================================================================
// Block parsers
// ============================================================================

/// Parse: `"name" { items... }`
fn parse_scope_block(input: ParseStream, keyword: Ident) -> Result<ScopeBlock> {
    let name: LitStr = input.parse()?;
    let content;
    braced!(content in input);
    let items = parse_items(&content)?;
    Ok(ScopeBlock {
        keyword,
        name,
        items,
    })
}

/// Parse: `"text" [tags("a", ...)] { body }`
fn parse_example_block(input: ParseStream, keyword: Ident, ignored: bool) -> Result<ExampleBlock> {
    let text: LitStr = input.parse()?;

    let mut tags = Vec::new();
    while !input.peek(syn::token::Brace) {
        let decorator: Ident = input.parse()?;
        match decorator.to_string().as_str() {
            "tags" => {
                let content;
                parenthesized!(content in input);
                while !content.is_empty() {
                    tags.push(content.parse::<LitStr>()?);
                    if !content.is_empty() {
                        content.parse::<Token![,]>()?;
                    }
                }
            }
            other => {
                return Err(syn::Error::new(
                    decorator.span(),
                    format!("unknown decorator `{other}`. Expected `tags`"),
                ));
            }
        }
    }

    let body_content;
    braced!(body_content in input);
    let body: TokenStream = body_content.parse()?;

    Ok(ExampleBlock {
        keyword,
        text,
        ignored,
        tags,
        body,
    })
}

/// Parse: `{ body }`
fn parse_hook_block(input: ParseStream, kind: HookKind) -> Result<HookBlock> {
    let content;
    braced!(content in input);
    let body: TokenStream = content.parse()?;
    Ok(HookBlock { kind, body })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_header_scopes_and_examples() {
        let input: SpecInput = syn::parse_str(
            r#"
            suite "StackSpec";
            share "a non-empty stack" {
                it "return the top on peek" { }
            }
            describe "A Stack" {
                before_each { }
                it "pop" tags("fast", "unit") { assert!(true); }
                xit "grow" { }
                behaves_like "a non-empty stack";
            }
            "#,
        )
        .unwrap();

        assert_eq!(input.suite_name.map(|n| n.value()), Some("StackSpec".to_string()));
        assert_eq!(input.items.len(), 2);
        let DslItem::Describe(scope) = &input.items[1] else {
            panic!("expected describe");
        };
        assert_eq!(scope.items.len(), 4);
        let DslItem::Example(example) = &scope.items[1] else {
            panic!("expected example");
        };
        assert_eq!(example.tags.len(), 2);
        assert!(!example.ignored);
        assert!(matches!(&scope.items[2], DslItem::Example(e) if e.ignored));
        assert!(matches!(&scope.items[3], DslItem::BehavesLike(n) if n.value() == "a non-empty stack"));
    }

    #[test]
    fn rejects_unknown_keywords() {
        let err = syn::parse_str::<SpecInput>(r#"fdescribe "x" { }"#).unwrap_err();
        assert!(err.to_string().contains("unknown DSL keyword `fdescribe`"));
    }

    #[test]
    fn suite_header_is_optional() {
        let input: SpecInput = syn::parse_str(r#"it "works" { }"#).unwrap();
        assert!(input.suite_name.is_none());
        assert_eq!(input.items.len(), 1);
    }
}
