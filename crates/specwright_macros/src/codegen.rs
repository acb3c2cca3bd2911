//! Code generation: transforms the DSL AST into calls on `specwright::Context`.

use proc_macro2::{Ident, Span, TokenStream};
use quote::quote;

use crate::dsl::*;

// ============================================================================
// Public entry points
// ============================================================================

/// `specwright::Spec::build(name, |ctx| { ... })`, evaluating to
/// `specwright::Result<specwright::Spec>`.
pub fn generate_spec(input: SpecInput) -> TokenStream {
    let name = match &input.suite_name {
        Some(name) => quote! { #name },
        None => quote! { ::core::module_path!() },
    };
    let items = generate_items(&input.items);

    quote! {
        ::specwright::Spec::build(#name, |ctx: &mut ::specwright::Context| {
            #(#items)*
        })
    }
}

/// `fn main()` that builds the spec and runs it with the console reporter.
pub fn generate_main(input: SpecInput) -> TokenStream {
    let build = generate_spec(input);

    quote! {
        fn main() {
            ::specwright::run(|| {
                let spec = #build?;
                ::std::result::Result::Ok(::std::vec![
                    ::std::boxed::Box::new(spec) as ::std::boxed::Box<dyn ::specwright::Suite>
                ])
            });
        }
    }
}

// ============================================================================
// Item generation
// ============================================================================

fn generate_items(items: &[DslItem]) -> Vec<TokenStream> {
    items.iter().map(generate_item).collect()
}

fn generate_item(item: &DslItem) -> TokenStream {
    match item {
        DslItem::Describe(block) | DslItem::Share(block) => {
            let method = &block.keyword;
            let name = &block.name;
            let children = generate_items(&block.items);
            quote! {
                ctx.#method(#name, |ctx| {
                    #(#children)*
                });
            }
        }
        DslItem::BehavesLike(name) => quote! {
            ctx.behaves_like(#name);
        },
        DslItem::Example(block) => generate_example(block),
        DslItem::Hook(hook) => {
            let method = Ident::new(hook_method(hook.kind), Span::call_site());
            let body = &hook.body;
            quote! {
                ctx.#method(move || { #body });
            }
        }
    }
}

fn generate_example(block: &ExampleBlock) -> TokenStream {
    let method = if block.ignored {
        Ident::new("ignore", block.keyword.span())
    } else {
        block.keyword.clone()
    };
    let text = &block.text;
    let body = &block.body;
    let tags = &block.tags;

    if tags.is_empty() {
        quote! {
            ctx.#method(#text, move || { #body });
        }
    } else {
        quote! {
            ctx.#method(#text, move || { #body }).tags(&[#(#tags),*]);
        }
    }
}

fn hook_method(kind: HookKind) -> &'static str {
    match kind {
        HookKind::BeforeEach => "before_each",
        HookKind::AfterEach => "after_each",
        HookKind::BeforeAll => "before_all",
        HookKind::AfterAll => "after_all",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expand(src: &str) -> String {
        let input: SpecInput = syn::parse_str(src).unwrap();
        generate_spec(input).to_string()
    }

    #[test]
    fn xit_becomes_an_ignored_example() {
        let out = expand(r#"xit "grow" { }"#);
        assert!(out.contains("ctx . ignore (\"grow\""));
    }

    #[test]
    fn tags_are_attached_through_the_handle() {
        let out = expand(r#"it "pop" tags("fast") { }"#);
        assert!(out.contains(". tags (& [\"fast\"])"));
    }

    #[test]
    fn default_suite_name_is_the_module_path() {
        assert!(expand(r#"it "pop" { }"#).contains("module_path"));
        assert!(expand(r#"suite "StackSpec"; it "pop" { }"#).contains("\"StackSpec\""));
    }
}
