//! Proc macros for the `specwright` test engine.

mod codegen;
mod dsl;

/// Build a [`Spec`] from a word-based DSL.
///
/// Expands to `specwright::Spec::build(name, |ctx| { ... })`, so the macro
/// evaluates to `specwright::Result<specwright::Spec>`. Construction errors
/// (two `before_each` in one scope, an unknown `behaves_like`, duplicate
/// example names) surface through that result.
///
/// # Example
///
/// ```text
/// let spec = specwright::spec! {
///     suite "StackSpec";
///
///     share "a non-empty stack" {
///         it "return the top item on peek" {
///             assert_eq!(vec![1, 2].last(), Some(&2));
///         }
///     }
///
///     describe "A Stack" {
///         before_each { reset_fixtures(); }
///
///         it "pop the last pushed value" tags("fast") {
///             assert_eq!(vec![1, 2].pop(), Some(2));
///         }
///
///         xit "grow without bound" { }
///
///         behaves_like "a non-empty stack";
///     }
/// }?;
/// ```
///
/// # Supported DSL keywords
///
/// ## Header
/// - `suite "Name";`: optional, must come first; defaults to `module_path!()`
///
/// ## Scopes
/// - `describe "name" { ... }` / `context "name" { ... }` / `when "name" { ... }`
/// - `share "name" { ... }`: shared behavior, run only where invoked
/// - `behaves_like "name";`: run a shared behavior here
///
/// ## Examples
/// - `it "text" { ... }` / `specify "text" { ... }`
/// - `ignore "text" { ... }` / `xit "text" { ... }`: reported as ignored
/// - `it "text" tags("db", "slow") { ... }`: tags for include/exclude filtering
///
/// ## Lifecycle hooks (at most one of each per scope)
/// - `before_each { ... }` / `after_each { ... }`: around every example of this scope
/// - `before_all { ... }` / `after_all { ... }`: once around this scope's examples
///
/// Bodies become `move` closures that must be `Send + Sync + 'static`.
///
/// [`Spec`]: https://docs.rs/specwright/latest/specwright/struct.Spec.html
#[proc_macro]
pub fn spec(input: proc_macro::TokenStream) -> proc_macro::TokenStream {
    let input = syn::parse_macro_input!(input as dsl::SpecInput);
    codegen::generate_spec(input).into()
}

/// Spec runner macro: generates a `main()` that builds the spec and runs it
/// with the console reporter.
///
/// Use this instead of `spec!` when your test target has `harness = false`.
///
/// # Setup
///
/// In `Cargo.toml`:
/// ```toml
/// [[test]]
/// name = "stack_spec"
/// harness = false
/// ```
///
/// In your test file:
/// ```text
/// specwright::spec_main! {
///     suite "StackSpec";
///     describe "A Stack" {
///         it "pop" { assert_eq!(vec![1].pop(), Some(1)); }
///     }
/// }
/// ```
///
/// Run with:
/// ```sh
/// cargo test --test stack_spec -- --exclude slow
/// ```
#[proc_macro]
pub fn spec_main(input: proc_macro::TokenStream) -> proc_macro::TokenStream {
    let input = syn::parse_macro_input!(input as dsl::SpecInput);
    codegen::generate_main(input).into()
}
