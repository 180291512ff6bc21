//! Derive macros for Anbar.
//!
//! `#[derive(Injectable)]` writes the static injection spec, the two-phase
//! construction hooks and the catalog registration of a struct.
//!
//! ```rust,ignore
//! #[derive(Injectable)]
//! #[injectable(construct = "Service::init")]
//! struct Service {
//!     #[base]
//!     base: BaseService,
//!     #[inject]
//!     logger: Inject<Logger>,
//!     #[inject(on_demand, key = "::infra::Mailer")]
//!     mailer: OnDemand<SmtpMailer>,
//!     greeting: String,
//! }
//! ```

use darling::util::{Flag, Ignored};
use darling::{FromDeriveInput, FromField, FromMeta, ast};
use proc_macro::TokenStream;
use proc_macro2::{Span, TokenStream as TokenStream2};
use quote::quote;
use syn::{
    Attribute, DeriveInput, GenericArgument, Ident, Meta, Path, PathArguments, Type, parse_macro_input,
};

#[derive(FromDeriveInput)]
#[darling(attributes(injectable), supports(struct_named, struct_unit))]
struct InjectableInput {
    ident: Ident,
    generics: syn::Generics,
    data: ast::Data<Ignored, InjectableField>,
    /// Class name; defaults to `module_path!()::Ident`.
    #[darling(default)]
    name: Option<String>,
    /// `fn(&mut Self, &Args) -> Result<()>` run after injection.
    #[darling(default)]
    construct: Option<Path>,
}

#[derive(FromField)]
#[darling(forward_attrs(inject, base))]
struct InjectableField {
    ident: Option<Ident>,
    ty: Type,
    attrs: Vec<Attribute>,
}

#[derive(Default, FromMeta)]
#[darling(default)]
struct InjectArgs {
    on_demand: Flag,
    key: Option<String>,
    mode: Option<String>,
}

enum FieldRole {
    Inject(InjectArgs),
    Base,
    Plain,
}

impl InjectableField {
    fn role(&self) -> darling::Result<FieldRole> {
        let mut role = FieldRole::Plain;
        for attr in &self.attrs {
            let next = if attr.path().is_ident("base") {
                FieldRole::Base
            } else {
                match &attr.meta {
                    Meta::Path(_) => FieldRole::Inject(InjectArgs::default()),
                    meta => FieldRole::Inject(InjectArgs::from_meta(meta)?),
                }
            };
            if !matches!(role, FieldRole::Plain) {
                return Err(darling::Error::custom("a field takes at most one of #[inject] or #[base]").with_span(attr));
            }
            role = next;
        }
        Ok(role)
    }
}

/// Derives `anbar::Injectable` and registers the type in the class catalog.
///
/// Struct attribute `#[injectable(name = "...", construct = "path")]`; the
/// name has no leading `::`.
/// Field attributes:
/// - `#[inject]`: eager; the target defaults to the slot's type parameter.
/// - `#[inject(on_demand)]` or `#[inject(mode = "on-demand")]`: on first read;
///   the field must be an `OnDemand<T>`.
/// - `#[inject(key = "Type")]`: explicit target, relative to this module
///   unless it starts with `::`.
/// - `#[base]`: embedded base class, whose fields are injected too.
///
/// Fields without an attribute start from `Default::default()`.
#[proc_macro_derive(Injectable, attributes(injectable, inject, base))]
pub fn derive_injectable(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match expand(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.write_errors().into(),
    }
}

fn expand(input: &DeriveInput) -> darling::Result<TokenStream2> {
    let parsed = InjectableInput::from_derive_input(input)?;
    let ident = &parsed.ident;

    if !parsed.generics.params.is_empty() {
        return Err(darling::Error::custom("Injectable cannot be derived for generic types").with_span(&parsed.generics));
    }

    let class = match &parsed.name {
        Some(name) if name.starts_with("::") => {
            return Err(darling::Error::custom("class names are written without a leading `::`").with_span(ident));
        }
        Some(name) => quote!(#name),
        None => quote!(::core::concat!(::core::module_path!(), "::", ::core::stringify!(#ident))),
    };

    let fields = parsed
        .data
        .take_struct()
        .ok_or_else(|| darling::Error::unsupported_shape("enum"))?;
    let is_unit = fields.is_unit();

    let mut errors = darling::Error::accumulator();
    let mut base: Option<(&Ident, &Type)> = None;
    let mut points = Vec::new();
    let mut fills = Vec::new();
    let mut inits = Vec::new();

    for field in &fields.fields {
        let Some(field_ident) = &field.ident else {
            continue;
        };
        let field_name = field_ident.to_string();
        let ty = &field.ty;

        match errors.handle(field.role()) {
            Some(FieldRole::Inject(args)) => {
                let target = match &args.key {
                    Some(key) => quote!(::core::option::Option::Some(#key)),
                    None => match slot_target(ty) {
                        Some(target) => quote!(::core::option::Option::Some(#target)),
                        None => quote!(::core::option::Option::None),
                    },
                };
                let mode = if args.on_demand.is_present() {
                    Some("on-demand".to_string())
                } else {
                    args.mode.clone()
                };
                if mode.as_deref().is_some_and(is_on_demand) && slot_name(ty).as_deref() == Some("Inject") {
                    errors.push(
                        darling::Error::custom("on-demand fields must be declared as OnDemand<T>, not Inject<T>")
                            .with_span(ty),
                    );
                    continue;
                }
                let mode = match mode {
                    Some(mode) => quote!(::core::option::Option::Some(#mode)),
                    None => quote!(::core::option::Option::None),
                };
                points.push(quote!(.annotated(#field_name, #target, #mode)));
                fills.push(quote!(deps.fill(Self::CLASS, #field_name, &mut self.#field_ident)?;));
                inits.push(quote!(#field_ident: <#ty>::declared(Self::CLASS, #field_name)));
            }
            Some(FieldRole::Base) => {
                if base.is_some() {
                    errors.push(darling::Error::custom("only one #[base] field is allowed").with_span(field_ident));
                    continue;
                }
                base = Some((field_ident, ty));
                fills.push(quote!(<#ty as ::anbar::Injectable>::populate(&mut self.#field_ident, deps)?;));
                inits.push(quote!(#field_ident: <#ty as ::anbar::Injectable>::allocate()));
            }
            Some(FieldRole::Plain) => {
                inits.push(quote!(#field_ident: ::core::default::Default::default()));
            }
            None => {}
        }
    }
    errors.finish()?;

    let extends = base.map(|(_, ty)| quote!(.extends(<#ty as ::anbar::Injectable>::describe)));
    let allocate = if is_unit {
        quote!(#ident)
    } else {
        quote!(#ident { #(#inits),* })
    };
    let construct = parsed.construct.as_ref().map(|path| {
        quote! {
            fn construct(&mut self, args: &::anbar::Args) -> ::anbar::Result<()> {
                #path(self, args)
            }
        }
    });
    let deps_ident = if fills.is_empty() {
        Ident::new("_deps", Span::call_site())
    } else {
        Ident::new("deps", Span::call_site())
    };

    Ok(quote! {
        impl ::anbar::Injectable for #ident {
            const CLASS: &'static str = #class;

            fn describe() -> ::anbar::ClassSpec {
                ::anbar::ClassSpec::new(Self::CLASS)
                    #extends
                    #(#points)*
            }

            fn allocate() -> Self {
                #allocate
            }

            fn populate(&mut self, #deps_ident: &mut ::anbar::Dependencies) -> ::anbar::Result<()> {
                #(#fills)*
                ::core::result::Result::Ok(())
            }

            #construct
        }

        ::anbar::inventory::submit! {
            ::anbar::ClassRegistration::of::<#ident>()
        }
    })
}

fn is_on_demand(mode: &str) -> bool {
    matches!(mode.trim(), "on-demand" | "onDemand" | "on_demand")
}

/// Last path segment of a slot type, e.g. `Inject` for `anbar::Inject<T>`.
fn slot_name(ty: &Type) -> Option<String> {
    match ty {
        Type::Path(slot) => slot.path.segments.last().map(|s| s.ident.to_string()),
        _ => None,
    }
}

/// The target name written in a slot's type parameter.
///
/// `Inject<Logger>` is relative to the declaring module, `Inject<crate::a::B>`
/// is absolute within this crate, other multi-segment paths are absolute.
/// `super::` paths cannot be named statically and yield `None`.
fn slot_target(ty: &Type) -> Option<TokenStream2> {
    let Type::Path(slot) = ty else {
        return None;
    };
    let PathArguments::AngleBracketed(args) = &slot.path.segments.last()?.arguments else {
        return None;
    };
    let inner = args.args.iter().find_map(|arg| match arg {
        GenericArgument::Type(Type::Path(inner)) if inner.qself.is_none() => Some(&inner.path),
        _ => None,
    })?;

    let mut segments: Vec<String> = inner.segments.iter().map(|s| s.ident.to_string()).collect();
    match segments.first().map(String::as_str) {
        Some("super") => None,
        Some("crate") => {
            let rest = format!("::{}", segments.split_off(1).join("::"));
            Some(quote!(::core::concat!("::", ::core::env!("CARGO_CRATE_NAME"), #rest)))
        }
        Some("self") => {
            let rest = segments.split_off(1).join("::");
            Some(quote!(#rest))
        }
        Some(_) if inner.leading_colon.is_some() || segments.len() > 1 => {
            let absolute = format!("::{}", segments.join("::"));
            Some(quote!(#absolute))
        }
        Some(_) => {
            let relative = segments.join("::");
            Some(quote!(#relative))
        }
        None => None,
    }
}
