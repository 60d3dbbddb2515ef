//! Proc macros for skirmish tool schemas.
//!
//! `#[derive(Tool)]` turns a command argument struct into a dispatchable
//! tool description: a name, a one-line description taken from the doc
//! comment, and a JSON schema for the arguments.
//!
//! # Example
//!
//! ```ignore
//! /// Move an actor toward a grid cell.
//! #[derive(Tool, Deserialize)]
//! #[tool(name = "advance_position")]
//! struct AdvancePosition {
//!     /// Actor to move
//!     actor: String,
//!     /// Target x coordinate
//!     x: i32,
//!     /// Target y coordinate
//!     y: i32,
//!     /// Steps to spend; omit to move as far as the budget allows
//!     steps: Option<u32>,
//!     /// Roll mode
//!     #[tool(one_of = "normal, advantage, disadvantage")]
//!     advantage: Option<String>,
//! }
//! ```

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{parse_macro_input, DeriveInput, Field, Lit, Meta, Type};

/// Derive macro generating tool metadata for a command argument struct.
///
/// # Attributes
///
/// - `#[tool(name = "...")]` on the struct: tool name (defaults to the snake_case struct name)
/// - `#[tool(optional)]` on fields: not listed as required
/// - `#[tool(rename = "...")]` on fields: property name in the schema
/// - `#[tool(one_of = "a, b")]` on fields: restrict a string to the listed values
#[proc_macro_derive(Tool, attributes(tool))]
pub fn derive_tool(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand_tool(input)
        .unwrap_or_else(|err| err.to_compile_error())
        .into()
}

fn expand_tool(input: DeriveInput) -> syn::Result<TokenStream2> {
    let struct_name = &input.ident;
    let tool_name = struct_tool_name(&input)?;
    let description = doc_comment(&input.attrs);

    let fields = match &input.data {
        syn::Data::Struct(data) => match &data.fields {
            syn::Fields::Named(named) => &named.named,
            syn::Fields::Unit => {
                return Ok(emit(struct_name, &tool_name, &description, Vec::new(), Vec::new()))
            }
            _ => {
                return Err(syn::Error::new_spanned(
                    &input,
                    "Tool derive needs named fields or a unit struct",
                ))
            }
        },
        _ => return Err(syn::Error::new_spanned(&input, "Tool derive only supports structs")),
    };

    let mut properties = Vec::new();
    let mut required = Vec::new();

    for field in fields {
        let attrs = FieldAttrs::parse(field)?;
        let property_name = match attrs.rename {
            Some(name) => name,
            None => field
                .ident
                .as_ref()
                .map(|ident| ident.to_string())
                .ok_or_else(|| syn::Error::new_spanned(field, "unnamed field"))?,
        };

        let mut schema = type_to_schema(&field.ty);
        if let Some(values) = attrs.one_of {
            schema = quote! { serde_json::json!({"type": "string", "enum": [#(#values),*]}) };
        }

        let doc = doc_comment(&field.attrs);
        let describe = if doc.is_empty() {
            quote! {}
        } else {
            quote! { property["description"] = serde_json::json!(#doc); }
        };

        properties.push(quote! {
            {
                let mut property = #schema;
                #describe
                properties.insert(#property_name.to_string(), property);
            }
        });

        if !attrs.optional && !is_option(&field.ty) {
            required.push(property_name);
        }
    }

    Ok(emit(struct_name, &tool_name, &description, properties, required))
}

fn emit(
    struct_name: &syn::Ident,
    tool_name: &str,
    description: &str,
    properties: Vec<TokenStream2>,
    required: Vec<String>,
) -> TokenStream2 {
    quote! {
        impl #struct_name {
            /// Dispatch name of this tool.
            pub fn tool_name() -> &'static str {
                #tool_name
            }

            /// One-line description taken from the struct's doc comment.
            pub fn tool_description() -> &'static str {
                #description
            }

            /// JSON schema describing the arguments.
            pub fn input_schema() -> serde_json::Value {
                #[allow(unused_mut)]
                let mut properties = serde_json::Map::new();
                #(#properties)*

                let required: Vec<&str> = vec![#(#required),*];

                serde_json::json!({
                    "type": "object",
                    "properties": properties,
                    "required": required
                })
            }

            /// Full tool description for a driver's tool listing.
            pub fn as_tool() -> ::skirmish_core::dispatch::ToolSpec {
                ::skirmish_core::dispatch::ToolSpec {
                    name: Self::tool_name().to_string(),
                    description: Self::tool_description().to_string(),
                    input_schema: Self::input_schema(),
                }
            }
        }
    }
}

#[derive(Default)]
struct FieldAttrs {
    optional: bool,
    rename: Option<String>,
    one_of: Option<Vec<String>>,
}

impl FieldAttrs {
    fn parse(field: &Field) -> syn::Result<Self> {
        let mut attrs = FieldAttrs::default();
        for attr in &field.attrs {
            if !attr.path().is_ident("tool") {
                continue;
            }
            match attr.parse_args::<Meta>()? {
                Meta::Path(path) if path.is_ident("optional") => attrs.optional = true,
                Meta::NameValue(nv) if nv.path.is_ident("rename") => {
                    attrs.rename = Some(string_value(&nv.value)?);
                }
                Meta::NameValue(nv) if nv.path.is_ident("one_of") => {
                    let values = string_value(&nv.value)?
                        .split(',')
                        .map(|v| v.trim().to_string())
                        .filter(|v| !v.is_empty())
                        .collect();
                    attrs.one_of = Some(values);
                }
                other => {
                    return Err(syn::Error::new_spanned(other, "unknown tool attribute"));
                }
            }
        }
        Ok(attrs)
    }
}

fn string_value(expr: &syn::Expr) -> syn::Result<String> {
    if let syn::Expr::Lit(expr_lit) = expr {
        if let Lit::Str(s) = &expr_lit.lit {
            return Ok(s.value());
        }
    }
    Err(syn::Error::new_spanned(expr, "expected a string literal"))
}

fn struct_tool_name(input: &DeriveInput) -> syn::Result<String> {
    for attr in &input.attrs {
        if attr.path().is_ident("tool") {
            if let Meta::NameValue(nv) = attr.parse_args::<Meta>()? {
                if nv.path.is_ident("name") {
                    return string_value(&nv.value);
                }
            }
        }
    }
    Ok(to_snake_case(&input.ident.to_string()))
}

fn doc_comment(attrs: &[syn::Attribute]) -> String {
    let mut docs = Vec::new();
    for attr in attrs {
        if attr.path().is_ident("doc") {
            if let Meta::NameValue(nv) = &attr.meta {
                if let Ok(line) = string_value(&nv.value) {
                    docs.push(line.trim().to_string());
                }
            }
        }
    }
    docs.join(" ")
}

fn is_option(ty: &Type) -> bool {
    last_segment(ty).is_some_and(|segment| segment.ident == "Option")
}

fn last_segment(ty: &Type) -> Option<&syn::PathSegment> {
    match ty {
        Type::Path(type_path) => type_path.path.segments.last(),
        _ => None,
    }
}

fn first_generic(segment: &syn::PathSegment) -> Option<&Type> {
    if let syn::PathArguments::AngleBracketed(args) = &segment.arguments {
        if let Some(syn::GenericArgument::Type(inner)) = args.args.first() {
            return Some(inner);
        }
    }
    None
}

fn type_to_schema(ty: &Type) -> TokenStream2 {
    let Some(segment) = last_segment(ty) else {
        return quote! { serde_json::json!({}) };
    };

    match segment.ident.to_string().as_str() {
        "String" | "str" => quote! { serde_json::json!({"type": "string"}) },
        "u8" | "u16" | "u32" | "u64" | "usize" => {
            quote! { serde_json::json!({"type": "integer", "minimum": 0}) }
        }
        "i8" | "i16" | "i32" | "i64" | "isize" => quote! { serde_json::json!({"type": "integer"}) },
        "f32" | "f64" => quote! { serde_json::json!({"type": "number"}) },
        "bool" => quote! { serde_json::json!({"type": "boolean"}) },
        "Value" => quote! { serde_json::json!({}) },
        "Option" => match first_generic(segment) {
            Some(inner) => type_to_schema(inner),
            None => quote! { serde_json::json!({}) },
        },
        "Vec" => match first_generic(segment) {
            Some(inner) => {
                let items = type_to_schema(inner);
                quote! { serde_json::json!({"type": "array", "items": #items}) }
            }
            None => quote! { serde_json::json!({"type": "array"}) },
        },
        _ => quote! { serde_json::json!({"type": "object"}) },
    }
}

fn to_snake_case(s: &str) -> String {
    let mut result = String::new();
    for (i, c) in s.chars().enumerate() {
        if c.is_uppercase() {
            if i > 0 {
                result.push('_');
            }
            result.push(c.to_ascii_lowercase());
        } else {
            result.push(c);
        }
    }
    result
}
