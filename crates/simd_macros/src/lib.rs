// This software is licensed under a dual license model:
//
// GNU Affero General Public License v3 (AGPLv3): You may use, modify, and
// distribute this software under the terms of the AGPLv3.
//
// Elastic License v2 (ELv2): You may also use, modify, and distribute this
// software under the Elastic License v2, which has specific restrictions.
//
// We welcome any commercial collaboration or support. For inquiries
// regarding the licenses, please contact us at:
// vectorchord-inquiry@tensorchord.ai
//
// Copyright (c) 2025 TensorChord Inc.

mod target;

use proc_macro2::{Span, TokenStream};
use quote::quote;

/// `"v3"` generates the specialization from the function body, `@"v3"` imports
/// a hand-written `{name}_v3` from the surrounding module.
struct Version {
    target: syn::LitStr,
    import: bool,
}

impl syn::parse::Parse for Version {
    fn parse(input: syn::parse::ParseStream) -> syn::Result<Self> {
        let import = if input.peek(syn::Token![@]) {
            let _: syn::Token![@] = input.parse()?;
            true
        } else {
            false
        };
        let target: syn::LitStr = input.parse()?;
        Ok(Self { target, import })
    }
}

struct Versions(syn::punctuated::Punctuated<Version, syn::Token![,]>);

impl syn::parse::Parse for Versions {
    fn parse(input: syn::parse::ParseStream) -> syn::Result<Self> {
        Ok(Self(syn::punctuated::Punctuated::parse_terminated(input)?))
    }
}

fn arguments(sig: &syn::Signature) -> syn::Result<Vec<syn::PatIdent>> {
    let mut list = Vec::new();
    for input in sig.inputs.iter() {
        match input {
            syn::FnArg::Typed(typed) => match &*typed.pat {
                syn::Pat::Ident(ident) => list.push(ident.clone()),
                pat => {
                    return Err(syn::Error::new_spanned(
                        pat,
                        "patterns on parameters are not supported",
                    ));
                }
            },
            syn::FnArg::Receiver(receiver) => {
                return Err(syn::Error::new_spanned(
                    receiver,
                    "receiver parameters are not supported",
                ));
            }
        }
    }
    Ok(list)
}

fn check_signature(sig: &syn::Signature) -> syn::Result<()> {
    if let Some(constness) = sig.constness {
        return Err(syn::Error::new_spanned(
            constness,
            "const functions are not supported",
        ));
    }
    if let Some(asyncness) = sig.asyncness {
        return Err(syn::Error::new_spanned(
            asyncness,
            "async functions are not supported",
        ));
    }
    if let Some(variadic) = &sig.variadic {
        return Err(syn::Error::new_spanned(
            variadic,
            "variadic parameters are not supported",
        ));
    }
    for param in sig.generics.params.iter() {
        if !matches!(param, syn::GenericParam::Lifetime(_)) {
            return Err(syn::Error::new_spanned(
                param,
                "generic parameters are not supported",
            ));
        }
    }
    Ok(())
}

fn expand_multiversion(versions: Versions, item_fn: syn::ItemFn) -> syn::Result<TokenStream> {
    let syn::ItemFn {
        attrs,
        vis,
        sig,
        block,
    } = item_fn;
    check_signature(&sig)?;
    let arguments = arguments(&sig)?;
    let name = sig.ident.to_string();
    let params = &sig.generics.params;
    let where_clause = &sig.generics.where_clause;
    let inputs = &sig.inputs;
    let output = &sig.output;
    let mut specializations = quote! {};
    let mut branches = quote! {};
    for version in versions.0 {
        let value = version.target.value();
        let mut split = value.split(':');
        let cpu = split.next().unwrap_or_default();
        let additional_target_features = split.collect::<Vec<&str>>();
        let Some(target_cpu) = target::find(cpu) else {
            return Err(syn::Error::new_spanned(&version.target, "unknown target_cpu"));
        };
        let target_arch = target_cpu.target_arch;
        let target_cpu = target_cpu.target_cpu;
        let ident = syn::Ident::new(
            &format!("{name}_{}", value.replace([':', '.'], "_")),
            Span::mixed_site(),
        );
        if !version.import {
            specializations.extend(quote! {
                #[inline]
                #[cfg(target_arch = #target_arch)]
                #[crate::target_cpu(enable = #target_cpu)]
                #(#[target_feature(enable = #additional_target_features)])*
                fn #ident < #params > (#inputs) #output #where_clause #block
            });
        }
        branches.extend(quote! {
            #[cfg(target_arch = #target_arch)]
            if crate::is_cpu_detected!(#target_cpu) #(&& crate::is_feature_detected!(#additional_target_features))* {
                let _multiversion_internal: unsafe fn(#inputs) #output = #ident;
                CACHE.store(_multiversion_internal as *mut (), core::sync::atomic::Ordering::Relaxed);
                return unsafe { _multiversion_internal(#(#arguments,)*) };
            }
        });
    }
    Ok(quote! {
        #specializations
        #vis fn fallback < #params > (#inputs) #output #where_clause #block
        #[inline(always)]
        #(#attrs)* #vis #sig {
            static CACHE: core::sync::atomic::AtomicPtr<()> = core::sync::atomic::AtomicPtr::new(core::ptr::null_mut());
            let cache = CACHE.load(core::sync::atomic::Ordering::Relaxed);
            if !cache.is_null() {
                let f = unsafe { core::mem::transmute::<*mut (), unsafe fn(#inputs) #output>(cache) };
                return unsafe { f(#(#arguments,)*) };
            }
            #branches
            let _multiversion_internal: unsafe fn(#inputs) #output = fallback;
            CACHE.store(_multiversion_internal as *mut (), core::sync::atomic::Ordering::Relaxed);
            unsafe { _multiversion_internal(#(#arguments,)*) }
        }
    })
}

/// Compiles the function once per listed target plus a portable `fallback`
/// with the same visibility, and dispatches to the first target the running
/// CPU supports. The choice is cached after the first call.
#[proc_macro_attribute]
pub fn multiversion(
    attr: proc_macro::TokenStream,
    item: proc_macro::TokenStream,
) -> proc_macro::TokenStream {
    let versions = syn::parse_macro_input!(attr as Versions);
    let item_fn = syn::parse_macro_input!(item as syn::ItemFn);
    expand_multiversion(versions, item_fn)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

struct TargetCpu {
    enable: syn::LitStr,
}

impl syn::parse::Parse for TargetCpu {
    fn parse(input: syn::parse::ParseStream) -> syn::Result<Self> {
        let key: syn::Ident = input.parse()?;
        if key != "enable" {
            return Err(syn::Error::new_spanned(key, "expected `enable`"));
        }
        let _: syn::Token![=] = input.parse()?;
        let enable: syn::LitStr = input.parse()?;
        Ok(Self { enable })
    }
}

/// Expands to the `#[target_feature]` attributes of one or more target CPUs.
#[proc_macro_attribute]
pub fn target_cpu(
    attr: proc_macro::TokenStream,
    item: proc_macro::TokenStream,
) -> proc_macro::TokenStream {
    let attr = syn::parse_macro_input!(attr as TargetCpu);
    let mut result = quote! {};
    for s in attr.enable.value().split(',') {
        let Some(target_cpu) = target::find(s) else {
            return syn::Error::new_spanned(&attr.enable, "unknown target_cpu")
                .into_compile_error()
                .into();
        };
        let target_features = target_cpu.target_features;
        result.extend(quote! {
            #(#[target_feature(enable = #target_features)])*
        });
    }
    result.extend(TokenStream::from(item));
    result.into()
}

/// Defines `is_{arch}_cpu_detected!("cpu")`, forwarding to
/// `$crate::internal::is_{cpu}_detected()`.
#[proc_macro]
pub fn define_is_cpu_detected(input: proc_macro::TokenStream) -> proc_macro::TokenStream {
    let target_arch = syn::parse_macro_input!(input as syn::LitStr).value();
    let mut arms = quote! {};
    for target_cpu in target::TARGET_CPUS {
        if target_cpu.target_arch != target_arch {
            continue;
        }
        let target_cpu = target_cpu.target_cpu;
        let ident = syn::Ident::new(
            &format!("is_{}_detected", target_cpu.replace('.', "_")),
            Span::mixed_site(),
        );
        arms.extend(quote! {
            (#target_cpu) => { $crate::internal::#ident() };
        });
    }
    let ident = syn::Ident::new(&format!("is_{target_arch}_cpu_detected"), Span::mixed_site());
    quote! {
        #[macro_export]
        macro_rules! #ident {
            #arms
        }
    }
    .into()
}
