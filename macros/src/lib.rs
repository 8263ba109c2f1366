use proc_macro::TokenStream;
use proc_macro2::{TokenStream as TokenStream2, TokenTree};
use quote::{format_ident, quote};
use syn::ext::IdentExt;
use syn::{
    parse_macro_input, parse_quote, Attribute, Block, FnArg, ImplItem, ItemFn, ItemImpl, LitBool,
    Pat, PatIdent, ReturnType, Signature, Type,
};

/// 这些 trait 的实现参与对象协议（格式化、比较、克隆等），不做跟踪
const PROTOCOL_TRAITS: &[&str] = &[
    "Debug",
    "Display",
    "PartialEq",
    "Eq",
    "PartialOrd",
    "Ord",
    "Hash",
    "Clone",
    "Drop",
    "Default",
];

const BOOKKEEPING_NAMES: &[&str] = &["log", "logger", "tracer"];

/// 跟踪函数调用
///
/// 每次调用输出 TRACE 级别的入口记录 `name( a, b )` 并增加缩进，
/// 返回时减少缩进并输出 `name( a, b ) = ret`。返回 `Err` 时记录为 `raised`，
/// 结果原样返回；panic 时记录 `panicked` 后继续展开。
///
/// logger 名称为函数所在模块路径。参数实现了 `Debug` 时按 `Debug` 展示，
/// 否则展示为 `<TypeName>`。
///
/// # 示例
/// ```ignore
/// use cilog::ftrace;
///
/// #[ftrace]
/// fn add(a: i32, b: i32) -> i32 {
///     a + b
/// }
///
/// // 不受全局开关影响，始终关闭
/// #[ftrace(enabled = false)]
/// fn hot_path(x: u64) -> u64 {
///     x * 2
/// }
/// ```
#[proc_macro_attribute]
pub fn ftrace(attr: TokenStream, item: TokenStream) -> TokenStream {
    let args = match TraceArgs::parse(attr) {
        Ok(args) => args,
        Err(err) => return err.to_compile_error().into(),
    };
    let mut function = parse_macro_input!(item as ItemFn);

    if let Some(constness) = &function.sig.constness {
        return syn::Error::new_spanned(constness, "#[ftrace] cannot be applied to a const fn")
            .to_compile_error()
            .into();
    }

    let site = call_site(
        &function.sig,
        None,
        quote!(Function),
        quote!(::std::option::Option::None),
        args.enabled_tokens(),
    );
    let block = instrument(&mut function.sig, &function.block, site);
    *function.block = block;

    TokenStream::from(quote!(#function))
}

/// 跟踪 `impl` 块中的每个方法
///
/// logger 名称为 `模块路径::类型名`，接收者展示为 `<TypeName>`。
/// 方法上可以使用：
/// - `#[getter]`：记录为 `name( <T> ) => get` / `name( <T> ) <= get( v )`
/// - `#[setter]`：记录为 `name( <T> ) => set( v )` / `name( <T> ) <= set`
/// - `#[notrace]`：不跟踪
///
/// `const fn`、名为 `log` / `logger` / `tracer` 的方法，以及 `Debug`、`Display`、
/// `PartialEq`、`Clone`、`Drop` 等协议 trait 的实现不做跟踪。
///
/// # 示例
/// ```ignore
/// use cilog::ctrace;
///
/// struct Account {
///     balance: i64,
/// }
///
/// #[ctrace]
/// impl Account {
///     fn deposit(&mut self, amount: i64) -> i64 {
///         self.balance += amount;
///         self.balance
///     }
///
///     #[getter]
///     fn balance(&self) -> i64 {
///         self.balance
///     }
///
///     #[notrace]
///     fn raw(&self) -> i64 {
///         self.balance
///     }
/// }
/// ```
#[proc_macro_attribute]
pub fn ctrace(attr: TokenStream, item: TokenStream) -> TokenStream {
    let args = match TraceArgs::parse(attr) {
        Ok(args) => args,
        Err(err) => return err.to_compile_error().into(),
    };
    let mut item_impl = parse_macro_input!(item as ItemImpl);

    match trace_impl(&mut item_impl, &args) {
        Ok(()) => TokenStream::from(quote!(#item_impl)),
        Err(err) => err.to_compile_error().into(),
    }
}

#[derive(Default)]
struct TraceArgs {
    enabled: Option<bool>,
}

impl TraceArgs {
    fn parse(attr: TokenStream) -> syn::Result<Self> {
        let mut args = TraceArgs::default();
        let parser = syn::meta::parser(|meta| {
            if meta.path.is_ident("enabled") {
                let value: LitBool = meta.value()?.parse()?;
                args.enabled = Some(value.value);
                Ok(())
            } else {
                Err(meta.error("unsupported trace argument, expected `enabled = true|false`"))
            }
        });
        syn::parse::Parser::parse(parser, attr)?;
        Ok(args)
    }

    fn enabled_tokens(&self) -> TokenStream2 {
        match self.enabled {
            Some(enabled) => quote!(::std::option::Option::Some(#enabled)),
            None => quote!(::std::option::Option::None),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Marker {
    None,
    Getter,
    Setter,
    NoTrace,
}

fn trace_impl(item_impl: &mut ItemImpl, args: &TraceArgs) -> syn::Result<()> {
    let protocol = item_impl
        .trait_
        .as_ref()
        .and_then(|(_, path, _)| path.segments.last())
        .map(|segment| PROTOCOL_TRAITS.contains(&segment.ident.to_string().as_str()))
        .unwrap_or(false);
    let owner = owner_name(&item_impl.self_ty);

    for impl_item in &mut item_impl.items {
        let ImplItem::Fn(method) = impl_item else {
            continue;
        };
        let marker = take_marker(&mut method.attrs)?;
        let name = method.sig.ident.unraw().to_string();
        if protocol
            || marker == Marker::NoTrace
            || method.sig.constness.is_some()
            || BOOKKEEPING_NAMES.contains(&name.as_str())
            || has_attr(&method.attrs, "ftrace")
        {
            continue;
        }

        let accessor = match marker {
            Marker::Getter => {
                quote!(::std::option::Option::Some(::cilog::log::Accessor::Getter))
            }
            Marker::Setter => {
                quote!(::std::option::Option::Some(::cilog::log::Accessor::Setter))
            }
            Marker::None | Marker::NoTrace => quote!(::std::option::Option::None),
        };
        let site = call_site(
            &method.sig,
            Some(&owner),
            quote!(Method),
            accessor,
            args.enabled_tokens(),
        );
        method.block = instrument(&mut method.sig, &method.block, site);
    }
    Ok(())
}

/// 取出并移除 `#[getter]` / `#[setter]` / `#[notrace]`
fn take_marker(attrs: &mut Vec<Attribute>) -> syn::Result<Marker> {
    let mut marker = Marker::None;
    let mut error = None;
    attrs.retain(|attr| {
        let found = if attr.path().is_ident("getter") {
            Marker::Getter
        } else if attr.path().is_ident("setter") {
            Marker::Setter
        } else if attr.path().is_ident("notrace") {
            Marker::NoTrace
        } else {
            return true;
        };
        if marker != Marker::None && marker != found {
            error = Some(syn::Error::new_spanned(
                attr,
                "only one of #[getter], #[setter] and #[notrace] is allowed",
            ));
        }
        marker = found;
        false
    });
    match error {
        Some(err) => Err(err),
        None => Ok(marker),
    }
}

fn has_attr(attrs: &[Attribute], name: &str) -> bool {
    attrs.iter().any(|attr| {
        attr.path()
            .segments
            .last()
            .map(|segment| segment.ident == name)
            .unwrap_or(false)
    })
}

fn owner_name(self_ty: &Type) -> String {
    match self_ty {
        Type::Path(type_path) => match type_path.path.segments.last() {
            Some(segment) => segment.ident.unraw().to_string(),
            None => quote!(#self_ty).to_string(),
        },
        _ => quote!(#self_ty).to_string().replace(' ', ""),
    }
}

fn call_site(
    sig: &Signature,
    owner: Option<&str>,
    kind: TokenStream2,
    accessor: TokenStream2,
    enabled: TokenStream2,
) -> TokenStream2 {
    let name = sig.ident.unraw().to_string();
    let owner = match owner {
        Some(owner) => quote!(::std::option::Option::Some(#owner)),
        None => quote!(::std::option::Option::None),
    };
    quote! {
        ::cilog::trace::CallSite::new(
            ::std::module_path!(),
            #owner,
            #name,
            ::cilog::trace::TraceKind::#kind,
            #accessor,
            #enabled,
        )
    }
}

/// 生成被跟踪的函数体
///
/// 解构模式参数改名为 `__cilog_argN`，在函数体开头重新解构
fn instrument(sig: &mut Signature, block: &Block, site: TokenStream2) -> Block {
    let mut shown = Vec::new();
    let mut bindings = Vec::new();
    for (index, input) in sig.inputs.iter_mut().enumerate() {
        let FnArg::Typed(pat_type) = input else {
            continue;
        };
        match &*pat_type.pat {
            Pat::Ident(PatIdent {
                ident,
                by_ref: None,
                subpat: None,
                ..
            }) => shown.push(ident.clone()),
            _ => {
                let ident = format_ident!("__cilog_arg{}", index);
                let pat = std::mem::replace(
                    &mut *pat_type.pat,
                    Pat::Ident(PatIdent {
                        attrs: Vec::new(),
                        by_ref: None,
                        mutability: None,
                        ident: ident.clone(),
                        subpat: None,
                    }),
                );
                bindings.push(quote!(let #pat = #ident;));
                shown.push(ident);
            }
        }
    }

    let receiver = if sig.receiver().is_some() {
        quote! {
            ::std::option::Option::Some(
                ::cilog::trace::repr::type_placeholder::<Self> as fn() -> ::std::string::String
            )
        }
    } else {
        quote!(::std::option::Option::None)
    };

    let output_ty = match &sig.output {
        ReturnType::Default => Some(quote!(())),
        ReturnType::Type(_, ty) if contains_impl_trait(quote!(#ty)) => None,
        ReturnType::Type(_, ty) => Some(quote!(#ty)),
    };

    let stmts = &block.stmts;
    let body = if sig.asyncness.is_some() {
        match &output_ty {
            Some(ty) => quote! {
                let __cilog_output: #ty = async move {
                    #(#bindings)*
                    #[allow(unused_braces)]
                    let __cilog_value: #ty = #block;
                    __cilog_value
                }
                .await;
            },
            None => quote! {
                let __cilog_output = async move {
                    #(#bindings)*
                    #(#stmts)*
                }
                .await;
            },
        }
    } else {
        let annotation = output_ty.map(|ty| quote!(-> #ty));
        quote! {
            #[allow(clippy::redundant_closure_call)]
            let __cilog_output = (move || #annotation {
                #(#bindings)*
                #(#stmts)*
            })();
        }
    };

    parse_quote! {{
        static __CILOG_SITE: ::cilog::trace::CallSite = #site;
        let __cilog_guard = __CILOG_SITE.enter(#receiver, |__cilog_max_len| {
            #[allow(unused_imports)]
            use ::cilog::trace::repr::{ViaDebug as _, ViaTypeName as _};
            ::std::vec![#((&&::cilog::trace::repr::Wrap(&#shown)).trace_arg(__cilog_max_len)),*]
        });
        #body
        if let ::std::option::Option::Some(__cilog_guard) = __cilog_guard {
            #[allow(unused_imports)]
            use ::cilog::trace::repr::{
                OutcomeViaDebug as _, OutcomeViaDebugResult as _, OutcomeViaResult as _,
                OutcomeViaTypeName as _,
            };
            let __cilog_outcome = (&&&&::cilog::trace::repr::Wrap(&__cilog_output))
                .trace_outcome(__cilog_guard.max_arg_len());
            __cilog_guard.finish(__cilog_outcome);
        }
        __cilog_output
    }}
}

fn contains_impl_trait(tokens: TokenStream2) -> bool {
    tokens.into_iter().any(|token| match token {
        TokenTree::Ident(ident) => ident == "impl",
        TokenTree::Group(group) => contains_impl_trait(group.stream()),
        _ => false,
    })
}
