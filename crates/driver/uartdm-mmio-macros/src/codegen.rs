//! Code generation for the `register_block!` macro.

use proc_macro2::TokenStream;
use quote::{format_ident, quote};

use crate::parse::{RegisterBlock, RegisterDef};

/// Generates the struct and its accessor impl.
pub fn generate(block: &RegisterBlock) -> TokenStream {
    let vis = &block.vis;
    let name = &block.name;
    let attrs = &block.attrs;

    let methods: Vec<TokenStream> = block.registers.iter().map(generate_methods).collect();

    quote! {
        #(#attrs)*
        #vis struct #name<IO> {
            io: IO,
        }

        impl<IO> #name<IO> {
            /// Wraps a register backend.
            ///
            /// The backend decides how offsets become bus accesses; any
            /// `unsafe` contract lives in the backend's constructor.
            #[must_use]
            #vis const fn new(io: IO) -> Self {
                Self { io }
            }

            /// Returns the underlying backend.
            #[must_use]
            #vis fn io(&self) -> &IO {
                &self.io
            }

            /// Consumes the block and returns the backend.
            #vis fn into_io(self) -> IO {
                self.io
            }
        }

        impl<IO: ::uartdm_mmio::RegisterIo> #name<IO> {
            /// Orders all previous register writes before any later access.
            #[inline]
            pub fn barrier(&self) {
                ::uartdm_mmio::RegisterIo::barrier(&self.io);
            }

            #(#methods)*
        }
    }
}

fn generate_methods(reg: &RegisterDef) -> TokenStream {
    let mut methods = TokenStream::new();
    if reg.access.readable() {
        methods.extend(generate_read(reg));
    }
    if reg.access.writable() {
        methods.extend(generate_write(reg));
    }
    methods
}

/// Expression for the byte offset of the register (or bank element `n`).
fn offset_expr(reg: &RegisterDef) -> TokenStream {
    let offset = &reg.offset;
    match &reg.count {
        Some(count) => quote! {{
            debug_assert!(n < #count, "register bank index out of range");
            #offset + n * 4
        }},
        None => quote! { #offset },
    }
}

fn generate_read(reg: &RegisterDef) -> TokenStream {
    let name = &reg.name;
    let attrs = &reg.attrs;
    let offset = offset_expr(reg);
    let index_param = reg.count.as_ref().map(|_| quote! { , n: usize });

    let (ret_ty, wrap) = match &reg.value_type {
        Some(ty) => (quote! { #ty }, quote! { #ty::from_bits_retain(raw) }),
        None => (quote! { u32 }, quote! { raw }),
    };

    quote! {
        #(#attrs)*
        #[inline]
        pub fn #name(&self #index_param) -> #ret_ty {
            let raw = ::uartdm_mmio::RegisterIo::read32(&self.io, #offset);
            #wrap
        }
    }
}

fn generate_write(reg: &RegisterDef) -> TokenStream {
    let name = &reg.name;
    let setter_name = format_ident!("set_{}", name);
    let offset = offset_expr(reg);
    let index_param = reg.count.as_ref().map(|_| quote! { n: usize, });

    // Write-only registers carry their doc on the setter; read-write ones
    // already documented the getter.
    let doc = if reg.access.readable() {
        let text = format!("Writes the `{name}` register.");
        quote! { #[doc = #text] }
    } else {
        let attrs = &reg.attrs;
        quote! { #(#attrs)* }
    };

    let (value_ty, raw) = match &reg.value_type {
        Some(ty) => (quote! { #ty }, quote! { value.bits() }),
        None => (quote! { u32 }, quote! { value }),
    };

    quote! {
        #doc
        #[inline]
        pub fn #setter_name(&self, #index_param value: #value_ty) {
            ::uartdm_mmio::RegisterIo::write32(&self.io, #offset, #raw);
        }
    }
}
