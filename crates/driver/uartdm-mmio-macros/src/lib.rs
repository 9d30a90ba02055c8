//! Proc-macro crate for the `register_block!` register map DSL.
//!
//! Generated blocks are generic over a `uartdm_mmio::RegisterIo` backend, so
//! the same register map drives real hardware through `Mmio` and host tests
//! through the recording mock.

mod codegen;
mod parse;

use proc_macro::TokenStream;
use syn::parse_macro_input;

use crate::parse::RegisterBlock;

/// Generates a typed 32-bit register block struct.
///
/// # Syntax
///
/// ```ignore
/// register_block! {
///     /// Doc comment for the struct.
///     pub StructName {
///         /// Doc comment for the register.
///         [offset; access_mode] name => OptionalType,
///         /// Indexed register bank, `count` words starting at `offset`.
///         [offset; access_mode; count] bank,
///     }
/// }
/// ```
///
/// - `offset`: byte offset from the block base (integer literal)
/// - `access_mode`: `ro`, `wo`, or `rw`
/// - `count`: optional; turns the register into a bank of `count` consecutive
///   words, addressed by index
/// - `=> Type`: optional wrapper type with `from_bits_retain(u32)` and
///   `bits(self) -> u32`
///
/// Two registers may share an offset when one is `ro` and the other `wo`;
/// that is how overlaid status/control pairs are described.
///
/// # Generated Code
///
/// - `ro`/`rw`: `fn name(&self) -> Type`, or `fn name(&self, n: usize)` for banks
/// - `wo`/`rw`: `fn set_name(&self, value: Type)`, or `fn set_name(&self, n, value)`
/// - `fn barrier(&self)` forwarding to the backend
#[proc_macro]
pub fn register_block(input: TokenStream) -> TokenStream {
    let block = parse_macro_input!(input as RegisterBlock);
    codegen::generate(&block).into()
}
