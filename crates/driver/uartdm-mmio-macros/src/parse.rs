//! Parsing for the `register_block!` DSL.

use syn::parse::{Parse, ParseStream};
use syn::{Attribute, Ident, LitInt, Token, Visibility, braced, bracketed};

/// A complete register block definition.
pub struct RegisterBlock {
    /// Attributes on the struct (doc comments, derives).
    pub attrs: Vec<Attribute>,
    /// Visibility of the generated struct.
    pub vis: Visibility,
    /// Name of the generated struct.
    pub name: Ident,
    /// Register definitions, in source order.
    pub registers: Vec<RegisterDef>,
}

/// Access mode for a register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    /// Read-only.
    ReadOnly,
    /// Write-only.
    WriteOnly,
    /// Read-write.
    ReadWrite,
}

impl AccessMode {
    pub fn readable(self) -> bool {
        self != Self::WriteOnly
    }

    pub fn writable(self) -> bool {
        self != Self::ReadOnly
    }
}

/// A single register, or a bank of consecutive registers.
pub struct RegisterDef {
    /// Doc attributes on this register.
    pub attrs: Vec<Attribute>,
    /// Byte offset from the block base.
    pub offset: LitInt,
    /// Access mode.
    pub access: AccessMode,
    /// Number of words in a bank; `None` for a plain register.
    pub count: Option<LitInt>,
    /// Register name (used for method names).
    pub name: Ident,
    /// Optional wrapper type.
    pub value_type: Option<Ident>,
}

impl Parse for RegisterBlock {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let attrs = input.call(Attribute::parse_outer)?;
        let vis: Visibility = input.parse()?;
        let name: Ident = input.parse()?;

        let content;
        braced!(content in input);

        let mut registers: Vec<RegisterDef> = Vec::new();
        while !content.is_empty() {
            let reg = content.call(parse_register)?;
            check_overlap(&registers, &reg)?;
            registers.push(reg);
        }

        Ok(Self {
            attrs,
            vis,
            name,
            registers,
        })
    }
}

/// Parses one `[offset; access(; count)?] name (=> Type)?,` line.
fn parse_register(input: ParseStream) -> syn::Result<RegisterDef> {
    let attrs = input.call(Attribute::parse_outer)?;

    let bracket_content;
    bracketed!(bracket_content in input);

    let offset: LitInt = bracket_content.parse()?;
    if offset.base10_parse::<u64>()? % 4 != 0 {
        return Err(syn::Error::new(
            offset.span(),
            "register offset must be 32-bit aligned",
        ));
    }
    bracket_content.parse::<Token![;]>()?;

    let access_ident: Ident = bracket_content.parse()?;
    let access = match access_ident.to_string().as_str() {
        "ro" => AccessMode::ReadOnly,
        "wo" => AccessMode::WriteOnly,
        "rw" => AccessMode::ReadWrite,
        _ => {
            return Err(syn::Error::new(
                access_ident.span(),
                "expected access mode: ro, wo, or rw",
            ));
        }
    };

    let count = if bracket_content.peek(Token![;]) {
        bracket_content.parse::<Token![;]>()?;
        let count: LitInt = bracket_content.parse()?;
        if count.base10_parse::<usize>()? == 0 {
            return Err(syn::Error::new(count.span(), "bank size must be non-zero"));
        }
        Some(count)
    } else {
        None
    };

    let name: Ident = input.parse()?;

    let value_type = if input.peek(Token![=>]) {
        input.parse::<Token![=>]>()?;
        Some(input.parse::<Ident>()?)
    } else {
        None
    };

    let _ = input.parse::<Option<Token![,]>>();

    Ok(RegisterDef {
        attrs,
        offset,
        access,
        count,
        name,
        value_type,
    })
}

/// Rejects a second register at the same offset unless the pair splits
/// cleanly into one read side and one write side.
fn check_overlap(existing: &[RegisterDef], reg: &RegisterDef) -> syn::Result<()> {
    let offset = reg.offset.base10_parse::<u64>()?;
    for other in existing {
        if other.offset.base10_parse::<u64>()? != offset {
            continue;
        }
        let split = (other.access == AccessMode::ReadOnly && reg.access == AccessMode::WriteOnly)
            || (other.access == AccessMode::WriteOnly && reg.access == AccessMode::ReadOnly);
        if !split {
            return Err(syn::Error::new(
                reg.name.span(),
                format!(
                    "`{}` overlaps `{}`; shared offsets need one `ro` and one `wo` register",
                    reg.name, other.name
                ),
            ));
        }
    }
    Ok(())
}
