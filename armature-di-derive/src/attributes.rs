use syn::{Attribute, Error, ExprPath, LitStr, Token};

pub enum DefaultDefinition {
    Default,
    Expr(ExprPath),
}

#[derive(Default)]
pub struct FieldAttributes {
    pub default: Option<DefaultDefinition>,
    pub key: Option<LitStr>,
    pub context: Option<LitStr>,
}

impl TryFrom<&Attribute> for FieldAttributes {
    type Error = Error;

    fn try_from(value: &Attribute) -> Result<Self, Self::Error> {
        let mut default = None;
        let mut key = None;
        let mut context = None;
        value.parse_nested_meta(|meta| {
            if meta.path.is_ident("default") {
                if meta.input.peek(Token![=]) {
                    let value = meta.value()?;
                    let expr: LitStr = value.parse()?;
                    default = Some(DefaultDefinition::Expr(expr.parse()?));
                } else {
                    default = Some(DefaultDefinition::Default);
                }
            } else if meta.path.is_ident("key") {
                key = Some(meta.value().and_then(|value| value.parse())?);
            } else if meta.path.is_ident("context") {
                context = Some(meta.value().and_then(|value| value.parse())?);
            } else {
                return Err(meta.error("Unsupported inject attribute!"));
            }

            Ok(())
        })?;

        if default.is_some() && key.is_some() {
            return Err(Error::new_spanned(
                value,
                "A field cannot have both a default and a binding key!",
            ));
        }

        if context.is_some() && key.is_none() {
            return Err(Error::new_spanned(
                value,
                "A binding context requires a binding key!",
            ));
        }

        Ok(Self {
            default,
            key,
            context,
        })
    }
}
