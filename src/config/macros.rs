/// Configuration macros for single-declaration config sections
///
/// `config_struct!` defines a config section with its defaults inline:
/// every field is declared once as `name: Type = default`.
///
/// # Example
/// ```
/// cartswap::config_struct! {
///     pub struct CartConfig {
///         max_items: usize = 20,
///         weight_decimals: u32 = 4,
///     }
/// }
///
/// let cfg = CartConfig::default();
/// assert_eq!(cfg.max_items, 20);
/// ```
///
/// The expansion is a struct with public fields, a `Default` impl built from
/// the declared values, and serde support with `#[serde(default)]` so a
/// partial TOML section falls back to the declared defaults field by field.
#[macro_export]
macro_rules! config_struct {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $(
                $(#[$field_meta:meta])*
                $field_name:ident: $field_type:ty = $default_value:expr
            ),*
            $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
        #[serde(default)]
        $vis struct $name {
            $(
                $(#[$field_meta])*
                pub $field_name: $field_type,
            )*
        }

        impl Default for $name {
            fn default() -> Self {
                Self {
                    $(
                        $field_name: $default_value,
                    )*
                }
            }
        }
    };
}
