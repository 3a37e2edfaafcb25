//! Helper macro for declaring port error enums with `impl Into` constructors.

macro_rules! define_port_error {
    (
        $(#[$enum_attr:meta])*
        pub enum $name:ident {
            $(
                $(#[$variant_attr:meta])*
                $variant:ident $( {
                    $( $(#[$field_attr:meta])* $field:ident : $ty:ty ),* $(,)?
                } )? => $display:expr
            ),* $(,)?
        }
    ) => {
        $(#[$enum_attr])*
        #[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
        pub enum $name {
            $(
                $(#[$variant_attr])*
                #[error($display)]
                $variant $( { $( $(#[$field_attr])* $field: $ty ),* } )?,
            )*
        }

        impl $name {
            $(
                define_port_error!(@constructor $variant $( { $($field: $ty),* } )?);
            )*
        }
    };

    (@constructor $variant:ident) => {
        ::paste::paste! {
            #[doc = concat!("Build a [`Self::", stringify!($variant), "`] error.")]
            pub fn [<$variant:snake>]() -> Self {
                Self::$variant
            }
        }
    };

    (@constructor $variant:ident { $($field:ident : $ty:ty),* }) => {
        ::paste::paste! {
            #[doc = concat!("Build a [`Self::", stringify!($variant), "`] error.")]
            pub fn [<$variant:snake>]($($field: impl Into<$ty>),*) -> Self {
                Self::$variant { $($field: $field.into()),* }
            }
        }
    };
}

pub(crate) use define_port_error;

#[cfg(test)]
mod tests {
    //! Constructor and display coverage for generated errors.
    define_port_error! {
        pub enum SamplePortError {
            Refused { message: String } => "refused: {message}",
            Status { status: u16 } => "status {status}",
            Detailed { message: String, status: u16 } => "{message} ({status})",
            Closed => "closed",
            /// Variant whose field carries its own docs.
            Documented {
                /// Host that could not be reached.
                host: String,
            } => "unreachable: {host}",
        }
    }

    #[test]
    fn constructors_accept_str_for_string_fields() {
        let err = SamplePortError::refused("nope");
        assert_eq!(err.to_string(), "refused: nope");
    }

    #[test]
    fn constructors_preserve_non_string_types() {
        let err = SamplePortError::status(401_u16);
        assert_eq!(err.to_string(), "status 401");
    }

    #[test]
    fn constructors_support_mixed_fields() {
        let err = SamplePortError::detailed("gateway", 502_u16);
        assert_eq!(err.to_string(), "gateway (502)");
    }

    #[test]
    fn documented_fields_keep_their_constructor() {
        let err = SamplePortError::documented("api.skillswap.test");
        assert_eq!(
            err,
            SamplePortError::Documented {
                host: "api.skillswap.test".to_owned()
            }
        );
        assert_eq!(err.to_string(), "unreachable: api.skillswap.test");
    }

    #[test]
    fn unit_variants_get_constructors() {
        assert_eq!(SamplePortError::closed(), SamplePortError::Closed);
    }
}
