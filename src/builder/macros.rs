//! Macros for declaring state and action enums.

/// Generate a `State` implementation for a fieldless enum.
///
/// # Example
///
/// ```
/// use reactive_fsm::state_enum;
///
/// state_enum! {
///     pub enum DownloadState {
///         Idle,
///         Downloading,
///         Done,
///         Failed,
///     }
///     final: [Done, Failed]
///     error: [Failed]
/// }
/// ```
#[macro_export]
macro_rules! state_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident
            ),* $(,)?
        }

        $(final: [$($final:ident),* $(,)?])?
        $(error: [$($error:ident),* $(,)?])?
    ) => {
        $(#[$meta])*
        #[derive(Clone, PartialEq, Debug, serde::Serialize, serde::Deserialize)]
        $vis enum $name {
            $(
                $(#[$variant_meta])*
                $variant
            ),*
        }

        impl $crate::core::State for $name {
            fn name(&self) -> &str {
                match self {
                    $(Self::$variant => stringify!($variant)),*
                }
            }

            fn is_final(&self) -> bool {
                match self {
                    $($(Self::$final => true,)*)?
                    _ => false,
                }
            }

            fn is_error(&self) -> bool {
                match self {
                    $($(Self::$error => true,)*)?
                    _ => false,
                }
            }
        }
    };
}

/// Generate an action enum together with its fieldless kind enum and the
/// `Action` implementation mapping one to the other.
///
/// Variants may be unit, tuple or struct variants.
///
/// # Example
///
/// ```
/// use reactive_fsm::action_enum;
/// use reactive_fsm::core::Action;
///
/// action_enum! {
///     pub enum PlayerAction {
///         Play,
///         Seek(u64),
///         Volume { level: u8 },
///     }
///     kind: PlayerActionKind
/// }
///
/// assert_eq!(PlayerAction::Seek(30).kind(), PlayerActionKind::Seek);
/// assert_eq!(PlayerAction::Volume { level: 3 }.kind(), PlayerActionKind::Volume);
/// ```
#[macro_export]
macro_rules! action_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident
                $(( $($field:ty),* $(,)? ))?
                $({ $($field_name:ident : $field_ty:ty),* $(,)? })?
            ),* $(,)?
        }

        kind: $kind:ident
    ) => {
        $(#[$meta])*
        #[derive(Clone, PartialEq, Debug)]
        $vis enum $name {
            $(
                $(#[$variant_meta])*
                $variant
                $(( $($field),* ))?
                $({ $($field_name: $field_ty),* })?
            ),*
        }

        #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
        $vis enum $kind {
            $($variant),*
        }

        impl $crate::core::Action for $name {
            type Kind = $kind;

            fn kind(&self) -> $kind {
                match self {
                    $(Self::$variant { .. } => $kind::$variant),*
                }
            }
        }
    };
}
