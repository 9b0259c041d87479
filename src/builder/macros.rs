//! Macros for declaring enumerated states.

/// Generate a state enum with its `State` trait implementation.
///
/// Every variant is paired with its display name. The generated enum is
/// `Copy`, hashable and ordered so it can key maps, and it gains `ALL`,
/// `from_name` and a `Display` impl.
///
/// # Example
///
/// ```
/// use fsm_reducer::state_enum;
/// use fsm_reducer::core::State;
///
/// state_enum! {
///     pub enum JobState {
///         Queued => "QUEUED",
///         Done => "DONE",
///         Crashed => "CRASHED",
///     }
///     final: [Done]
///     error: [Crashed]
/// }
///
/// assert_eq!(JobState::from_name("DONE"), Some(JobState::Done));
/// assert!(JobState::Crashed.is_error());
/// assert_eq!(JobState::ALL.len(), 3);
/// ```
#[macro_export]
macro_rules! state_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident => $label:literal
            ),* $(,)?
        }

        $(final: [$($final:ident),* $(,)?])?
        $(error: [$($error:ident),* $(,)?])?
    ) => {
        #[derive(
            Clone,
            Copy,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            Debug,
            serde::Serialize,
            serde::Deserialize
        )]
        $(#[$meta])*
        $vis enum $name {
            $(
                $(#[$variant_meta])*
                #[serde(rename = $label)]
                $variant
            ),*
        }

        impl $name {
            /// Every variant in declaration order.
            pub const ALL: &'static [$name] = &[$(Self::$variant),*];

            /// Look up a variant by its display name.
            pub fn from_name(name: &str) -> Option<Self> {
                match name {
                    $($label => Some(Self::$variant),)*
                    _ => None,
                }
            }
        }

        impl $crate::core::State for $name {
            fn name(&self) -> &str {
                match self {
                    $(Self::$variant => $label),*
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

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str($crate::core::State::name(self))
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use crate::core::State;

    state_enum! {
        enum TestState {
            Initial => "initial",
            Processing => "processing",
            Complete => "complete",
            Failed => "failed",
        }
        final: [Complete, Failed]
        error: [Failed]
    }

    #[test]
    fn state_enum_macro_generates_trait() {
        let state = TestState::Initial;
        assert_eq!(state.name(), "initial");
        assert!(!state.is_final());
        assert!(!state.is_error());

        let failed = TestState::Failed;
        assert!(failed.is_final());
        assert!(failed.is_error());
    }

    #[test]
    fn names_round_trip_through_serde() {
        let json = serde_json::to_string(&TestState::Processing).unwrap();
        assert_eq!(json, "\"processing\"");
        let back: TestState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, TestState::Processing);
    }

    #[test]
    fn from_name_and_display() {
        assert_eq!(TestState::from_name("complete"), Some(TestState::Complete));
        assert_eq!(TestState::from_name("COMPLETE"), None);
        assert_eq!(TestState::Complete.to_string(), "complete");
    }

    #[test]
    fn state_enum_works_without_final_error() {
        state_enum! {
            enum MinimalState {
                One => "one",
                Two => "two",
            }
        }

        let state = MinimalState::One;
        assert!(!state.is_final());
        assert!(!state.is_error());
        assert_eq!(MinimalState::ALL, &[MinimalState::One, MinimalState::Two]);
    }
}
