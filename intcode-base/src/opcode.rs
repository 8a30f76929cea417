//! Intcode instruction set.

/// Kind of instruction parameter.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ParamKind {
    /// Resolved through its mode before the instruction runs.
    Value,
    /// Where the instruction writes. Kept unresolved until the write.
    Dest,
}

/// Does instruction talk to the outside world. Runner suspends around
/// [`IoClass::Input`] and [`IoClass::Output`] instructions.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum IoClass {
    Internal,
    Input,
    Output,
}

/// What instruction asks the runner to do. Returned by [`OPCodeKind::apply`].
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Effect {
    /// Write value to the destination parameter
    Write(i64),
    /// Write next input value to the destination parameter
    Input,
    /// Emit value to output
    Output(i64),
    /// Set instruction pointer
    Jump(i64),
    /// Add value to relative base
    AdjustBase(i64),
    /// Stop execution process
    Halt,
    /// Nothing, ex. jump condition is not met
    Idle,
}

/// read macro or code bellow. Also check docs.
///
/// ```ignore
/// impl_opcodes! {
///     pub enum Foo {
///         /// doc
///         Bar = 1, "bar", [Value, Dest], Internal, |v| Effect::Write(v[0]);
///     }
/// }
/// ```
///
/// `v` is a slice of resolved [`ParamKind::Value`] parameters, in order.
macro_rules! impl_opcodes {
    ($(#[$m:meta])* $v:vis enum $name:ident {
        $(
            $(#[doc = $doc:literal])*
            $var:ident = $code:literal, $mnemonic:literal, [$($param:ident),* $(,)?], $io:ident,
            |$args:ident| $body:expr
        );* $(;)?
    }) => {
        $(#[$m])*
        $v enum $name {$(
            $(#[doc = $doc])* $var = $code,
        )*}

        impl $name {
            /// Array of all variants.
            pub const VARIANTS: &[$name] = &[$(Self::$var, )*];

            /// Get assembler mnemonic of variant.
            pub const fn name(self) -> &'static str {
                match self {$(
                    Self::$var => $mnemonic,
                )*}
            }

            /// Get documentation for variant.
            ///
            /// *Note*: provided documentation is IN-CODE documentation, like that
            /// you type in `///`.
            pub const fn incode_doc(self) -> &'static str {
                match self {$(
                    Self::$var => concat!($($doc, )*),
                )*}
            }

            /// Parameters in the order they follow the instruction word.
            pub const fn params(self) -> &'static [ParamKind] {
                match self {$(
                    Self::$var => &[$(ParamKind::$param, )*],
                )*}
            }

            pub const fn io_class(self) -> IoClass {
                match self {$(
                    Self::$var => IoClass::$io,
                )*}
            }

            /// Computes effect from resolved value parameters.
            pub fn apply(self, values: &[i64]) -> Effect {
                match self {$(
                    Self::$var => {
                        let $args = values;
                        $body
                    }
                )*}
            }
        }
    };
}

impl_opcodes! {
    /// Represents instruction kind. Can be obtained from raw opcode using
    /// [`OPCodeKind::from_raw`] or from mnemonic using [`OPCodeKind::from_name`].
    #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
    #[repr(u8)]
    pub enum OPCodeKind {
        /// Performs `dest <- a + b`
        Add = 1, "add", [Value, Value, Dest], Internal,
            |v| Effect::Write(v[0].wrapping_add(v[1]));
        /// Performs `dest <- a * b`
        Mul = 2, "mul", [Value, Value, Dest], Internal,
            |v| Effect::Write(v[0].wrapping_mul(v[1]));
        /// Reads next input value to `dest`
        In = 3, "in", [Dest], Input,
            |_v| Effect::Input;
        /// Writes `a` to output
        Out = 4, "out", [Value], Output,
            |v| Effect::Output(v[0]);
        /// Jump to `addr` if `a != 0`
        Tjmp = 5, "tjmp", [Value, Value], Internal,
            |v| if v[0] != 0 { Effect::Jump(v[1]) } else { Effect::Idle };
        /// Jump to `addr` if `a == 0`
        Fjmp = 6, "fjmp", [Value, Value], Internal,
            |v| if v[0] == 0 { Effect::Jump(v[1]) } else { Effect::Idle };
        /// Performs `dest <- a < b`
        Lt = 7, "lt", [Value, Value, Dest], Internal,
            |v| Effect::Write((v[0] < v[1]) as i64);
        /// Performs `dest <- a == b`
        Eq = 8, "eq", [Value, Value, Dest], Internal,
            |v| Effect::Write((v[0] == v[1]) as i64);
        /// Performs `base <- base + a`
        Rbs = 9, "rbs", [Value], Internal,
            |v| Effect::AdjustBase(v[0]);
        /// Stop execution process
        End = 99, "end", [], Internal,
            |_v| Effect::Halt;
    }
}

/// Most parameters an instruction can take.
pub const MAX_PARAMS: usize = 3;

impl OPCodeKind {
    /// Try get opcode kind by raw opcode, the two low digits of instruction word.
    #[inline(always)]
    pub fn from_raw(opcode: i64) -> Option<Self> {
        Self::VARIANTS
            .iter()
            .find(|p| p.as_raw() == opcode)
            .copied()
    }
    /// Try get opcode kind by assembler mnemonic. Case-sensitive.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::VARIANTS.iter().find(|p| p.name() == name).copied()
    }
    /// Returns raw opcode.
    #[inline(always)]
    pub fn as_raw(self) -> i64 {
        self as u8 as i64
    }

    /// Return count of parameters
    #[inline(always)]
    pub fn args_count(self) -> usize {
        self.params().len()
    }
    /// Instruction length in memory cells, including instruction word itself.
    pub fn width(self) -> usize {
        self.args_count() + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instruction_table() {
        #[rustfmt::skip]
        let expected = [
            (1,  "add",  3, IoClass::Internal),
            (2,  "mul",  3, IoClass::Internal),
            (3,  "in",   1, IoClass::Input),
            (4,  "out",  1, IoClass::Output),
            (5,  "tjmp", 2, IoClass::Internal),
            (6,  "fjmp", 2, IoClass::Internal),
            (7,  "lt",   3, IoClass::Internal),
            (8,  "eq",   3, IoClass::Internal),
            (9,  "rbs",  1, IoClass::Internal),
            (99, "end",  0, IoClass::Internal),
        ];

        assert_eq!(OPCodeKind::VARIANTS.len(), expected.len());
        for (raw, name, argc, io) in expected {
            let kind = OPCodeKind::from_raw(raw).unwrap();

            assert_eq!(kind.name(), name);
            assert_eq!(kind.args_count(), argc, "opcode: {name}");
            assert_eq!(kind.io_class(), io, "opcode: {name}");
            assert_eq!(OPCodeKind::from_name(name), Some(kind));
            assert!(kind.args_count() <= MAX_PARAMS);
        }

        assert_eq!(OPCodeKind::from_raw(0), None);
        assert_eq!(OPCodeKind::from_raw(42), None);
        assert_eq!(OPCodeKind::from_raw(-1), None);
        assert_eq!(OPCodeKind::from_name("ADD"), None);
    }

    #[test]
    fn destinations_are_last() {
        // assembler and decoder rely on `Dest` never preceding a `Value`
        for kind in OPCodeKind::VARIANTS {
            let params = kind.params();
            let first_dest = params.iter().position(|p| *p == ParamKind::Dest);
            if let Some(idx) = first_dest {
                assert!(params[idx..].iter().all(|p| *p == ParamKind::Dest), "{kind:?}");
            }
        }
    }

    #[test]
    fn effects() {
        #[rustfmt::skip]
        let cases: &[(OPCodeKind, &[i64], Effect)] = &[
            (OPCodeKind::Add,  &[2, 3],          Effect::Write(5)),
            (OPCodeKind::Add,  &[i64::MAX, 1],   Effect::Write(i64::MIN)),
            (OPCodeKind::Mul,  &[-4, 3],         Effect::Write(-12)),
            (OPCodeKind::In,   &[],              Effect::Input),
            (OPCodeKind::Out,  &[7],             Effect::Output(7)),
            (OPCodeKind::Tjmp, &[1, 10],         Effect::Jump(10)),
            (OPCodeKind::Tjmp, &[0, 10],         Effect::Idle),
            (OPCodeKind::Fjmp, &[0, 10],         Effect::Jump(10)),
            (OPCodeKind::Fjmp, &[-3, 10],        Effect::Idle),
            (OPCodeKind::Lt,   &[1, 2],          Effect::Write(1)),
            (OPCodeKind::Lt,   &[2, 2],          Effect::Write(0)),
            (OPCodeKind::Eq,   &[2, 2],          Effect::Write(1)),
            (OPCodeKind::Eq,   &[2, -2],         Effect::Write(0)),
            (OPCodeKind::Rbs,  &[-19],           Effect::AdjustBase(-19)),
            (OPCodeKind::End,  &[],              Effect::Halt),
        ];

        for (kind, values, effect) in cases {
            assert_eq!(kind.apply(values), *effect, "{kind:?} {values:?}");
        }
    }

    #[test]
    fn docs() {
        assert_eq!(OPCodeKind::End.incode_doc(), " Stop execution process");
    }
}
