//! The closed, versioned registry of node identifiers
//!
//! Every node carries a [`Tag`] drawn from this registry. Codes are stable
//! across releases and deliberately sparse so new variants can be added
//! without renumbering existing ones. Container tokens occupy the low range,
//! hand-maintained operation tokens the 0x0100 range, and the elementwise
//! function family starts at 0x0175.

/// Identifier for a node variant: a data container or an operation.
///
/// The numeric code of each tag is part of the wire protocol between the
/// dispatch layer and native engines and must never change. Arity and
/// result-count tables are exhaustive `match`es, so adding a tag without
/// covering it anywhere is a compile error.
#[repr(u64)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tag {
    /*
     * Data container tokens
     */
    /// Real scalar terminal
    RealScalar = 0x0002,
    /// Complex scalar terminal
    ComplexScalar = 0x0003,
    /// Real dense matrix terminal
    RealDenseMatrix = 0x0005,
    /// Complex dense matrix terminal
    ComplexDenseMatrix = 0x0007,
    /// Real sparse matrix terminal
    RealSparseMatrix = 0x000B,
    /// Complex sparse matrix terminal
    ComplexSparseMatrix = 0x000D,
    /// Real diagonal matrix terminal
    RealDiagonalMatrix = 0x0011,
    /// Complex diagonal matrix terminal
    ComplexDiagonalMatrix = 0x0013,
    /// Logical (boolean) matrix terminal
    LogicalMatrix = 0x0017,
    /// Integer scalar terminal (projection indices)
    IntegerScalar = 0x001D,

    /*
     * Operation tokens
     */
    /// Identity copy of the argument
    Copy = 0x010D,
    /// Projection of one output of a variadic-result node
    SelectResult = 0x010F,
    /// 2-norm (vectors: Euclidean norm; matrices: largest singular value)
    Norm2 = 0x0115,
    /// Singular value decomposition; 3 results (U, S, V^T)
    Svd = 0x0119,
    /// Matrix multiply
    Mtimes = 0x011B,
    /// Moore-Penrose pseudo-inverse
    Pinv = 0x0125,
    /// Transpose
    Transpose = 0x0133,
    /// Conjugate transpose
    Ctranspose = 0x0137,
    /// LU decomposition; 2 results (L, U)
    Lu = 0x0139,
    /// Matrix inverse
    Inv = 0x013D,
    /// Left division (solve A\b)
    Mldivide = 0x014B,
    /// QR decomposition; 2 results (Q, R)
    Qr = 0x0151,
    /// Column sums, producing a 1 x n row vector
    Sumcols = 0x015B,
    /// Row sums, producing an m x 1 column vector
    Sumrows = 0x015D,

    /*
     * Elementwise function family
     */
    /// Inverse cosine
    Acos = 0x017B,
    /// Inverse hyperbolic cosine
    Acosh = 0x017F,
    /// Inverse sine
    Asin = 0x018D,
    /// Inverse hyperbolic sine
    Asinh = 0x0191,
    /// Inverse tangent
    Atan = 0x0199,
    /// Inverse hyperbolic tangent
    Atanh = 0x01A3,
    /// Cosine
    Cos = 0x01AF,
    /// Hyperbolic cosine
    Cosh = 0x01B1,
    /// Exponential
    Exp = 0x01CF,
    /// Natural logarithm
    Log = 0x0209,
    /// Elementwise subtraction
    Minus = 0x020B,
    /// Negation
    Negate = 0x021D,
    /// Elementwise addition
    Plus = 0x0233,
    /// Elementwise (right) division
    Rdivide = 0x0239,
    /// Sine
    Sin = 0x024B,
    /// Hyperbolic sine
    Sinh = 0x0251,
    /// Square root
    Sqrt = 0x0257,
    /// Tangent
    Tan = 0x0259,
    /// Hyperbolic tangent
    Tanh = 0x025F,
    /// Elementwise multiplication
    Times = 0x0265,
}

impl Tag {
    /// The stable numeric code of this tag
    #[inline]
    pub const fn code(self) -> u64 {
        self as u64
    }

    /// Look up a tag from its numeric code
    pub fn from_code(code: u64) -> Option<Self> {
        use Tag::*;
        const ALL: &[Tag] = &[
            RealScalar,
            ComplexScalar,
            RealDenseMatrix,
            ComplexDenseMatrix,
            RealSparseMatrix,
            ComplexSparseMatrix,
            RealDiagonalMatrix,
            ComplexDiagonalMatrix,
            LogicalMatrix,
            IntegerScalar,
            Copy,
            SelectResult,
            Norm2,
            Svd,
            Mtimes,
            Pinv,
            Transpose,
            Ctranspose,
            Lu,
            Inv,
            Mldivide,
            Qr,
            Sumcols,
            Sumrows,
            Acos,
            Acosh,
            Asin,
            Asinh,
            Atan,
            Atanh,
            Cos,
            Cosh,
            Exp,
            Log,
            Minus,
            Negate,
            Plus,
            Rdivide,
            Sin,
            Sinh,
            Sqrt,
            Tan,
            Tanh,
            Times,
        ];
        ALL.iter().copied().find(|t| t.code() == code)
    }

    /// True for data container tokens, false for operations
    pub const fn is_container(self) -> bool {
        matches!(
            self,
            Tag::RealScalar
                | Tag::ComplexScalar
                | Tag::IntegerScalar
                | Tag::RealDenseMatrix
                | Tag::ComplexDenseMatrix
                | Tag::RealSparseMatrix
                | Tag::ComplexSparseMatrix
                | Tag::RealDiagonalMatrix
                | Tag::ComplexDiagonalMatrix
                | Tag::LogicalMatrix
        )
    }

    /// Declared argument count for operation tags; `None` for containers
    pub const fn arity(self) -> Option<usize> {
        use Tag::*;
        match self {
            RealScalar | ComplexScalar | IntegerScalar | RealDenseMatrix | ComplexDenseMatrix
            | RealSparseMatrix | ComplexSparseMatrix | RealDiagonalMatrix
            | ComplexDiagonalMatrix | LogicalMatrix => None,
            Plus | Minus | Times | Rdivide | Mtimes | Mldivide | SelectResult => Some(2),
            Copy | Norm2 | Svd | Pinv | Transpose | Ctranspose | Lu | Inv | Qr | Sumcols
            | Sumrows | Acos | Acosh | Asin | Asinh | Atan | Atanh | Cos | Cosh | Exp | Log
            | Negate | Sin | Sinh | Sqrt | Tan | Tanh => Some(1),
        }
    }

    /// Number of logical outputs this node kind produces when evaluated
    pub const fn result_count(self) -> u32 {
        match self {
            Tag::Svd => 3,
            Tag::Lu | Tag::Qr => 2,
            _ => 1,
        }
    }

    /// Human-readable name, used in messages and debug output
    pub const fn name(self) -> &'static str {
        use Tag::*;
        match self {
            RealScalar => "RealScalar",
            ComplexScalar => "ComplexScalar",
            IntegerScalar => "IntegerScalar",
            RealDenseMatrix => "RealDenseMatrix",
            ComplexDenseMatrix => "ComplexDenseMatrix",
            RealSparseMatrix => "RealSparseMatrix",
            ComplexSparseMatrix => "ComplexSparseMatrix",
            RealDiagonalMatrix => "RealDiagonalMatrix",
            ComplexDiagonalMatrix => "ComplexDiagonalMatrix",
            LogicalMatrix => "LogicalMatrix",
            Copy => "copy",
            SelectResult => "selectresult",
            Norm2 => "norm2",
            Svd => "svd",
            Mtimes => "mtimes",
            Pinv => "pinv",
            Transpose => "transpose",
            Ctranspose => "ctranspose",
            Lu => "lu",
            Inv => "inv",
            Mldivide => "mldivide",
            Qr => "qr",
            Sumcols => "sumcols",
            Sumrows => "sumrows",
            Acos => "acos",
            Acosh => "acosh",
            Asin => "asin",
            Asinh => "asinh",
            Atan => "atan",
            Atanh => "atanh",
            Cos => "cos",
            Cosh => "cosh",
            Exp => "exp",
            Log => "log",
            Minus => "minus",
            Negate => "negate",
            Plus => "plus",
            Rdivide => "rdivide",
            Sin => "sin",
            Sinh => "sinh",
            Sqrt => "sqrt",
            Tan => "tan",
            Tanh => "tanh",
            Times => "times",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_round_trip() {
        for code in 0..0x0300u64 {
            if let Some(tag) = Tag::from_code(code) {
                assert_eq!(tag.code(), code);
            }
        }
        assert_eq!(Tag::from_code(Tag::Svd.code()), Some(Tag::Svd));
        assert_eq!(Tag::from_code(0x0000), None);
        assert_eq!(Tag::from_code(0xFFFF), None);
    }

    #[test]
    fn containers_have_no_arity() {
        assert!(Tag::RealDenseMatrix.is_container());
        assert_eq!(Tag::RealDenseMatrix.arity(), None);
        assert!(!Tag::Plus.is_container());
        assert_eq!(Tag::Plus.arity(), Some(2));
        assert_eq!(Tag::Sin.arity(), Some(1));
    }

    #[test]
    fn variadic_result_counts() {
        assert_eq!(Tag::Svd.result_count(), 3);
        assert_eq!(Tag::Lu.result_count(), 2);
        assert_eq!(Tag::Qr.result_count(), 2);
        assert_eq!(Tag::Plus.result_count(), 1);
        assert_eq!(Tag::SelectResult.result_count(), 1);
    }
}
