use thiserror::Error;

/// A stable, documentation-linkable identifier for a diagnostic: a
/// machine-checkable name rather than a bare string. Derives `thiserror`
/// like every other structured error enum in the toolchain, even though
/// diagnostics are collected as values rather than returned as `Err`.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, Error)]
pub enum DiagnosticCode {
    #[error("E0001")]
    UnterminatedString,
    #[error("E0002")]
    UnterminatedBlockComment,
    #[error("E0003")]
    UnterminatedBlockLiteral,
    #[error("E0004")]
    InvalidEscapeSequence,
    #[error("E0005")]
    InvalidCodepoint,
    #[error("E0006")]
    NumberLiteralOverflow,
    #[error("E0007")]
    InvalidNumberLiteral,
    #[error("E0008")]
    UnexpectedCharacter,
    #[error("E0009")]
    UnexpectedToken,
    #[error("E0010")]
    ExpectedExpression,
    #[error("E0011")]
    ExpectedToken,
    #[error("E0015")]
    ExpectedIdentifier,
    #[error("E0012")]
    UndeclaredIdentifier,
    #[error("E0013")]
    DuplicateDeclaration,
    #[error("E0014")]
    InvalidLvalue,
    #[error("E0016")]
    UnableToOpenFile,
    #[error("E0017")]
    IllegalUtf8Encoding,
    #[error("E0018")]
    IllegalNulByte,
    #[error("E0019")]
    IllegalByteOrderMark,
    #[error("E0020")]
    AdvancePastEnd,
    #[error("E0021")]
    AdvancePastBeginning,
}

impl DiagnosticCode {
    pub fn as_str(self) -> &'static str {
        match self {
            DiagnosticCode::UnterminatedString => "E0001",
            DiagnosticCode::UnterminatedBlockComment => "E0002",
            DiagnosticCode::UnterminatedBlockLiteral => "E0003",
            DiagnosticCode::InvalidEscapeSequence => "E0004",
            DiagnosticCode::InvalidCodepoint => "E0005",
            DiagnosticCode::NumberLiteralOverflow => "E0006",
            DiagnosticCode::InvalidNumberLiteral => "E0007",
            DiagnosticCode::UnexpectedCharacter => "E0008",
            DiagnosticCode::UnexpectedToken => "E0009",
            DiagnosticCode::ExpectedExpression => "E0010",
            DiagnosticCode::ExpectedToken => "E0011",
            DiagnosticCode::UndeclaredIdentifier => "E0012",
            DiagnosticCode::DuplicateDeclaration => "E0013",
            DiagnosticCode::InvalidLvalue => "E0014",
            DiagnosticCode::ExpectedIdentifier => "E0015",
            DiagnosticCode::UnableToOpenFile => "E0016",
            DiagnosticCode::IllegalUtf8Encoding => "E0017",
            DiagnosticCode::IllegalNulByte => "E0018",
            DiagnosticCode::IllegalByteOrderMark => "E0019",
            DiagnosticCode::AdvancePastEnd => "E0020",
            DiagnosticCode::AdvancePastBeginning => "E0021",
        }
    }
}
