use crate::intern::Symbol;
use crate::source::SourceLocation;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum TokenType {
    EndOfInput,
    Identifier,
    Number,
    String,
    BlockLiteral,
    LineComment,
    BlockComment,

    LeftParen,
    RightParen,
    LeftBracket,
    RightBracket,
    LeftBrace,
    RightBrace,
    Comma,
    Semicolon,
    Colon,
    Dot,
    Caret,
    At,
    Hash,

    Declare,   // :=
    Bind,      // ::
    Arrow,     // ->
    FatArrow,  // =>
    Assign,    // =

    PlusAssign,
    MinusAssign,
    StarAssign,
    SlashAssign,
    PercentAssign,
    PipeAssign,
    AmpAssign,

    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    StarStar,

    Pipe,
    Amp,
    Tilde,
    Bang,
    PipePipe,
    AmpAmp,

    Lt,
    Gt,
    Eq,
    Ne,
    Le,
    Ge,

    RangeInclusive, // ..
    RangeExclusive, // ..<

    Xor,
    Shl,
    Shr,
    Rol,
    Ror,
    In,

    KwIf,
    KwElse,
    KwSwitch,
    KwCase,
    KwFor,
    KwWhile,
    KwBreak,
    KwContinue,
    KwFallthrough,
    KwGoto,
    KwDefer,
    KwReturn,
    KwYield,
    KwProc,
    KwEnum,
    KwStruct,
    KwUnion,
    KwFamily,
    KwCast,
    KwBitcast,
    KwModule,
    KwImport,
    KwNs,
    KwWith,
    KwUse,
}

impl TokenType {
    pub fn is_keyword(self) -> bool {
        matches!(
            self,
            TokenType::KwIf
                | TokenType::KwElse
                | TokenType::KwSwitch
                | TokenType::KwCase
                | TokenType::KwFor
                | TokenType::KwWhile
                | TokenType::KwBreak
                | TokenType::KwContinue
                | TokenType::KwFallthrough
                | TokenType::KwGoto
                | TokenType::KwDefer
                | TokenType::KwReturn
                | TokenType::KwYield
                | TokenType::KwProc
                | TokenType::KwEnum
                | TokenType::KwStruct
                | TokenType::KwUnion
                | TokenType::KwFamily
                | TokenType::KwCast
                | TokenType::KwBitcast
                | TokenType::KwModule
                | TokenType::KwImport
                | TokenType::KwNs
                | TokenType::KwWith
                | TokenType::KwUse
                | TokenType::In
                | TokenType::Xor
                | TokenType::Shl
                | TokenType::Shr
                | TokenType::Rol
                | TokenType::Ror
        )
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum NumberType {
    Integer,
    FloatingPoint,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum NumberSize {
    Byte,
    Word,
    Dword,
    Qword,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Radix {
    Binary = 2,
    Octal = 8,
    Decimal = 10,
    Hex = 16,
}

/// Extra component carried by tokens of type `Number`: integers minimize
/// to the smallest sufficient unsigned or signed width, floats narrow to
/// `f32` when representable without loss.
#[derive(Clone, Copy, Debug)]
pub struct NumberToken {
    pub kind: NumberType,
    pub radix: Radix,
    pub size: NumberSize,
    pub is_signed: bool,
    pub imaginary: bool,
    pub int_value: u64,
    pub float_value: f64,
}

/// A single nesting level of a `/* ... */` comment, preserving the tree
/// shape documentation tooling needs to recover nested spans.
#[derive(Clone, Debug)]
pub struct BlockCommentToken {
    pub capture: SourceLocation,
    pub children: Vec<BlockCommentToken>,
}

#[derive(Clone, Debug)]
pub struct Token {
    pub kind: TokenType,
    pub lexeme: Symbol,
    pub location: SourceLocation,
    pub number: Option<NumberToken>,
    pub block_comment: Option<BlockCommentToken>,
}

impl Token {
    pub fn new(kind: TokenType, lexeme: Symbol, location: SourceLocation) -> Token {
        Token {
            kind,
            lexeme,
            location,
            number: None,
            block_comment: None,
        }
    }

    pub fn with_number(mut self, number: NumberToken) -> Token {
        self.number = Some(number);
        self
    }

    pub fn with_block_comment(mut self, comment: BlockCommentToken) -> Token {
        self.block_comment = Some(comment);
        self
    }

    pub fn is(&self, kind: TokenType) -> bool {
        self.kind == kind
    }
}
