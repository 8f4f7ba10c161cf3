use std::collections::HashMap;

use super::token::TokenType;

/// Which sub-tokenizer, if any, takes over once a lexeme's prefix has been
/// matched in the trie.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SubTokenizer {
    Identifier,
    DecimalNumber,
    HexNumber,
    OctalNumber,
    BinaryNumber,
    StringLiteral,
    BlockLiteral,
    LineComment,
    BlockComment,
}

/// A leaf value in the rune trie: the token type a matched path produces,
/// whether it's gated as a keyword, and an optional sub-tokenizer to hand
/// control to once matched.
#[derive(Clone, Copy, Debug)]
pub struct Lexeme {
    pub kind: TokenType,
    pub is_keyword: bool,
    pub tokenizer: Option<SubTokenizer>,
}

impl Lexeme {
    pub fn punct(kind: TokenType) -> Lexeme {
        Lexeme { kind, is_keyword: false, tokenizer: None }
    }

    pub fn keyword(kind: TokenType) -> Lexeme {
        Lexeme { kind, is_keyword: true, tokenizer: None }
    }

    pub fn sub(kind: TokenType, tokenizer: SubTokenizer) -> Lexeme {
        Lexeme { kind, is_keyword: false, tokenizer: Some(tokenizer) }
    }
}

#[derive(Default)]
struct TrieNode {
    children: HashMap<char, TrieNode>,
    lexeme: Option<Lexeme>,
}

/// A rune-keyed trie mapping lexeme spellings (punctuation, operators,
/// keywords) to their `Lexeme`. Sized for full Unicode rather than a fixed
/// byte alphabet, since identifiers may contain non-ASCII letters.
pub struct LexemeTrie {
    root: TrieNode,
}

impl LexemeTrie {
    pub fn new() -> LexemeTrie {
        LexemeTrie { root: TrieNode::default() }
    }

    pub fn insert(&mut self, spelling: &str, lexeme: Lexeme) {
        let mut node = &mut self.root;
        for ch in spelling.chars() {
            node = node.children.entry(ch).or_default();
        }
        node.lexeme = Some(lexeme);
    }

    /// Walks the trie from the root, tracking the longest matched lexeme
    /// seen so far. Returns `(lexeme, rune_count)` for the best match, if
    /// any survived.
    pub fn longest_match(&self, runes: impl Iterator<Item = char>) -> Option<(Lexeme, usize)> {
        let mut node = &self.root;
        let mut best: Option<(Lexeme, usize)> = None;
        let mut count = 0usize;

        for ch in runes {
            match node.children.get(&ch) {
                Some(next) => {
                    node = next;
                    count += 1;
                    if let Some(lexeme) = node.lexeme {
                        best = Some((lexeme, count));
                    }
                }
                None => break,
            }
        }

        best
    }

    /// Walks the trie directly over a `SourceBuffer`'s cursor, advancing it
    /// one rune at a time, then backs the cursor off to sit exactly past
    /// the longest *matched* lexeme (the trie descent may probe further
    /// runes than the winning match actually spans, e.g. `-:` probing
    /// toward `-:=` before failing on a missing `=`).
    pub fn walk(&self, buffer: &mut crate::source::SourceBuffer) -> Option<(Lexeme, usize)> {
        let mut node = &self.root;
        let mut best: Option<(Lexeme, usize)> = None;
        let mut count = 0usize;

        loop {
            let rune = buffer.current();
            if rune.is_eof() {
                break;
            }
            match node.children.get(&rune.value) {
                Some(next) => {
                    node = next;
                    count += 1;
                    buffer.next();
                    if let Some(lexeme) = node.lexeme {
                        best = Some((lexeme, count));
                    }
                }
                None => break,
            }
        }

        let best_count = best.map(|(_, c)| c).unwrap_or(0);
        for _ in best_count..count {
            buffer.prev();
        }

        best
    }

    fn default_table() -> Vec<(&'static str, Lexeme)> {
        use SubTokenizer::*;
        use TokenType::*;
        vec![
            ("(", Lexeme::punct(LeftParen)),
            (")", Lexeme::punct(RightParen)),
            ("[", Lexeme::punct(LeftBracket)),
            ("]", Lexeme::punct(RightBracket)),
            ("{{", Lexeme::sub(BlockLiteral, BlockLiteral)),
            ("{", Lexeme::punct(LeftBrace)),
            ("}", Lexeme::punct(RightBrace)),
            (",", Lexeme::punct(Comma)),
            (";", Lexeme::punct(Semicolon)),
            (".", Lexeme::punct(Dot)),
            ("..<", Lexeme::punct(RangeExclusive)),
            ("..", Lexeme::punct(RangeInclusive)),
            ("^", Lexeme::punct(Caret)),
            ("@0", Lexeme::sub(Number, OctalNumber)),
            ("@1", Lexeme::sub(Number, OctalNumber)),
            ("@2", Lexeme::sub(Number, OctalNumber)),
            ("@3", Lexeme::sub(Number, OctalNumber)),
            ("@4", Lexeme::sub(Number, OctalNumber)),
            ("@5", Lexeme::sub(Number, OctalNumber)),
            ("@6", Lexeme::sub(Number, OctalNumber)),
            ("@7", Lexeme::sub(Number, OctalNumber)),
            ("@", Lexeme::punct(At)),
            ("#", Lexeme::punct(Hash)),
            (":=", Lexeme::punct(Declare)),
            ("::", Lexeme::punct(Bind)),
            (":", Lexeme::punct(Colon)),
            ("->", Lexeme::punct(Arrow)),
            ("=>", Lexeme::punct(FatArrow)),
            ("==", Lexeme::punct(Eq)),
            ("=", Lexeme::punct(Assign)),
            ("+:=", Lexeme::punct(PlusAssign)),
            ("-:=", Lexeme::punct(MinusAssign)),
            ("*:=", Lexeme::punct(StarAssign)),
            ("/:=", Lexeme::punct(SlashAssign)),
            ("%:=", Lexeme::punct(PercentAssign)),
            ("|:=", Lexeme::punct(PipeAssign)),
            ("&:=", Lexeme::punct(AmpAssign)),
            ("+", Lexeme::punct(Plus)),
            ("-0", Lexeme::sub(Number, DecimalNumber)),
            ("-1", Lexeme::sub(Number, DecimalNumber)),
            ("-2", Lexeme::sub(Number, DecimalNumber)),
            ("-3", Lexeme::sub(Number, DecimalNumber)),
            ("-4", Lexeme::sub(Number, DecimalNumber)),
            ("-5", Lexeme::sub(Number, DecimalNumber)),
            ("-6", Lexeme::sub(Number, DecimalNumber)),
            ("-7", Lexeme::sub(Number, DecimalNumber)),
            ("-8", Lexeme::sub(Number, DecimalNumber)),
            ("-9", Lexeme::sub(Number, DecimalNumber)),
            ("-", Lexeme::punct(Minus)),
            ("**", Lexeme::punct(StarStar)),
            ("*", Lexeme::punct(Star)),
            ("/*", Lexeme::sub(BlockComment, BlockComment)),
            ("//", Lexeme::sub(LineComment, LineComment)),
            ("/", Lexeme::punct(Slash)),
            ("%", Lexeme::sub(Number, BinaryNumber)),
            ("||", Lexeme::punct(PipePipe)),
            ("|", Lexeme::punct(Pipe)),
            ("&&", Lexeme::punct(AmpAmp)),
            ("&", Lexeme::punct(Amp)),
            ("~", Lexeme::punct(Tilde)),
            ("!=", Lexeme::punct(Ne)),
            ("!", Lexeme::punct(Bang)),
            ("<=", Lexeme::punct(Le)),
            ("<", Lexeme::punct(Lt)),
            (">=", Lexeme::punct(Ge)),
            (">", Lexeme::punct(Gt)),
            ("--", Lexeme::sub(LineComment, LineComment)),
            ("$", Lexeme::sub(Number, HexNumber)),
            ("\"", Lexeme::sub(String, StringLiteral)),
            ("in", Lexeme::keyword(In)),
            ("xor", Lexeme::keyword(Xor)),
            ("shl", Lexeme::keyword(Shl)),
            ("shr", Lexeme::keyword(Shr)),
            ("rol", Lexeme::keyword(Rol)),
            ("ror", Lexeme::keyword(Ror)),
            ("if", Lexeme::keyword(KwIf)),
            ("else", Lexeme::keyword(KwElse)),
            ("switch", Lexeme::keyword(KwSwitch)),
            ("case", Lexeme::keyword(KwCase)),
            ("for", Lexeme::keyword(KwFor)),
            ("while", Lexeme::keyword(KwWhile)),
            ("break", Lexeme::keyword(KwBreak)),
            ("continue", Lexeme::keyword(KwContinue)),
            ("fallthrough", Lexeme::keyword(KwFallthrough)),
            ("goto", Lexeme::keyword(KwGoto)),
            ("defer", Lexeme::keyword(KwDefer)),
            ("return", Lexeme::keyword(KwReturn)),
            ("yield", Lexeme::keyword(KwYield)),
            ("proc", Lexeme::keyword(KwProc)),
            ("enum", Lexeme::keyword(KwEnum)),
            ("struct", Lexeme::keyword(KwStruct)),
            ("union", Lexeme::keyword(KwUnion)),
            ("family", Lexeme::keyword(KwFamily)),
            ("cast", Lexeme::keyword(KwCast)),
            ("bitcast", Lexeme::keyword(KwBitcast)),
            ("module", Lexeme::keyword(KwModule)),
            ("import", Lexeme::keyword(KwImport)),
            ("ns", Lexeme::keyword(KwNs)),
            ("with", Lexeme::keyword(KwWith)),
            ("use", Lexeme::keyword(KwUse)),
        ]
    }

    /// The trie pre-populated with every punctuation, operator, and keyword
    /// lexeme the source language uses. Digits `0`-`9` are handled directly
    /// by the driver rather than inserted here, since an identifier's
    /// first-rune check must reject them explicitly.
    pub fn standard() -> LexemeTrie {
        let mut trie = LexemeTrie::new();
        for (spelling, lexeme) in LexemeTrie::default_table() {
            trie.insert(spelling, lexeme);
        }
        trie
    }
}

impl Default for LexemeTrie {
    fn default() -> LexemeTrie {
        LexemeTrie::standard()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn longest_match_prefers_longer_spelling() {
        let trie = LexemeTrie::standard();
        let (lexeme, count) = trie.longest_match("::".chars()).unwrap();
        assert_eq!(count, 2);
        assert_eq!(lexeme.kind, TokenType::Bind);
    }

    #[test]
    fn falls_back_to_shorter_prefix_on_mismatch() {
        let trie = LexemeTrie::standard();
        let (lexeme, count) = trie.longest_match(":x".chars()).unwrap();
        assert_eq!(count, 1);
        assert_eq!(lexeme.kind, TokenType::Colon);
    }

    #[test]
    fn keyword_gate_flag_set_on_keyword_lexemes() {
        let trie = LexemeTrie::standard();
        let (lexeme, _) = trie.longest_match("if".chars()).unwrap();
        assert!(lexeme.is_keyword);
    }

    #[test]
    fn bare_at_is_annotation_not_octal() {
        let trie = LexemeTrie::standard();
        let (lexeme, count) = trie.longest_match("@foo".chars()).unwrap();
        assert_eq!(count, 1);
        assert_eq!(lexeme.kind, TokenType::At);
        assert!(lexeme.tokenizer.is_none());
    }

    #[test]
    fn at_digit_is_octal_number() {
        let trie = LexemeTrie::standard();
        let (lexeme, count) = trie.longest_match("@7".chars()).unwrap();
        assert_eq!(count, 2);
        assert_eq!(lexeme.kind, TokenType::Number);
        assert_eq!(lexeme.tokenizer, Some(SubTokenizer::OctalNumber));
    }
}
