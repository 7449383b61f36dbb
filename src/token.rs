/// The eight instruction bytes. Everything else in a source file is a
/// comment and never reaches the parser.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Token {
    Right,
    Left,
    Inc,
    Dec,
    Output,
    Input,
    LoopStart,
    LoopEnd,
}

impl Token {
    pub fn from_byte(byte: u8) -> Option<Token> {
        match byte {
            b'>' => Some(Token::Right),
            b'<' => Some(Token::Left),
            b'+' => Some(Token::Inc),
            b'-' => Some(Token::Dec),
            b'.' => Some(Token::Output),
            b',' => Some(Token::Input),
            b'[' => Some(Token::LoopStart),
            b']' => Some(Token::LoopEnd),
            _ => None,
        }
    }
}

/// Strips comment bytes from raw source, keeping the byte offset of each
/// token so parse errors can point back into the file.
pub fn tokenize(code: &[u8]) -> Vec<(usize, Token)> {
    code.iter()
        .enumerate()
        .filter_map(|(i, byte)| Token::from_byte(*byte).map(|token| (i, token)))
        .collect()
}
