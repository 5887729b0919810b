pub type Square = usize;

pub fn rank_of(sq: Square) -> usize {
    sq / 8
}
pub fn file_of(sq: Square) -> usize {
    sq % 8
}

/// Parses the first two characters of a string slice as a square in
/// algebraic notation.
/// ```
/// use pyrite::square::parse_square;
/// assert_eq!(parse_square("e4"), Some(28));
/// assert_eq!(parse_square("a1"), Some(0));
/// assert_eq!(parse_square("h8q"), Some(63));
/// assert_eq!(parse_square("i3"), None);
/// assert_eq!(parse_square("e9"), None);
/// ```
pub fn parse_square(s: &str) -> Option<Square> {
    let mut chars = s.chars();
    let file = match chars.next()? {
        c @ 'a'..='h' => c as usize - 'a' as usize,
        _ => return None,
    };
    let rank = match chars.next()? {
        c @ '1'..='8' => c as usize - '1' as usize,
        _ => return None,
    };
    Some(rank * 8 + file)
}

/// Returns the algebraic notation of a square index.
/// ```
/// use pyrite::square::square_representation;
/// assert_eq!(square_representation(28), Some(String::from("e4")));
/// assert_eq!(square_representation(0), Some(String::from("a1")));
/// assert_eq!(square_representation(64), None);
/// ```
pub fn square_representation(sq: Square) -> Option<String> {
    if sq >= 64 {
        return None;
    }
    let file = (b'a' + file_of(sq) as u8) as char;
    let rank = (b'1' + rank_of(sq) as u8) as char;
    Some(format!("{}{}", file, rank))
}
