use crate::consts::FITS_CARD_SIZE;
use crate::error::{Result, StampError};

/// Value of a FITS header keyword.
#[derive(Clone, Debug, PartialEq)]
pub enum HeaderValue {
    Logical(bool),
    Integer(i64),
    Float(f64),
    Text(String),
}

impl HeaderValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Integer(i) => Some(*i as f64),
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(*i),
            Self::Float(f) if f.fract() == 0.0 => Some(*f as i64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Render the value field (columns 11..) of a card.
    fn format(&self) -> String {
        match self {
            Self::Logical(b) => format!("{:>20}", if *b { "T" } else { "F" }),
            Self::Integer(i) => format!("{:>20}", i),
            Self::Float(f) => format!("{:>20}", format_float(*f)),
            Self::Text(s) => {
                // Quoted strings are left-justified and padded to at least 8 characters.
                let escaped = s.replace('\'', "''");
                format!("'{:<8}'", escaped)
            }
        }
    }
}

impl From<f64> for HeaderValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<i64> for HeaderValue {
    fn from(v: i64) -> Self {
        Self::Integer(v)
    }
}

impl From<usize> for HeaderValue {
    fn from(v: usize) -> Self {
        Self::Integer(v as i64)
    }
}

impl From<bool> for HeaderValue {
    fn from(v: bool) -> Self {
        Self::Logical(v)
    }
}

impl From<&str> for HeaderValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

/// One 80-character header record.
///
/// Commentary records (`COMMENT`, `HISTORY`, blank keyword) carry no value;
/// their text is kept in `comment`.
#[derive(Clone, Debug, PartialEq)]
pub struct Card {
    pub keyword: String,
    pub value: Option<HeaderValue>,
    pub comment: Option<String>,
}

impl Card {
    pub fn new(keyword: &str, value: impl Into<HeaderValue>) -> Self {
        Self {
            keyword: keyword.to_uppercase(),
            value: Some(value.into()),
            comment: None,
        }
    }

    pub fn with_comment(mut self, comment: &str) -> Self {
        self.comment = Some(comment.to_string());
        self
    }

    /// Parse one header record of at most 80 bytes. Shorter records, as
    /// cfitsio returns them, are blank-padded.
    pub fn parse(record: &[u8]) -> Result<Self> {
        if record.len() > FITS_CARD_SIZE {
            return Err(StampError::InvalidFits(format!(
                "header record has {} bytes, expected at most {}",
                record.len(),
                FITS_CARD_SIZE
            )));
        }
        if !record.iter().all(|b| (0x20..=0x7e).contains(b)) {
            return Err(StampError::InvalidFits(
                "header record contains non-ASCII-text bytes".into(),
            ));
        }
        // Validated as printable ASCII above.
        let text = std::str::from_utf8(record)
            .map_err(|e| StampError::InvalidFits(e.to_string()))?;
        let text = format!("{:<width$}", text, width = FITS_CARD_SIZE);

        let keyword = text[..8].trim_end().to_string();
        if &text[8..10] != "= " {
            let rest = text[8..].trim_end();
            return Ok(Self {
                keyword,
                value: None,
                comment: (!rest.is_empty()).then(|| rest.trim_start().to_string()),
            });
        }

        let (value, comment) = parse_value_field(&text[10..])?;
        Ok(Self {
            keyword,
            value,
            comment,
        })
    }

    /// Render the card as exactly 80 ASCII bytes.
    ///
    /// A keyword longer than 8 characters, non-printable text, or a value
    /// that runs past column 80 is an error. Only the trailing comment may
    /// be cut short.
    pub fn format(&self) -> Result<[u8; FITS_CARD_SIZE]> {
        if self.keyword.len() > 8 {
            return Err(StampError::InvalidFits(format!(
                "keyword {} is longer than 8 characters",
                self.keyword
            )));
        }
        let mut line = format!("{:<8}", self.keyword);
        let comment_sep = match &self.value {
            Some(value) => {
                line.push_str("= ");
                line.push_str(&value.format());
                " / "
            }
            None => "  ",
        };
        if line.len() > FITS_CARD_SIZE {
            return Err(StampError::InvalidFits(format!(
                "value of {} does not fit in one header record",
                self.keyword
            )));
        }
        if let Some(ref comment) = self.comment {
            line.push_str(comment_sep);
            line.push_str(comment);
        }
        if !line.bytes().all(|b| (0x20..=0x7e).contains(&b)) {
            return Err(StampError::InvalidFits(format!(
                "card {} contains non-ASCII-text characters",
                self.keyword
            )));
        }

        let mut record = [b' '; FITS_CARD_SIZE];
        for (dst, src) in record.iter_mut().zip(line.bytes()) {
            *dst = src;
        }
        Ok(record)
    }

    fn is_commentary(&self) -> bool {
        self.value.is_none()
    }
}

/// Split a value field into its value and trailing `/ comment`.
fn parse_value_field(field: &str) -> Result<(Option<HeaderValue>, Option<String>)> {
    let trimmed = field.trim_start();

    if let Some(quoted) = trimmed.strip_prefix('\'') {
        let mut value = String::new();
        let mut chars = quoted.char_indices().peekable();
        let mut end = None;
        while let Some((i, c)) = chars.next() {
            if c == '\'' {
                if matches!(chars.peek(), Some((_, '\''))) {
                    value.push('\'');
                    chars.next();
                } else {
                    end = Some(i + 1);
                    break;
                }
            } else {
                value.push(c);
            }
        }
        let end = end.ok_or_else(|| {
            StampError::InvalidFits(format!("unterminated string value: {trimmed}"))
        })?;
        let comment = extract_comment(&quoted[end..]);
        // Trailing spaces inside quotes are not significant.
        return Ok((Some(HeaderValue::Text(value.trim_end().to_string())), comment));
    }

    let (token, comment) = match trimmed.find('/') {
        Some(idx) => (trimmed[..idx].trim(), extract_comment(&trimmed[idx..])),
        None => (trimmed.trim(), None),
    };

    if token.is_empty() {
        return Ok((None, comment));
    }

    let value = match token {
        "T" => HeaderValue::Logical(true),
        "F" => HeaderValue::Logical(false),
        _ => {
            if let Ok(i) = token.parse::<i64>() {
                HeaderValue::Integer(i)
            } else if let Ok(f) = token.replace(['D', 'd'], "E").parse::<f64>() {
                HeaderValue::Float(f)
            } else {
                HeaderValue::Text(token.to_string())
            }
        }
    };
    Ok((Some(value), comment))
}

fn extract_comment(rest: &str) -> Option<String> {
    let rest = rest.trim();
    let comment = rest.strip_prefix('/')?.trim();
    (!comment.is_empty()).then(|| comment.to_string())
}

/// Format a float so that it parses back to the identical value and always
/// carries a decimal point and an upper-case exponent.
fn format_float(v: f64) -> String {
    let s = format!("{:E}", v);
    match s.find('E') {
        Some(idx) if !s[..idx].contains('.') => format!("{}.0{}", &s[..idx], &s[idx..]),
        _ => s,
    }
}

/// Ordered list of header cards, excluding the terminating `END`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FitsHeader {
    cards: Vec<Card>,
}

impl FitsHeader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn push(&mut self, card: Card) {
        self.cards.push(card);
    }

    pub fn get(&self, keyword: &str) -> Option<&HeaderValue> {
        let keyword = keyword.to_uppercase();
        self.cards
            .iter()
            .find(|c| !c.is_commentary() && c.keyword == keyword)
            .and_then(|c| c.value.as_ref())
    }

    pub fn contains(&self, keyword: &str) -> bool {
        self.get(keyword).is_some()
    }

    pub fn get_f64(&self, keyword: &str) -> Option<f64> {
        self.get(keyword).and_then(HeaderValue::as_f64)
    }

    pub fn get_i64(&self, keyword: &str) -> Option<i64> {
        self.get(keyword).and_then(HeaderValue::as_i64)
    }

    pub fn get_str(&self, keyword: &str) -> Option<&str> {
        self.get(keyword).and_then(HeaderValue::as_str)
    }

    /// Replace the value of an existing keyword in place (keeping its
    /// comment), or append a new card.
    pub fn set(&mut self, keyword: &str, value: impl Into<HeaderValue>) {
        let keyword = keyword.to_uppercase();
        let value = value.into();
        match self
            .cards
            .iter_mut()
            .find(|c| !c.is_commentary() && c.keyword == keyword)
        {
            Some(card) => card.value = Some(value),
            None => self.cards.push(Card {
                keyword,
                value: Some(value),
                comment: None,
            }),
        }
    }

    /// Required integer keyword, reported as a FITS format error.
    pub fn require_i64(&self, keyword: &str) -> Result<i64> {
        self.get_i64(keyword).ok_or_else(|| {
            StampError::InvalidFits(format!("missing or non-integer keyword {keyword}"))
        })
    }
}

impl FromIterator<Card> for FitsHeader {
    fn from_iter<I: IntoIterator<Item = Card>>(iter: I) -> Self {
        Self {
            cards: iter.into_iter().collect(),
        }
    }
}
