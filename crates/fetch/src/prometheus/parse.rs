// Prometheus text exposition format parser
// Line-oriented: every malformed line yields its own error and parsing
// continues with the next line.

use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub name: String,
    pub labels: BTreeMap<String, String>,
    pub value: f64,
    pub timestamp_ms: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineError {
    /// 1-based line number.
    pub line: usize,
    pub message: String,
}

/// Parse a whole payload. Comments, `# HELP`/`# TYPE` lines and blank lines
/// are skipped.
pub fn parse_text(text: &str) -> (Vec<Sample>, Vec<LineError>) {
    let mut samples = Vec::new();
    let mut errors = Vec::new();

    for (i, line) in text.lines().enumerate() {
        match parse_line(line) {
            Ok(Some(sample)) => samples.push(sample),
            Ok(None) => {}
            Err(message) => errors.push(LineError { line: i + 1, message }),
        }
    }

    (samples, errors)
}

/// Parse one line. `Ok(None)` for lines that carry no sample.
pub fn parse_line(line: &str) -> Result<Option<Sample>, String> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Ok(None);
    }

    let mut cur = Cursor::new(trimmed);

    let name = cur.take_while(is_name_char);
    if !is_valid_metric_name(name) {
        return Err(format!("invalid metric name in '{trimmed}'"));
    }

    cur.skip_ws();
    let labels = if cur.peek() == Some('{') {
        cur.bump();
        parse_labels(&mut cur)?
    } else {
        BTreeMap::new()
    };

    let mut fields = cur.rest().split_whitespace();
    let raw_value = fields
        .next()
        .ok_or_else(|| format!("metric '{name}' has no value"))?;
    let value = parse_value(raw_value)
        .ok_or_else(|| format!("metric '{name}': invalid value '{raw_value}'"))?;

    let timestamp_ms = match fields.next() {
        Some(ts) => Some(
            ts.parse::<i64>()
                .map_err(|_| format!("metric '{name}': invalid timestamp '{ts}'"))?,
        ),
        None => None,
    };

    if let Some(extra) = fields.next() {
        return Err(format!("metric '{name}': unexpected trailing '{extra}'"));
    }

    Ok(Some(Sample {
        name: name.to_string(),
        labels,
        value,
        timestamp_ms,
    }))
}

/// Parse `name="value", ...}` with the opening brace already consumed.
fn parse_labels(cur: &mut Cursor<'_>) -> Result<BTreeMap<String, String>, String> {
    let mut labels = BTreeMap::new();

    loop {
        cur.skip_ws();
        match cur.peek() {
            Some('}') => {
                cur.bump();
                return Ok(labels);
            }
            None => return Err("unterminated label set".into()),
            _ => {}
        }

        let label = cur.take_while(is_label_char);
        if label.is_empty() || label.starts_with(|c: char| c.is_ascii_digit()) {
            return Err(format!("invalid label name near '{}'", cur.rest()));
        }

        cur.skip_ws();
        if cur.bump() != Some('=') {
            return Err(format!("expected '=' after label '{label}'"));
        }
        cur.skip_ws();
        if cur.bump() != Some('"') {
            return Err(format!("expected '\"' to open value of label '{label}'"));
        }
        let value = parse_quoted(cur).ok_or_else(|| format!("unterminated value for label '{label}'"))?;

        if labels.insert(label.to_string(), value).is_some() {
            return Err(format!("duplicate label '{label}'"));
        }

        cur.skip_ws();
        match cur.peek() {
            Some(',') => {
                cur.bump();
            }
            Some('}') => {}
            _ => return Err(format!("expected ',' or '}}' after label '{label}'")),
        }
    }
}

/// Read up to the closing quote, resolving `\\`, `\"` and `\n`.
fn parse_quoted(cur: &mut Cursor<'_>) -> Option<String> {
    let mut out = String::new();
    loop {
        match cur.bump()? {
            '"' => return Some(out),
            '\\' => match cur.bump()? {
                'n' => out.push('\n'),
                other => out.push(other),
            },
            c => out.push(c),
        }
    }
}

fn parse_value(raw: &str) -> Option<f64> {
    match raw {
        "NaN" => Some(f64::NAN),
        "+Inf" | "Inf" => Some(f64::INFINITY),
        "-Inf" => Some(f64::NEG_INFINITY),
        _ => raw.parse::<f64>().ok().filter(|v| v.is_finite()),
    }
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == ':'
}

fn is_label_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn is_valid_metric_name(name: &str) -> bool {
    !name.is_empty() && !name.starts_with(|c: char| c.is_ascii_digit())
}

struct Cursor<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(' ') | Some('\t')) {
            self.bump();
        }
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> &'a str {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if !pred(c) {
                break;
            }
            self.bump();
        }
        &self.src[start..self.pos]
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn plain_sample() {
        let s = parse_line("up 1").unwrap().unwrap();
        assert_eq!(s.name, "up");
        assert!(s.labels.is_empty());
        assert_eq!(s.value, 1.0);
        assert_eq!(s.timestamp_ms, None);
    }

    #[test]
    fn labels_and_timestamp() {
        let s = parse_line(r#"http_requests_total{method="post",code="200"} 1027 1395066363000"#)
            .unwrap()
            .unwrap();
        assert_eq!(s.labels, labels(&[("code", "200"), ("method", "post")]));
        assert_eq!(s.value, 1027.0);
        assert_eq!(s.timestamp_ms, Some(1395066363000));
    }

    #[test]
    fn escaped_label_values() {
        let s = parse_line(r#"msdos_file_access{path="C:\\DIR\\FILE.TXT",error="Cannot find \"file\"\n"} 1.458e+06"#)
            .unwrap()
            .unwrap();
        assert_eq!(s.labels["path"], r"C:\DIR\FILE.TXT");
        assert_eq!(s.labels["error"], "Cannot find \"file\"\n");
        assert_eq!(s.value, 1.458e6);
    }

    #[test]
    fn trailing_comma_and_spaces() {
        let s = parse_line(r#"go_info { version = "go1.21" , } 1"#).unwrap().unwrap();
        assert_eq!(s.labels, labels(&[("version", "go1.21")]));
    }

    #[test]
    fn empty_label_set() {
        let s = parse_line("process_open_fds{} 12").unwrap().unwrap();
        assert!(s.labels.is_empty());
        assert_eq!(s.value, 12.0);
    }

    #[test]
    fn comments_and_blank_lines_skipped() {
        assert_eq!(parse_line("# HELP up Whether the target is up.").unwrap(), None);
        assert_eq!(parse_line("# TYPE up gauge").unwrap(), None);
        assert_eq!(parse_line("   ").unwrap(), None);
    }

    #[test]
    fn special_values() {
        assert!(parse_line("x NaN").unwrap().unwrap().value.is_nan());
        assert_eq!(parse_line("x +Inf").unwrap().unwrap().value, f64::INFINITY);
        assert_eq!(parse_line("x -Inf").unwrap().unwrap().value, f64::NEG_INFINITY);
    }

    #[test]
    fn malformed_lines() {
        assert!(parse_line("up").unwrap_err().contains("no value"));
        assert!(parse_line("up abc").unwrap_err().contains("invalid value"));
        assert!(parse_line("up 1 2 3").unwrap_err().contains("trailing"));
        assert!(parse_line("up 1 soon").unwrap_err().contains("timestamp"));
        assert!(parse_line("9lives 1").unwrap_err().contains("metric name"));
        assert!(parse_line(r#"up{job="a" 1"#).is_err());
        assert!(parse_line(r#"up{job="a} 1"#).is_err());
        assert!(parse_line(r#"up{job=a} 1"#).is_err());
        assert!(parse_line(r#"up{job="a",job="b"} 1"#).unwrap_err().contains("duplicate"));
    }

    #[test]
    fn parse_text_collects_every_error() {
        let text = "# TYPE up gauge\nup 1\nbroken\nother{a=\"1\"} 2\nalso broken {\n";
        let (samples, errors) = parse_text(text);
        assert_eq!(samples.len(), 2);
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].line, 3);
        assert_eq!(errors[1].line, 5);
    }
}
