// Just enough HTTP/1.x for the configuration server.
//
// The server answers one request per connection with an HTTP/1.0
// response and closes, so there is no keep-alive or chunked encoding.
// parse_head works on the buffered request head; the body (form or
// multipart upload) is read separately by the caller.

pub mod multipart;

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

/// Largest request head the server buffers.
pub const MAX_HEAD: usize = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Head,
    Post,
    Put,
    Delete,
    Other,
}

impl Method {
    fn parse(token: &str) -> Self {
        match token {
            "GET" => Method::Get,
            "HEAD" => Method::Head,
            "POST" => Method::Post,
            "PUT" => Method::Put,
            "DELETE" => Method::Delete,
            _ => Method::Other,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Head => "HEAD",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
            Method::Other => "OTHER",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpError {
    /// No blank line yet; read more.
    Incomplete,
    /// Head did not fit in [`MAX_HEAD`].
    HeadTooLarge,
    BadRequestLine,
    BadHeader,
    UnsupportedVersion,
}

impl fmt::Display for HttpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            HttpError::Incomplete => "incomplete request head",
            HttpError::HeadTooLarge => "request head too large",
            HttpError::BadRequestLine => "malformed request line",
            HttpError::BadHeader => "malformed header",
            HttpError::UnsupportedVersion => "unsupported HTTP version",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestHead<'a> {
    pub method: Method,
    /// Request target as sent, path plus optional `?query`.
    pub target: &'a str,
    pub content_length: usize,
    pub content_type: &'a str,
    /// Bytes up to and including the blank line.
    pub head_len: usize,
}

impl<'a> RequestHead<'a> {
    /// Raw (still percent-encoded) path.
    pub fn path(&self) -> &'a str {
        match self.target.split_once('?') {
            Some((path, _)) => path,
            None => self.target,
        }
    }

    pub fn query(&self) -> &'a str {
        match self.target.split_once('?') {
            Some((_, query)) => query,
            None => "",
        }
    }

    pub fn decoded_path(&self) -> String {
        percent_decode(self.path(), false)
    }

    pub fn is_form(&self) -> bool {
        media_type(self.content_type).eq_ignore_ascii_case("application/x-www-form-urlencoded")
    }

    pub fn multipart_boundary(&self) -> Option<&'a str> {
        multipart::boundary(self.content_type)
    }
}

/// Index just past the `\r\n\r\n` that ends the head.
pub fn find_head_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4).position(|w| w == b"\r\n\r\n").map(|i| i + 4)
}

pub fn parse_head(buf: &[u8]) -> Result<RequestHead<'_>, HttpError> {
    let head_len = match find_head_end(buf) {
        Some(n) => n,
        None if buf.len() >= MAX_HEAD => return Err(HttpError::HeadTooLarge),
        None => return Err(HttpError::Incomplete),
    };
    let head = core::str::from_utf8(&buf[..head_len - 4]).map_err(|_| HttpError::BadHeader)?;
    let mut lines = head.split("\r\n");

    let request_line = lines.next().ok_or(HttpError::BadRequestLine)?;
    let mut parts = request_line.split(' ').filter(|p| !p.is_empty());
    let method = Method::parse(parts.next().ok_or(HttpError::BadRequestLine)?);
    let target = parts
        .next()
        .filter(|t| t.starts_with('/'))
        .ok_or(HttpError::BadRequestLine)?;
    let version = parts.next().ok_or(HttpError::BadRequestLine)?;
    if !version.starts_with("HTTP/1.") {
        return Err(HttpError::UnsupportedVersion);
    }

    let mut content_length = 0;
    let mut content_type = "";
    for line in lines {
        let (name, value) = line.split_once(':').ok_or(HttpError::BadHeader)?;
        let value = value.trim();
        if name.eq_ignore_ascii_case("content-length") {
            content_length = value.parse().map_err(|_| HttpError::BadHeader)?;
        } else if name.eq_ignore_ascii_case("content-type") {
            content_type = value;
        }
    }

    Ok(RequestHead {
        method,
        target,
        content_length,
        content_type,
        head_len,
    })
}

fn media_type(content_type: &str) -> &str {
    content_type.split(';').next().unwrap_or("").trim()
}

// ── Arguments ───────────────────────────────────────────────────────

/// Decoded request arguments in arrival order: query string first,
/// then any urlencoded body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Args {
    pairs: Vec<(String, String)>,
}

impl Args {
    pub const fn new() -> Self {
        Self { pairs: Vec::new() }
    }

    pub fn from_query(query: &str) -> Self {
        let mut args = Self::new();
        args.extend_encoded(query);
        args
    }

    /// Append `a=1&b=two` style pairs.  A bare `flag` becomes `("flag", "")`.
    pub fn extend_encoded(&mut self, encoded: &str) {
        for pair in encoded.split('&').filter(|p| !p.is_empty()) {
            let (name, value) = pair.split_once('=').unwrap_or((pair, ""));
            self.pairs
                .push((percent_decode(name, true), percent_decode(value, true)));
        }
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// First value named `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn has(&self, name: &str) -> bool {
        self.pairs.iter().any(|(n, _)| n == name)
    }

    /// Value at position `i`.
    pub fn arg(&self, i: usize) -> Option<&str> {
        self.pairs.get(i).map(|(_, v)| v.as_str())
    }

    pub fn name(&self, i: usize) -> Option<&str> {
        self.pairs.get(i).map(|(n, _)| n.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }
}

/// `%XX` escapes decoded; `+` becomes a space when `plus_is_space`.
/// Broken escapes are kept literally and invalid UTF-8 is replaced.
pub fn percent_decode(s: &str, plus_is_space: bool) -> String {
    let src = s.as_bytes();
    let mut out = Vec::with_capacity(src.len());
    let mut i = 0;
    while i < src.len() {
        match src[i] {
            b'+' if plus_is_space => out.push(b' '),
            b'%' if i + 2 < src.len() => {
                match (hex_val(src[i + 1]), hex_val(src[i + 2])) {
                    (Some(hi), Some(lo)) => {
                        out.push(hi << 4 | lo);
                        i += 2;
                    }
                    _ => out.push(b'%'),
                }
            }
            b => out.push(b),
        }
        i += 1;
    }
    String::from_utf8(out)
        .unwrap_or_else(|e| String::from_utf8_lossy(e.as_bytes()).into_owned())
}

fn hex_val(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

// ── Responses ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ok,
    BadRequest,
    NotFound,
    InternalError,
}

impl Status {
    pub const fn code(self) -> u16 {
        match self {
            Status::Ok => 200,
            Status::BadRequest => 400,
            Status::NotFound => 404,
            Status::InternalError => 500,
        }
    }

    pub const fn reason(self) -> &'static str {
        match self {
            Status::Ok => "OK",
            Status::BadRequest => "Bad Request",
            Status::NotFound => "Not Found",
            Status::InternalError => "Internal Server Error",
        }
    }
}

/// Status line and headers, through the blank line.
pub fn write_response_head(
    w: &mut impl fmt::Write,
    status: Status,
    content_type: &str,
    content_length: Option<usize>,
) -> fmt::Result {
    write!(w, "HTTP/1.0 {} {}\r\n", status.code(), status.reason())?;
    write!(w, "Content-Type: {}\r\n", content_type)?;
    if let Some(len) = content_length {
        write!(w, "Content-Length: {}\r\n", len)?;
    }
    w.write_str("Connection: close\r\n\r\n")
}

pub const TEXT_PLAIN: &str = "text/plain";
pub const TEXT_HTML: &str = "text/html";
pub const TEXT_JSON: &str = "text/json";
pub const OCTET_STREAM: &str = "application/octet-stream";

/// MIME type from the file extension (case-insensitive; FAT names
/// come back upper case).
pub fn content_type(path: &str) -> &'static str {
    let ext = match path.rsplit_once('.') {
        Some((_, ext)) if !ext.contains('/') => ext,
        _ => return TEXT_PLAIN,
    };
    const TABLE: &[(&str, &str)] = &[
        ("htm", TEXT_HTML),
        ("html", TEXT_HTML),
        ("css", "text/css"),
        ("js", "application/javascript"),
        ("png", "image/png"),
        ("gif", "image/gif"),
        ("jpg", "image/jpeg"),
        ("ico", "image/x-icon"),
        ("xml", "text/xml"),
        ("pdf", "application/pdf"),
        ("zip", "application/zip"),
        ("csv", "text/csv"),
    ];
    TABLE
        .iter()
        .find(|(e, _)| e.eq_ignore_ascii_case(ext))
        .map(|(_, t)| *t)
        .unwrap_or(TEXT_PLAIN)
}

/// Split an absolute SD path into its parent directory and last
/// component: `/GPSLOG/A.CSV` -> (`/GPSLOG`, `A.CSV`), `/A.CSV` -> (`/`,
/// `A.CSV`).  Repeated and trailing slashes are ignored.
pub fn split_path(path: &str) -> (&str, &str) {
    let trimmed = path.trim_end_matches('/');
    match trimmed.rsplit_once('/') {
        Some((parent, name)) => {
            let parent = parent.trim_end_matches('/');
            (if parent.is_empty() { "/" } else { parent }, name)
        }
        None => ("/", trimmed),
    }
}

/// Non-empty components of an SD path.
pub fn path_components(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|p| !p.is_empty())
}
