// Streaming multipart/form-data scanner for file uploads.
//
// Bytes are pushed in whatever chunks the socket delivers and events
// are polled back out:
//
//   Part { name, filename }   headers of a part
//   Data(bytes)               body bytes, any number of times
//   End                       part finished
//
// The delimiter may straddle chunk boundaries, so the scanner holds
// back the last `delimiter - 1` body bytes until it can tell them apart
// from the start of a boundary.

use core::fmt;

/// RFC 2046 limits boundaries to 70 characters.
pub const MAX_BOUNDARY: usize = 70;

// "\r\n--" + boundary
const DELIM_CAP: usize = MAX_BOUNDARY + 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MultipartError {
    BadBoundary,
    HeadersTooLarge,
    Malformed,
    /// Input ended before the closing boundary.
    Truncated,
}

impl fmt::Display for MultipartError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MultipartError::BadBoundary => "bad multipart boundary",
            MultipartError::HeadersTooLarge => "part headers too large",
            MultipartError::Malformed => "malformed multipart body",
            MultipartError::Truncated => "multipart body truncated",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event<'a> {
    Part {
        name: &'a str,
        filename: Option<&'a str>,
    },
    Data(&'a [u8]),
    End,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Preamble,
    AfterBoundary,
    Headers,
    Body,
    PartEnd,
    Done,
}

/// Boundary parameter of a `multipart/form-data` content type.
pub fn boundary(content_type: &str) -> Option<&str> {
    let mut params = content_type.split(';');
    let media = params.next()?.trim();
    if !media.eq_ignore_ascii_case("multipart/form-data") {
        return None;
    }
    params.find_map(|p| {
        let (key, value) = p.split_once('=')?;
        key.trim()
            .eq_ignore_ascii_case("boundary")
            .then(|| value.trim().trim_matches('"'))
    })
}

pub struct MultipartScanner<const N: usize> {
    delim: [u8; DELIM_CAP],
    delim_len: usize,
    buf: [u8; N],
    start: usize,
    end: usize,
    state: State,
}

impl<const N: usize> MultipartScanner<N> {
    /// `N` must comfortably exceed the delimiter; 512 is plenty.
    pub fn new(boundary: &str) -> Result<Self, MultipartError> {
        let b = boundary.as_bytes();
        if b.is_empty() || b.len() > MAX_BOUNDARY || N < 2 * DELIM_CAP {
            return Err(MultipartError::BadBoundary);
        }
        let mut delim = [0u8; DELIM_CAP];
        delim[..4].copy_from_slice(b"\r\n--");
        delim[4..4 + b.len()].copy_from_slice(b);
        Ok(Self {
            delim,
            delim_len: 4 + b.len(),
            buf: [0u8; N],
            start: 0,
            end: 0,
            state: State::Preamble,
        })
    }

    pub fn is_done(&self) -> bool {
        self.state == State::Done
    }

    /// Error unless the closing boundary was seen.
    pub fn finish(&self) -> Result<(), MultipartError> {
        if self.is_done() {
            Ok(())
        } else {
            Err(MultipartError::Truncated)
        }
    }

    /// Copy in as much of `data` as fits; returns the bytes taken.
    /// Anything after the closing boundary is swallowed.
    pub fn push(&mut self, data: &[u8]) -> usize {
        if self.state == State::Done {
            return data.len();
        }
        if self.start > 0 {
            self.buf.copy_within(self.start..self.end, 0);
            self.end -= self.start;
            self.start = 0;
        }
        let n = data.len().min(N - self.end);
        self.buf[self.end..self.end + n].copy_from_slice(&data[..n]);
        self.end += n;
        n
    }

    /// Next event from the buffered bytes, `None` when more input is needed.
    pub fn poll(&mut self) -> Result<Option<Event<'_>>, MultipartError> {
        loop {
            match self.state {
                State::Done => return Ok(None),

                State::Preamble => {
                    // the first boundary has no leading CRLF
                    let dash = &self.delim[2..self.delim_len];
                    match find(&self.buf[self.start..self.end], dash) {
                        Some(i) => {
                            self.start += i + dash.len();
                            self.state = State::AfterBoundary;
                        }
                        None => {
                            let keep = dash.len() - 1;
                            self.start = self.end.saturating_sub(keep).max(self.start);
                            return Ok(None);
                        }
                    }
                }

                State::AfterBoundary => {
                    if self.end - self.start < 2 {
                        return Ok(None);
                    }
                    match [self.buf[self.start], self.buf[self.start + 1]] {
                        [b'-', b'-'] => {
                            self.start = self.end;
                            self.state = State::Done;
                            return Ok(None);
                        }
                        [b'\r', b'\n'] => {
                            self.start += 2;
                            self.state = State::Headers;
                        }
                        _ => return Err(MultipartError::Malformed),
                    }
                }

                State::Headers => {
                    let Some(i) = find(&self.buf[self.start..self.end], b"\r\n\r\n") else {
                        if self.start == 0 && self.end == N {
                            return Err(MultipartError::HeadersTooLarge);
                        }
                        return Ok(None);
                    };
                    let head_start = self.start;
                    let head_end = self.start + i;
                    self.start = head_end + 4;
                    self.state = State::Body;

                    let head = core::str::from_utf8(&self.buf[head_start..head_end])
                        .map_err(|_| MultipartError::Malformed)?;
                    return Ok(Some(part_event(head)?));
                }

                State::Body => {
                    let delim_len = self.delim_len;
                    let pending = self.end - self.start;
                    match find(&self.buf[self.start..self.end], &self.delim[..delim_len]) {
                        Some(0) => {
                            self.start += delim_len;
                            self.state = State::AfterBoundary;
                            return Ok(Some(Event::End));
                        }
                        Some(i) => {
                            let from = self.start;
                            self.start += i + delim_len;
                            self.state = State::PartEnd;
                            return Ok(Some(Event::Data(&self.buf[from..from + i])));
                        }
                        None => {
                            let safe = pending.saturating_sub(delim_len - 1);
                            if safe == 0 {
                                return Ok(None);
                            }
                            let from = self.start;
                            self.start += safe;
                            return Ok(Some(Event::Data(&self.buf[from..from + safe])));
                        }
                    }
                }

                State::PartEnd => {
                    self.state = State::AfterBoundary;
                    return Ok(Some(Event::End));
                }
            }
        }
    }
}

fn part_event(head: &str) -> Result<Event<'_>, MultipartError> {
    let mut name = "";
    let mut filename = None;
    for line in head.split("\r\n").filter(|l| !l.is_empty()) {
        let Some((key, value)) = line.split_once(':') else {
            return Err(MultipartError::Malformed);
        };
        if !key.trim().eq_ignore_ascii_case("content-disposition") {
            continue;
        }
        for param in value.split(';').skip(1) {
            let Some((k, v)) = param.split_once('=') else {
                continue;
            };
            let v = v.trim().trim_matches('"');
            match k.trim() {
                "name" => name = v,
                "filename" => filename = Some(v),
                _ => {}
            }
        }
    }
    Ok(Event::Part { name, filename })
}

fn find(hay: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || hay.len() < needle.len() {
        return None;
    }
    hay.windows(needle.len()).position(|w| w == needle)
}

#[cfg(test)]
mod tests {
    use super::*;

    const BODY: &[u8] = b"preamble\r\n--XyZ\r\n\
Content-Disposition: form-data; name=\"data\"; filename=\"/GPSLOG/NOTE.TXT\"\r\n\
Content-Type: text/plain\r\n\r\n\
line one\r\nline two --XyZ not a boundary\r\n\
--XyZ\r\n\
Content-Disposition: form-data; name=\"empty\"\r\n\r\n\
\r\n--XyZ--\r\nepilogue";

    #[derive(Debug, PartialEq)]
    enum Owned {
        Part(String, Option<String>),
        Data(Vec<u8>),
        End,
    }

    // feed `body` in `chunk`-sized pieces, merging adjacent Data events
    fn scan(body: &[u8], chunk: usize) -> Result<Vec<Owned>, MultipartError> {
        let mut scanner = MultipartScanner::<256>::new("XyZ")?;
        let mut out: Vec<Owned> = Vec::new();
        for piece in body.chunks(chunk) {
            let mut rest = piece;
            while !rest.is_empty() {
                let taken = scanner.push(rest);
                rest = &rest[taken..];
                while let Some(ev) = scanner.poll()? {
                    match ev {
                        Event::Part { name, filename } => {
                            out.push(Owned::Part(name.into(), filename.map(Into::into)))
                        }
                        Event::Data(d) => match out.last_mut() {
                            Some(Owned::Data(acc)) => acc.extend_from_slice(d),
                            _ => out.push(Owned::Data(d.to_vec())),
                        },
                        Event::End => out.push(Owned::End),
                    }
                }
            }
        }
        scanner.finish()?;
        Ok(out)
    }

    fn expected() -> Vec<Owned> {
        vec![
            Owned::Part("data".into(), Some("/GPSLOG/NOTE.TXT".into())),
            Owned::Data(b"line one\r\nline two --XyZ not a boundary".to_vec()),
            Owned::End,
            Owned::Part("empty".into(), None),
            Owned::End,
        ]
    }

    #[test]
    fn whole_body_at_once() {
        assert_eq!(scan(BODY, BODY.len()).unwrap(), expected());
    }

    #[test]
    fn every_chunk_size_gives_the_same_events() {
        for chunk in 1..=BODY.len() {
            assert_eq!(scan(BODY, chunk).unwrap(), expected(), "chunk {chunk}");
        }
    }

    #[test]
    fn body_larger_than_buffer_streams_through() {
        let payload: Vec<u8> = (0..2000u32).map(|i| b'a' + (i % 26) as u8).collect();
        let mut body = b"--XyZ\r\nContent-Disposition: form-data; name=\"f\"; filename=\"big.csv\"\r\n\r\n".to_vec();
        body.extend_from_slice(&payload);
        body.extend_from_slice(b"\r\n--XyZ--\r\n");
        let events = scan(&body, 100).unwrap();
        assert_eq!(events[1], Owned::Data(payload));
        assert_eq!(events.len(), 3);
    }

    #[test]
    fn truncated_and_malformed() {
        let cut = &BODY[..BODY.len() - 20];
        assert_eq!(scan(cut, 7), Err(MultipartError::Truncated));

        let bad = b"--XyZ!!garbage";
        assert_eq!(scan(bad, bad.len()), Err(MultipartError::Malformed));

        let mut huge = b"--XyZ\r\nX-Pad: ".to_vec();
        huge.extend(core::iter::repeat(b'p').take(400));
        assert_eq!(scan(&huge, 64), Err(MultipartError::HeadersTooLarge));
    }

    #[test]
    fn boundary_from_content_type() {
        assert_eq!(
            boundary("multipart/form-data; boundary=----WebKitFormBoundary7MA4"),
            Some("----WebKitFormBoundary7MA4")
        );
        assert_eq!(boundary("multipart/form-data; charset=utf-8; boundary=\"q r\""), Some("q r"));
        assert_eq!(boundary("text/plain; boundary=x"), None);
        assert_eq!(boundary("multipart/form-data"), None);
        assert!(MultipartScanner::<256>::new("").is_err());
        assert!(MultipartScanner::<256>::new(&"b".repeat(71)).is_err());
    }
}
