// No-alloc fmt::Write buffers.
// StackFmt<N> owns a [u8; N]; BorrowedFmt wraps &mut [u8].
// Both silently truncate on overflow; `overflowed()` reports it.

pub struct StackFmt<const N: usize> {
    buf: [u8; N],
    len: usize,
    overflow: bool,
}

impl<const N: usize> Default for StackFmt<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> StackFmt<N> {
    pub const fn new() -> Self {
        Self {
            buf: [0u8; N],
            len: 0,
            overflow: false,
        }
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        core::str::from_utf8(&self.buf[..self.len]).unwrap_or("")
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.len]
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn overflowed(&self) -> bool {
        self.overflow
    }

    #[inline]
    pub fn clear(&mut self) {
        self.len = 0;
        self.overflow = false;
    }
}

impl<const N: usize> core::fmt::Write for StackFmt<N> {
    fn write_str(&mut self, s: &str) -> core::fmt::Result {
        let n = fit_utf8(s, N - self.len);
        if n < s.len() {
            self.overflow = true;
        }
        self.buf[self.len..self.len + n].copy_from_slice(&s.as_bytes()[..n]);
        self.len += n;
        Ok(())
    }
}

pub struct BorrowedFmt<'a> {
    buf: &'a mut [u8],
    pos: usize,
}

impl<'a> BorrowedFmt<'a> {
    #[inline]
    pub fn new(buf: &'a mut [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        core::str::from_utf8(&self.buf[..self.pos]).unwrap_or("")
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.pos
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.pos == 0
    }
}

impl core::fmt::Write for BorrowedFmt<'_> {
    fn write_str(&mut self, s: &str) -> core::fmt::Result {
        let n = fit_utf8(s, self.buf.len() - self.pos);
        self.buf[self.pos..self.pos + n].copy_from_slice(&s.as_bytes()[..n]);
        self.pos += n;
        Ok(())
    }
}

// format into a borrowed slice via closure; returns bytes written
#[inline]
pub fn stack_fmt(buf: &mut [u8], f: impl FnOnce(&mut BorrowedFmt<'_>)) -> usize {
    let mut w = BorrowedFmt::new(buf);
    f(&mut w);
    w.pos
}

// longest prefix of `s` no longer than `room` that ends on a char boundary
fn fit_utf8(s: &str, room: usize) -> usize {
    if s.len() <= room {
        return s.len();
    }
    let mut n = room;
    while n > 0 && !s.is_char_boundary(n) {
        n -= 1;
    }
    n
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::fmt::Write;

    #[test]
    fn stack_fmt_truncates_on_char_boundary() {
        let mut s = StackFmt::<5>::new();
        let _ = write!(s, "ab°cd");
        // '°' is two bytes: "ab°c" is 5 bytes
        assert_eq!(s.as_str(), "ab°c");
        assert!(s.overflowed());

        let mut t = StackFmt::<3>::new();
        let _ = write!(t, "ab°");
        assert_eq!(t.as_str(), "ab");
    }

    #[test]
    fn borrowed_fmt_reports_length() {
        let mut buf = [0u8; 16];
        let n = stack_fmt(&mut buf, |w| {
            let _ = write!(w, "{:02}:{:02}", 7, 5);
        });
        assert_eq!(&buf[..n], b"07:05");
    }
}
