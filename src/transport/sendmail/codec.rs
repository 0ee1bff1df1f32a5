//! Line ending normalization and dot-stuffing for sendmail input

/// The codec used to prepare a message for a sendmail binary
///
/// Every CRLF is turned into a LF. When dot-stuffing is enabled, every line
/// starting with a `.` gets a second one, the start of the stream counting as
/// the start of a line. The codec keeps its state between frames, so a message
/// can be split anywhere.
///
/// ```
/// use mailhog_sendmail::SendmailCodec;
///
/// let mut codec = SendmailCodec::new(true);
/// let mut buf = Vec::new();
/// codec.encode(b"A\r", &mut buf);
/// codec.encode(b"\n.\r\n", &mut buf);
/// codec.finish(&mut buf);
/// assert_eq!(buf, b"A\n..\n");
/// ```
#[derive(Clone, Copy, Debug)]
pub struct SendmailCodec {
    stuff_dots: bool,
    /// A CR was seen at the end of the previous frame and not written yet
    pending_cr: bool,
    line_start: bool,
}

impl SendmailCodec {
    /// Creates a new codec, dot-stuffing lines if `stuff_dots` is set
    pub fn new(stuff_dots: bool) -> Self {
        SendmailCodec {
            stuff_dots,
            pending_cr: false,
            line_start: true,
        }
    }

    /// Returns whether lines starting with a `.` are escaped
    pub fn stuffs_dots(&self) -> bool {
        self.stuff_dots
    }

    /// Appends the encoded `frame` to `buf`
    pub fn encode(&mut self, frame: &[u8], buf: &mut Vec<u8>) {
        buf.reserve(frame.len());

        let mut start = 0;
        for (idx, byte) in frame.iter().enumerate() {
            match *byte {
                b'\r' => {
                    buf.extend_from_slice(&frame[start..idx]);
                    if self.pending_cr {
                        self.push_cr(buf);
                    }
                    self.pending_cr = true;
                    start = idx + 1;
                }
                b'\n' => {
                    buf.extend_from_slice(&frame[start..idx]);
                    // a pending CR is dropped here, it was the first half of a CRLF
                    self.pending_cr = false;
                    buf.push(b'\n');
                    self.line_start = true;
                    start = idx + 1;
                }
                byte => {
                    if self.pending_cr {
                        buf.extend_from_slice(&frame[start..idx]);
                        self.push_cr(buf);
                        self.pending_cr = false;
                        start = idx;
                    }
                    if self.line_start {
                        self.line_start = false;
                        if self.stuff_dots && byte == b'.' {
                            buf.extend_from_slice(&frame[start..idx]);
                            buf.push(b'.');
                            start = idx;
                        }
                    }
                }
            }
        }
        buf.extend_from_slice(&frame[start..]);
    }

    /// Writes what is still held back at the end of the message
    ///
    /// The codec is ready for a new message afterwards.
    pub fn finish(&mut self, buf: &mut Vec<u8>) {
        if self.pending_cr {
            buf.push(b'\r');
        }
        self.pending_cr = false;
        self.line_start = true;
    }

    fn push_cr(&mut self, buf: &mut Vec<u8>) {
        buf.push(b'\r');
        self.line_start = false;
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::SendmailCodec;

    fn encode_all(stuff_dots: bool, frames: &[&[u8]]) -> Vec<u8> {
        let mut codec = SendmailCodec::new(stuff_dots);
        let mut buf = Vec::new();
        for frame in frames {
            codec.encode(frame, &mut buf);
        }
        codec.finish(&mut buf);
        buf
    }

    #[test]
    fn test_codec() {
        let mut codec = SendmailCodec::new(true);
        let mut buf: Vec<u8> = vec![];

        codec.encode(b"test\r\n", &mut buf);
        codec.encode(b".\r\n", &mut buf);
        codec.encode(b"\r\ntest", &mut buf);
        codec.encode(b"te\r\n.\r\nst", &mut buf);
        codec.encode(b"test", &mut buf);
        codec.encode(b"test.", &mut buf);
        codec.encode(b"test\n", &mut buf);
        codec.encode(b".test\n", &mut buf);
        codec.encode(b"test", &mut buf);
        codec.encode(b"test", &mut buf);
        codec.encode(b"test\r\n", &mut buf);
        codec.encode(b".", &mut buf);
        codec.encode(b"\r\ntest", &mut buf);
        codec.finish(&mut buf);

        assert_eq!(
            String::from_utf8(buf).unwrap(),
            "test\n..\n\ntestte\n..\nsttesttest.test\n..test\ntesttesttest\n..\ntest"
        );
    }

    #[test]
    fn plain_message_is_untouched_except_crlf() {
        let message = b"From: a@b.c\r\nSubject: hi\r\n\r\nHello\r\nWorld. Bye\r\n";
        assert_eq!(
            encode_all(true, &[message]),
            b"From: a@b.c\nSubject: hi\n\nHello\nWorld. Bye\n".to_vec()
        );
        assert_eq!(
            encode_all(false, &[message]),
            b"From: a@b.c\nSubject: hi\n\nHello\nWorld. Bye\n".to_vec()
        );
    }

    #[test]
    fn lone_dot_line() {
        assert_eq!(encode_all(true, &[b"a\n.\nb"]), b"a\n..\nb".to_vec());
        assert_eq!(encode_all(false, &[b"a\n.\nb"]), b"a\n.\nb".to_vec());
    }

    #[test]
    fn dot_after_chunk_boundary() {
        assert_eq!(encode_all(true, &[b"A\r\n", b".\n"]), b"A\n..\n".to_vec());
    }

    #[test]
    fn crlf_split_across_chunks() {
        assert_eq!(encode_all(true, &[b"A\r", b"\n.B"]), b"A\n..B".to_vec());
        assert_eq!(encode_all(false, &[b"A\r", b"", b"\nB"]), b"A\nB".to_vec());
    }

    #[test]
    fn leading_dot_at_stream_start() {
        assert_eq!(encode_all(true, &[b".hidden\r\n"]), b"..hidden\n".to_vec());
        assert_eq!(encode_all(false, &[b".hidden\r\n"]), b".hidden\n".to_vec());
    }

    #[test]
    fn lone_cr_is_preserved() {
        assert_eq!(encode_all(true, &[b"a\rb\r"]), b"a\rb\r".to_vec());
        assert_eq!(encode_all(true, &[b"a\r\r\nb"]), b"a\r\nb".to_vec());
        // a CR-terminated line is not a line start for stuffing purposes
        assert_eq!(encode_all(true, &[b"a\r.b"]), b"a\r.b".to_vec());
    }

    #[test]
    fn finish_resets_state() {
        let mut codec = SendmailCodec::new(true);
        let mut buf = Vec::new();
        codec.encode(b"x\r", &mut buf);
        codec.finish(&mut buf);
        codec.encode(b".y", &mut buf);
        codec.finish(&mut buf);
        assert_eq!(buf, b"x\r..y".to_vec());
    }
}
