//! SCGI request framing and reply splitting.
//!
//! A request is a netstring of NUL-separated header pairs followed by the raw body. Replies
//! may carry a CGI-style header block that is stripped before the body is decoded.

use crate::error::CodecError;

/// Frame `payload` as an SCGI request.
#[must_use]
pub fn frame_request(payload: &[u8]) -> Vec<u8> {
    let headers = format!(
        "CONTENT_LENGTH\0{}\0SCGI\01\0REQUEST_METHOD\0POST\0",
        payload.len()
    );
    let prefix = format!("{}:", headers.len());
    let mut frame = Vec::with_capacity(prefix.len() + headers.len() + 1 + payload.len());
    frame.extend_from_slice(prefix.as_bytes());
    frame.extend_from_slice(headers.as_bytes());
    frame.push(b',');
    frame.extend_from_slice(payload);
    frame
}

/// Strip the optional CGI header block from a raw reply.
pub(crate) fn split_reply(reply: &[u8]) -> Result<&[u8], CodecError> {
    let body_start = reply
        .iter()
        .position(|byte| !byte.is_ascii_whitespace())
        .ok_or(CodecError::EmptyReply)?;
    let trimmed = &reply[body_start..];
    if trimmed.starts_with(b"<") {
        return Ok(trimmed);
    }
    find_subsequence(trimmed, b"\r\n\r\n")
        .map(|end| &trimmed[end + 4..])
        .or_else(|| find_subsequence(trimmed, b"\n\n").map(|end| &trimmed[end + 2..]))
        .ok_or(CodecError::UnterminatedHeader)
}

fn find_subsequence(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_is_a_netstring_followed_by_the_body() {
        let frame = frame_request(b"<xml/>");
        let expected = b"44:CONTENT_LENGTH\x006\x00SCGI\x001\x00REQUEST_METHOD\x00POST\x00,<xml/>";
        assert_eq!(frame, expected.to_vec());
    }

    #[test]
    fn header_block_is_stripped() -> anyhow::Result<()> {
        let reply = b"Status: 200 OK\r\nContent-Type: text/xml\r\nContent-Length: 5\r\n\r\n<a/>\n";
        assert_eq!(split_reply(reply)?, b"<a/>\n");
        assert_eq!(split_reply(b"<?xml?><a/>")?, b"<?xml?><a/>");
        Ok(())
    }

    #[test]
    fn empty_or_unterminated_replies_fail() {
        assert!(matches!(split_reply(b""), Err(CodecError::EmptyReply)));
        assert!(matches!(
            split_reply(b"Status: 200 OK\r\nContent-Type: text/xml"),
            Err(CodecError::UnterminatedHeader)
        ));
    }
}
