//! `Transfer-Encoding: chunked` body decoding.
//!
//! Used by the request parser for inbound bodies and by the upstream client
//! for backend responses. Works on a buffer that may hold only part of the
//! body: `Ok(None)` means more bytes are needed.

#[derive(Debug, PartialEq, Eq)]
pub enum ChunkedError {
    InvalidSize,
    MissingDelimiter,
}

/// Decodes a chunked body at the start of `buf`.
///
/// Returns the de-chunked body and the number of bytes consumed, including
/// the terminating zero-size chunk and any trailer section.
pub fn decode_chunked(buf: &[u8]) -> Result<Option<(Vec<u8>, usize)>, ChunkedError> {
    let mut body = Vec::new();
    let mut pos = 0;

    loop {
        let Some(line_end) = find_crlf(&buf[pos..]) else {
            return Ok(None);
        };
        let size = parse_chunk_size(&buf[pos..pos + line_end])?;
        pos += line_end + 2;

        if size == 0 {
            // Trailer fields, terminated by an empty line.
            loop {
                let Some(line_end) = find_crlf(&buf[pos..]) else {
                    return Ok(None);
                };
                pos += line_end + 2;
                if line_end == 0 {
                    return Ok(Some((body, pos)));
                }
            }
        }

        let data_end = pos.checked_add(size).ok_or(ChunkedError::InvalidSize)?;
        let chunk_end = data_end.checked_add(2).ok_or(ChunkedError::InvalidSize)?;
        if buf.len() < chunk_end {
            return Ok(None);
        }
        body.extend_from_slice(&buf[pos..data_end]);

        if &buf[data_end..chunk_end] != b"\r\n" {
            return Err(ChunkedError::MissingDelimiter);
        }
        pos = chunk_end;
    }
}

fn parse_chunk_size(line: &[u8]) -> Result<usize, ChunkedError> {
    let line = std::str::from_utf8(line).map_err(|_| ChunkedError::InvalidSize)?;
    // chunk extensions follow a ';' and are ignored
    let size = line.split(';').next().unwrap_or("").trim();
    usize::from_str_radix(size, 16).map_err(|_| ChunkedError::InvalidSize)
}

fn find_crlf(buf: &[u8]) -> Option<usize> {
    buf.windows(2).position(|w| w == b"\r\n")
}
