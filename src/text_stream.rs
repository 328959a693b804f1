//! Decoding of streamed response bytes into text fragments.
//!
//! The streaming endpoint returns an unframed byte stream: no delimiters,
//! no structured envelope, no end-of-message marker beyond stream closure.
//! This module converts that byte stream into a lazy, finite,
//! non-restartable stream of decoded text fragments, in arrival order. A
//! UTF-8 sequence split across chunk boundaries is carried until the bytes
//! that complete it arrive.

use std::pin::Pin;

use bytes::Bytes;
use futures::stream::{self, Stream, StreamExt};

use crate::error::{Error, Result};

/// A pinned, boxed stream of decoded reply fragments.
pub type TextStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// Converts a stream of raw bytes into a stream of decoded text fragments.
///
/// Fragments are yielded in arrival order with no batching or reordering.
/// Bytes that end mid-code-point are held back and prepended to the next
/// chunk; bytes that are invalid UTF-8 outright (and an incomplete sequence
/// still pending when the stream closes) yield an encoding error.
pub fn decode_text<S>(byte_stream: S) -> impl Stream<Item = Result<String>>
where
    S: Stream<Item = Result<Bytes>> + Unpin + 'static,
{
    let carry: Vec<u8> = Vec::new();

    stream::unfold(
        (byte_stream, carry),
        move |(mut stream, mut carry)| async move {
            loop {
                match stream.next().await {
                    Some(Ok(bytes)) => {
                        carry.extend_from_slice(&bytes);
                        match take_decoded_prefix(&mut carry) {
                            Ok(Some(text)) => return Some((Ok(text), (stream, carry))),
                            Ok(None) => continue,
                            Err(e) => return Some((Err(e), (stream, carry))),
                        }
                    }
                    Some(Err(e)) => {
                        return Some((Err(e), (stream, carry)));
                    }
                    None => {
                        // End of stream; anything still carried is a code
                        // point whose completing bytes never arrived.
                        if carry.is_empty() {
                            return None;
                        }
                        let tail = std::mem::take(&mut carry);
                        let result = String::from_utf8(tail).map_err(|e| {
                            Error::encoding(
                                format!("incomplete UTF-8 sequence at end of stream: {e}"),
                                Some(Box::new(e)),
                            )
                        });
                        return Some((result, (stream, carry)));
                    }
                }
            }
        },
    )
}

/// Splits the longest valid UTF-8 prefix out of the carry buffer.
///
/// Returns `Ok(None)` when the buffer holds only the start of a code point
/// (or nothing), leaving those bytes in place for the next chunk.
fn take_decoded_prefix(carry: &mut Vec<u8>) -> Result<Option<String>> {
    let valid_up_to = match std::str::from_utf8(carry) {
        Ok(_) => carry.len(),
        Err(e) if e.error_len().is_none() => e.valid_up_to(),
        Err(e) => {
            return Err(Error::encoding(
                format!("invalid UTF-8 in stream: {e}"),
                Some(Box::new(e)),
            ));
        }
    };

    if valid_up_to == 0 {
        return Ok(None);
    }

    let rest = carry.split_off(valid_up_to);
    let decoded = String::from_utf8(std::mem::replace(carry, rest))
        .map_err(|e| Error::encoding(format!("invalid UTF-8 in stream: {e}"), Some(Box::new(e))))?;
    Ok(Some(decoded))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunks(parts: &[&'static [u8]]) -> impl Stream<Item = Result<Bytes>> + Unpin {
        let items: Vec<Result<Bytes>> = parts
            .iter()
            .map(|part| Ok(Bytes::from_static(part)))
            .collect();
        stream::iter(items)
    }

    async fn collect_fragments(
        stream: impl Stream<Item = Result<String>>,
    ) -> Vec<Result<String>> {
        Box::pin(stream).collect().await
    }

    #[tokio::test]
    async fn single_chunk_single_fragment() {
        let fragments = collect_fragments(decode_text(chunks(&[b"Hello"]))).await;
        assert_eq!(fragments.len(), 1);
        assert_eq!(fragments[0].as_deref().unwrap(), "Hello");
    }

    #[tokio::test]
    async fn fragments_preserve_chunk_boundaries() {
        let fragments = collect_fragments(decode_text(chunks(&[b"He", b"llo"]))).await;
        let texts: Vec<String> = fragments.into_iter().map(|f| f.unwrap()).collect();
        assert_eq!(texts, vec!["He".to_string(), "llo".to_string()]);
    }

    #[tokio::test]
    async fn code_point_split_across_chunks() {
        // "é" is [0xC3, 0xA9]; the first byte alone must not decode.
        let fragments =
            collect_fragments(decode_text(chunks(&[b"caf", b"\xc3", b"\xa9!"]))).await;
        let texts: Vec<String> = fragments.into_iter().map(|f| f.unwrap()).collect();
        assert_eq!(texts, vec!["caf".to_string(), "\u{e9}!".to_string()]);
        assert_eq!(texts.concat(), "café!");
    }

    #[tokio::test]
    async fn concatenation_is_granularity_independent() {
        let coarse = collect_fragments(decode_text(chunks(&[b"He", b"llo"]))).await;
        let fine =
            collect_fragments(decode_text(chunks(&[b"H", b"e", b"l", b"l", b"o"]))).await;

        let coarse: String = coarse.into_iter().map(|f| f.unwrap()).collect();
        let fine: String = fine.into_iter().map(|f| f.unwrap()).collect();
        assert_eq!(coarse, fine);
        assert_eq!(coarse, "Hello");
    }

    #[tokio::test]
    async fn invalid_utf8_is_an_encoding_error() {
        let fragments = collect_fragments(decode_text(chunks(&[b"ok", b"\xff\xffnope"]))).await;
        assert_eq!(fragments[0].as_deref().unwrap(), "ok");
        assert!(matches!(fragments[1], Err(Error::Encoding { .. })));
    }

    #[tokio::test]
    async fn truncated_tail_is_an_encoding_error() {
        let fragments = collect_fragments(decode_text(chunks(&[b"ok", b"\xc3"]))).await;
        assert_eq!(fragments[0].as_deref().unwrap(), "ok");
        assert!(matches!(fragments[1], Err(Error::Encoding { .. })));
    }

    #[tokio::test]
    async fn empty_stream_yields_nothing() {
        let fragments = collect_fragments(decode_text(chunks(&[]))).await;
        assert!(fragments.is_empty());
    }

    #[tokio::test]
    async fn empty_chunks_yield_no_fragments() {
        let fragments = collect_fragments(decode_text(chunks(&[b"", b"hi", b""]))).await;
        let texts: Vec<String> = fragments.into_iter().map(|f| f.unwrap()).collect();
        assert_eq!(texts, vec!["hi".to_string()]);
    }

    #[tokio::test]
    async fn upstream_errors_pass_through() {
        let items: Vec<Result<Bytes>> = vec![
            Ok(Bytes::from_static(b"partial")),
            Err(Error::streaming("connection reset", None)),
        ];
        let fragments = collect_fragments(decode_text(stream::iter(items))).await;
        assert_eq!(fragments[0].as_deref().unwrap(), "partial");
        assert!(matches!(fragments[1], Err(Error::Streaming { .. })));
    }
}
